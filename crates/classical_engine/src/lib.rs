//! Classical chess engine: iterative-deepening alpha-beta search over a
//! pluggable evaluator, with a shared transposition table and the usual
//! ordering heuristics. The default evaluator is material + structure.

pub mod eval;
pub mod ordering;
pub mod search;
pub mod tt;

use chess_core::{Engine, Evaluate, Position, SearchLimits, SearchResult};

pub use eval::{EvalParams, MaterialEval, piece_value};
pub use search::{INF, MATE, MAX_PLY, SearchOptions, Searcher};
pub use tt::TranspositionTable;

const DEFAULT_HASH_MB: usize = 16;

/// Alpha-beta engine with a swappable `Evaluate` backend.
///
/// The transposition table persists across searches (aged per search); the
/// ordering tables live inside each `think` call.
pub struct ClassicalEngine {
    tt: TranspositionTable,
    evaluator: Box<dyn Evaluate>,
    options: SearchOptions,
}

impl ClassicalEngine {
    pub fn new() -> Self {
        Self::with_evaluator(Box::new(MaterialEval::new()))
    }

    pub fn with_evaluator(evaluator: Box<dyn Evaluate>) -> Self {
        Self {
            tt: TranspositionTable::with_megabytes(DEFAULT_HASH_MB),
            evaluator,
            options: SearchOptions::default(),
        }
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn set_options(&mut self, options: SearchOptions) {
        self.options = options;
    }
}

impl Default for ClassicalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for ClassicalEngine {
    fn search(&mut self, pos: &Position, limits: SearchLimits) -> SearchResult {
        let mut searcher = Searcher::new(&*self.evaluator, &mut self.tt, self.options);
        searcher.think(pos, &limits)
    }

    fn name(&self) -> &str {
        "Tempo Classical"
    }

    fn new_game(&mut self) {
        self.tt.clear();
    }

    fn set_option(&mut self, name: &str, value: &str) -> bool {
        let on = value.eq_ignore_ascii_case("true");
        match name.to_lowercase().as_str() {
            "hash" => {
                if let Ok(mb) = value.parse::<usize>() {
                    self.tt.resize(mb.max(1) * 1024 * 1024);
                    return true;
                }
                false
            }
            "usenullmove" => {
                self.options.null_move = on;
                true
            }
            "uselmr" => {
                self.options.lmr = on;
                true
            }
            "usefutility" => {
                self.options.futility = on;
                true
            }
            "useaspiration" => {
                self.options.aspiration = on;
                true
            }
            "useiid" => {
                self.options.iid = on;
                true
            }
            "usequiescence" => {
                self.options.quiescence = on;
                true
            }
            _ => false,
        }
    }
}

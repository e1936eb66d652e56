pub mod config;
pub mod game;
pub mod source;
pub mod storage;
pub mod utils;

#[cfg(target_arch = "wasm32")]
pub mod bindings;
#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use config::{BoardSize, ConfigError, GameConfig};
pub use game::{
    BoardPhase, CardKind, Feedback, FlipOutcome, InputModality, IntegrityError, MemoryBoard,
    MemoryCard, MemoryEngine, MemoryError, MemoryEvent, MemoryOutcome, MemorySnapshot,
    PendingEvaluation, Presentation, QuestionRecord, QuestionSet, QuizEngine, QuizError, QuizPhase,
    QuizVariation,
};
pub use source::{AttemptError, LoadError, QuestionSource, Transport, TransportError};
pub use storage::{
    KeyValueStore, MemoryStore, PlayerMode, PlayerSession, PlayerSlot, Preferences, ScoreCounter,
    ScoreStore, ScoreSummary, StorageError,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

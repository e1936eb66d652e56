//! 游戏核心逻辑（题库、答题引擎、记忆配对引擎）。

pub mod memory;
pub mod quiz;
pub mod rules;
pub mod state;

pub use memory::{
    BoardPhase,
    CardKind,
    FlipOutcome,
    MemoryBoard,
    MemoryCard,
    MemoryEngine,
    MemoryError,
    MemoryEvent,
    MemoryOutcome,
    MemorySnapshot,
    PendingEvaluation,
    MEMORY_MODE,
};
pub use quiz::{Feedback, Presentation, QuizEngine, QuizPhase};
pub use rules::{build_option_set, InputModality, InputRejection, OptionSet, QuizError};
pub use state::{IntegrityError, QuestionRecord, QuestionSet, QuizVariation};

use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{QuestionSet, QuizVariation};
use crate::storage::StorageError;

/// 答题方式：自由输入或从选项中选择。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum InputModality {
    FreeText,
    MultipleChoice,
}

impl InputModality {
    /// 分数存储使用的模式名。
    pub fn quiz_mode(self) -> &'static str {
        match self {
            InputModality::FreeText => "fillblank",
            InputModality::MultipleChoice => "mcq",
        }
    }
}

impl FromStr for InputModality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fillblank" | "fill-blank" | "free-text" | "text" => Ok(InputModality::FreeText),
            "mcq" | "multiple-choice" | "choice" => Ok(InputModality::MultipleChoice),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum InputRejection {
    Empty,
    UnknownOption { value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum QuizError {
    #[error("no question is being presented")]
    NotReady,
    #[error("the current question has already been answered")]
    AnswerLocked,
    #[error("input ignored: {reason:?}")]
    InvalidInput { reason: InputRejection },
    #[error("cannot build {requested} options, only {available} distinct answers exist")]
    InsufficientDistractorPool { requested: usize, available: usize },
    #[error("question set is empty")]
    EmptyQuestionSet,
    #[error(transparent)]
    Storage {
        #[from]
        error: StorageError,
    },
}

/// 一道选择题的选项。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionSet {
    pub options: Vec<String>,
    pub requested: usize,
}

impl OptionSet {
    pub fn is_reduced(&self) -> bool {
        self.options.len() < self.requested
    }
}

/// 生成选择题选项：正确答案加上随机抽取的不重复干扰项。
///
/// 随机抽取最多尝试 `max_draws` 次，之后从剩余的干扰项中顺序补齐；
/// 不同答案不足时返回缩减后的选项集，完全没有干扰项时报错。
pub fn build_option_set<R: Rng + ?Sized>(
    rng: &mut R,
    questions: &QuestionSet,
    variation: QuizVariation,
    correct: &str,
    option_count: usize,
    max_draws: u32,
) -> Result<OptionSet, QuizError> {
    let mut pool: Vec<&str> = Vec::new();
    for record in questions.records() {
        let value = variation.answer(record);
        if value != correct && !pool.contains(&value) {
            pool.push(value);
        }
    }
    if pool.is_empty() {
        return Err(QuizError::InsufficientDistractorPool {
            requested: option_count,
            available: 1,
        });
    }

    let wanted = option_count.saturating_sub(1).min(pool.len());
    let mut options = vec![correct.to_string()];
    let mut draws = 0;
    while options.len() <= wanted && draws < max_draws {
        draws += 1;
        let Some(record) = questions.records().choose(rng) else {
            break;
        };
        let candidate = variation.answer(record);
        if candidate != correct && !options.iter().any(|option| option == candidate) {
            options.push(candidate.to_string());
        }
    }

    if options.len() <= wanted {
        let mut remaining: Vec<&str> = pool
            .into_iter()
            .filter(|value| !options.iter().any(|option| option == value))
            .collect();
        remaining.shuffle(rng);
        let missing = wanted + 1 - options.len();
        options.extend(remaining.into_iter().take(missing).map(str::to_string));
    }

    options.shuffle(rng);
    Ok(OptionSet {
        options,
        requested: option_count,
    })
}

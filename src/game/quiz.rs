use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::rules::{build_option_set, InputModality, InputRejection, QuizError};
use super::state::{QuestionRecord, QuestionSet, QuizVariation};
use crate::config::GameConfig;
use crate::storage::{
    KeyValueStore, PlayerMode, PlayerSession, PlayerSlot, ScoreCounter, ScoreStore, ScoreSummary,
    StorageError,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase")]
pub enum QuizPhase {
    Loading,
    Presenting,
    Answered { is_correct: bool },
}

/// 交给界面渲染的当前题目。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Presentation {
    pub prompt: String,
    pub variation: QuizVariation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerSlot>,
}

/// 提交答案后的反馈。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feedback {
    pub is_correct: bool,
    pub submitted: String,
    pub correct_answer: String,
    pub score: ScoreCounter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_player: Option<PlayerSlot>,
    /// 答案已判定并锁定，但轮次没能写入存储。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<StorageError>,
}

impl Feedback {
    pub fn message(&self) -> String {
        if self.is_correct {
            "Correct!".to_string()
        } else {
            format!("Incorrect. The correct answer is {}.", self.correct_answer)
        }
    }
}

/// 填空题与选择题共用的答题引擎。
pub struct QuizEngine<S> {
    config: GameConfig,
    modality: InputModality,
    variation: QuizVariation,
    questions: QuestionSet,
    cursor: usize,
    current: Option<QuestionRecord>,
    options: Vec<String>,
    phase: QuizPhase,
    hint_visible: bool,
    scores: ScoreStore<S>,
    session: PlayerSession<S>,
    rng: SmallRng,
}

impl<S: KeyValueStore> QuizEngine<S> {
    pub fn new(modality: InputModality, store: S, config: GameConfig) -> Result<Self, QuizError> {
        Self::build(modality, store, config, SmallRng::from_entropy())
    }

    pub fn with_seed(
        modality: InputModality,
        store: S,
        config: GameConfig,
        seed: u64,
    ) -> Result<Self, QuizError> {
        Self::build(modality, store, config, SmallRng::seed_from_u64(seed))
    }

    fn build(
        modality: InputModality,
        store: S,
        config: GameConfig,
        rng: SmallRng,
    ) -> Result<Self, QuizError> {
        let scores = ScoreStore::new(store.clone());
        let session = PlayerSession::new(store);
        let mode = session.mode();
        scores.initialize(modality.quiz_mode(), mode)?;
        if mode == PlayerMode::Two {
            session.reset_turn()?;
        }

        Ok(Self {
            config,
            modality,
            variation: QuizVariation::default(),
            questions: QuestionSet::default(),
            cursor: 0,
            current: None,
            options: Vec::new(),
            phase: QuizPhase::Loading,
            hint_visible: false,
            scores,
            session,
            rng,
        })
    }

    pub fn quiz_mode(&self) -> &'static str {
        self.modality.quiz_mode()
    }

    pub fn modality(&self) -> InputModality {
        self.modality
    }

    pub fn variation(&self) -> QuizVariation {
        self.variation
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn session(&self) -> &PlayerSession<S> {
        &self.session
    }

    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.current.as_ref()
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    /// 载入题库，洗牌后呈现第一题。
    pub fn start(&mut self, questions: QuestionSet) -> Result<Presentation, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuestionSet);
        }
        self.questions = questions;
        self.restart_round()
    }

    /// 切换出题方向：重新洗牌并从头开始，分数保持不变。
    pub fn set_variation(
        &mut self,
        variation: QuizVariation,
    ) -> Result<Option<Presentation>, QuizError> {
        self.variation = variation;
        if self.questions.is_empty() {
            return Ok(None);
        }
        self.restart_round().map(Some)
    }

    fn restart_round(&mut self) -> Result<Presentation, QuizError> {
        self.questions.shuffle(&mut self.rng);
        self.cursor = 0;
        self.present_next()
    }

    /// 前进到下一题。题库用尽后重新洗牌，此时可能紧接着出现上一轮的最后一题。
    pub fn present_next(&mut self) -> Result<Presentation, QuizError> {
        if self.questions.is_empty() {
            return Err(QuizError::NotReady);
        }
        if self.cursor >= self.questions.len() {
            self.questions.shuffle(&mut self.rng);
            self.cursor = 0;
        }
        let record = self
            .questions
            .get(self.cursor)
            .cloned()
            .ok_or(QuizError::NotReady)?;

        let options = match self.modality {
            InputModality::FreeText => Vec::new(),
            InputModality::MultipleChoice => {
                let set = build_option_set(
                    &mut self.rng,
                    &self.questions,
                    self.variation,
                    self.variation.answer(&record),
                    self.config.option_count,
                    self.config.max_distractor_draws,
                )?;
                if set.is_reduced() {
                    crate::console_warn!(
                        "only {} of {} options available for {}",
                        set.options.len(),
                        set.requested,
                        self.variation.answer(&record)
                    );
                }
                set.options
            }
        };

        self.cursor += 1;
        let presentation = Presentation {
            prompt: self.variation.prompt(&record),
            variation: self.variation,
            options: options.clone(),
            player: self.session.scoring_slot(),
        };
        self.current = Some(record);
        self.options = options;
        self.phase = QuizPhase::Presenting;
        self.hint_visible = false;
        Ok(presentation)
    }

    /// 判定答案并计分。空输入和重复提交都不会计入答题次数。
    pub fn submit_answer(&mut self, input: &str) -> Result<Feedback, QuizError> {
        match self.phase {
            QuizPhase::Loading => return Err(QuizError::NotReady),
            QuizPhase::Answered { .. } => return Err(QuizError::AnswerLocked),
            QuizPhase::Presenting => {}
        }
        let record = self.current.as_ref().ok_or(QuizError::NotReady)?;
        let correct = self.variation.answer(record).to_string();

        let is_correct = match self.modality {
            InputModality::FreeText => {
                let typed = input.trim();
                if typed.is_empty() {
                    return Err(QuizError::InvalidInput {
                        reason: InputRejection::Empty,
                    });
                }
                self.variation.accepts_typed(typed, &correct)
            }
            InputModality::MultipleChoice => {
                if input.is_empty() {
                    return Err(QuizError::InvalidInput {
                        reason: InputRejection::Empty,
                    });
                }
                if !self.options.iter().any(|option| option == input) {
                    return Err(QuizError::InvalidInput {
                        reason: InputRejection::UnknownOption {
                            value: input.to_string(),
                        },
                    });
                }
                input == correct
            }
        };

        let player = self.session.scoring_slot();
        let score = self
            .scores
            .record_answer(self.modality.quiz_mode(), player, is_correct)?;
        self.phase = QuizPhase::Answered { is_correct };

        let mut storage_error = None;
        let next_player = match player {
            Some(_) => match self.session.switch_player() {
                Ok(next) => Some(next),
                Err(error) => {
                    crate::console_error!("failed to switch player: {error}");
                    storage_error = Some(error);
                    None
                }
            },
            None => None,
        };

        Ok(Feedback {
            is_correct,
            submitted: input.trim().to_string(),
            correct_answer: correct,
            score,
            player,
            next_player,
            storage_error,
        })
    }

    pub fn show_hint(&mut self) -> Result<&str, QuizError> {
        let record = self.current.as_ref().ok_or(QuizError::NotReady)?;
        self.hint_visible = true;
        Ok(&record.hint)
    }

    pub fn score_summary(&self) -> ScoreSummary {
        self.scores.summary(
            self.modality.quiz_mode(),
            self.session.mode(),
            self.session.current_player(),
        )
    }

    pub fn reset_scores(&mut self) -> Result<ScoreSummary, QuizError> {
        let mode = self.session.mode();
        self.scores.reset(self.modality.quiz_mode(), mode)?;
        if mode == PlayerMode::Two {
            self.session.reset_turn()?;
        }
        Ok(self.score_summary())
    }
}

use std::cmp::Ordering;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::QuestionSet;
use crate::config::GameConfig;
use crate::storage::{
    KeyValueStore, PlayerMode, PlayerSession, PlayerSlot, ScoreStore, ScoreSummary, StorageError,
};

/// 记忆游戏在分数存储中的模式名。
pub const MEMORY_MODE: &str = "memory";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Port,
    Protocol,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryCard {
    pub id: String,
    pub pair_id: String,
    pub face_value: String,
    pub kind: CardKind,
    #[serde(default)]
    pub is_flipped: bool,
    #[serde(default)]
    pub is_matched: bool,
}

impl MemoryCard {
    pub fn is_face_up(&self) -> bool {
        self.is_flipped || self.is_matched
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BoardPhase {
    Idle,
    AwaitingSecondFlip,
    Evaluating,
    Complete,
}

/// 延迟比对的凭据。棋盘重建或比对完成后凭据失效。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingEvaluation {
    pub generation: u64,
    pub ticket: u64,
    pub cards: [String; 2],
    pub delay_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum MemoryOutcome {
    Cleared { pairs: usize },
    Winner {
        player: PlayerSlot,
        player_one: u32,
        player_two: u32,
    },
    Tie { pairs_each: u32 },
}

impl MemoryOutcome {
    pub fn message(&self) -> String {
        match self {
            MemoryOutcome::Cleared { .. } => "Congratulations! You found all pairs!".to_string(),
            MemoryOutcome::Winner { player, .. } => format!("Game over! Player {player} wins!"),
            MemoryOutcome::Tie { .. } => "Game over! It's a tie!".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MemoryEvent {
    BoardReset {
        generation: u64,
        total_pairs: usize,
    },
    CardFlipped {
        card_id: String,
    },
    EvaluationScheduled {
        ticket: u64,
        delay_ms: u32,
    },
    PairMatched {
        first: String,
        second: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        player: Option<PlayerSlot>,
        matched_pairs: usize,
    },
    PairMismatched {
        first: String,
        second: String,
    },
    PlayerSwitched {
        player: PlayerSlot,
    },
    GameCompleted {
        outcome: MemoryOutcome,
        delay_ms: u32,
    },
    /// 棋盘已经更新，但分数或轮次没能写入存储。
    ScoreNotSaved {
        error: StorageError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum MemoryError {
    #[error("no board has been set up")]
    NotReady,
    #[error("question set is empty")]
    EmptyQuestionSet,
    #[error("card {card_id} does not exist")]
    CardNotFound { card_id: String },
    #[error("card {card_id} is already face up")]
    CardAlreadyFlipped { card_id: String },
    #[error("card {card_id} is already matched")]
    CardAlreadyMatched { card_id: String },
    #[error("a pair is being evaluated")]
    EvaluationPending,
    #[error("evaluation ticket {ticket} is stale")]
    StaleEvaluation { ticket: u64 },
    #[error("all pairs have been found")]
    GameFinished,
    #[error(transparent)]
    Storage {
        #[from]
        error: StorageError,
    },
}

/// 一局记忆游戏的牌面与翻牌状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MemoryBoard {
    cards: Vec<MemoryCard>,
    flipped: Vec<usize>,
    matched_pairs: usize,
    total_pairs: usize,
    generation: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending_ticket: Option<u64>,
    next_ticket: u64,
}

impl MemoryBoard {
    /// 洗牌题库，取前 `pair_count` 条生成成对的端口牌与协议牌，再打乱牌序。
    pub fn build<R: Rng + ?Sized>(
        questions: &mut QuestionSet,
        pair_count: usize,
        rng: &mut R,
        generation: u64,
    ) -> Result<Self, MemoryError> {
        if questions.is_empty() {
            return Err(MemoryError::EmptyQuestionSet);
        }
        questions.shuffle(rng);

        let total_pairs = pair_count.min(questions.len());
        let mut cards = Vec::with_capacity(total_pairs * 2);
        for (index, record) in questions.records().iter().take(total_pairs).enumerate() {
            let port_id = format!("{index}_port");
            let protocol_id = format!("{index}_protocol");
            cards.push(MemoryCard {
                id: port_id.clone(),
                pair_id: protocol_id.clone(),
                face_value: record.port.clone(),
                kind: CardKind::Port,
                is_flipped: false,
                is_matched: false,
            });
            cards.push(MemoryCard {
                id: protocol_id,
                pair_id: port_id,
                face_value: record.protocol.clone(),
                kind: CardKind::Protocol,
                is_flipped: false,
                is_matched: false,
            });
        }
        cards.shuffle(rng);

        Ok(Self {
            cards,
            flipped: Vec::new(),
            matched_pairs: 0,
            total_pairs,
            generation,
            pending_ticket: None,
            next_ticket: 0,
        })
    }

    pub fn cards(&self) -> &[MemoryCard] {
        &self.cards
    }

    pub fn card(&self, card_id: &str) -> Option<&MemoryCard> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    fn position(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|card| card.id == card_id)
    }

    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    pub fn total_pairs(&self) -> usize {
        self.total_pairs
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn flipped_ids(&self) -> Vec<&str> {
        self.flipped
            .iter()
            .filter_map(|index| self.cards.get(*index))
            .map(|card| card.id.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.total_pairs > 0 && self.matched_pairs == self.total_pairs
    }

    pub fn phase(&self) -> BoardPhase {
        if self.is_complete() {
            BoardPhase::Complete
        } else if self.pending_ticket.is_some() {
            BoardPhase::Evaluating
        } else if self.flipped.len() == 1 {
            BoardPhase::AwaitingSecondFlip
        } else {
            BoardPhase::Idle
        }
    }
}

/// 交给界面渲染的完整状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub phase: BoardPhase,
    pub cards: Vec<MemoryCard>,
    pub matched_pairs: usize,
    pub total_pairs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<PlayerSlot>,
    pub scores: ScoreSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<MemoryOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipOutcome {
    pub events: Vec<MemoryEvent>,
    pub pending: Option<PendingEvaluation>,
}

pub struct MemoryEngine<S> {
    config: GameConfig,
    questions: QuestionSet,
    board: MemoryBoard,
    outcome: Option<MemoryOutcome>,
    scores: ScoreStore<S>,
    session: PlayerSession<S>,
    rng: SmallRng,
}

impl<S: KeyValueStore> MemoryEngine<S> {
    pub fn new(store: S, config: GameConfig) -> Result<Self, MemoryError> {
        Self::build(store, config, SmallRng::from_entropy())
    }

    pub fn with_seed(store: S, config: GameConfig, seed: u64) -> Result<Self, MemoryError> {
        Self::build(store, config, SmallRng::seed_from_u64(seed))
    }

    fn build(store: S, config: GameConfig, rng: SmallRng) -> Result<Self, MemoryError> {
        let scores = ScoreStore::new(store.clone());
        let session = PlayerSession::new(store);
        let mode = session.mode();
        scores.initialize(MEMORY_MODE, mode)?;
        if mode == PlayerMode::Two {
            session.reset_turn()?;
        }
        Ok(Self {
            config,
            questions: QuestionSet::default(),
            board: MemoryBoard::default(),
            outcome: None,
            scores,
            session,
            rng,
        })
    }

    pub fn board(&self) -> &MemoryBoard {
        &self.board
    }

    pub fn outcome(&self) -> Option<&MemoryOutcome> {
        self.outcome.as_ref()
    }

    pub fn session(&self) -> &PlayerSession<S> {
        &self.session
    }

    /// 载入题库并摆好第一局。
    pub fn setup(&mut self, questions: QuestionSet) -> Result<Vec<MemoryEvent>, MemoryError> {
        if questions.is_empty() {
            return Err(MemoryError::EmptyQuestionSet);
        }
        self.questions = questions;
        self.rebuild()
    }

    fn rebuild(&mut self) -> Result<Vec<MemoryEvent>, MemoryError> {
        let generation = self.board.generation + 1;
        self.board = MemoryBoard::build(
            &mut self.questions,
            self.config.pair_count,
            &mut self.rng,
            generation,
        )?;
        self.outcome = None;
        Ok(vec![MemoryEvent::BoardReset {
            generation,
            total_pairs: self.board.total_pairs,
        }])
    }

    /// 清零本模式分数，轮次回到玩家 1，并重新洗牌摆牌。
    /// 之前签发的比对凭据全部失效。
    pub fn restart(&mut self) -> Result<Vec<MemoryEvent>, MemoryError> {
        if self.questions.is_empty() {
            return Err(MemoryError::NotReady);
        }
        self.scores.reset(MEMORY_MODE, self.session.mode())?;
        self.session.reset_turn()?;
        self.rebuild()
    }

    pub fn flip(&mut self, card_id: &str) -> Result<FlipOutcome, MemoryError> {
        if self.board.cards.is_empty() {
            return Err(MemoryError::NotReady);
        }
        if self.board.is_complete() {
            return Err(MemoryError::GameFinished);
        }
        if self.board.pending_ticket.is_some() {
            return Err(MemoryError::EvaluationPending);
        }
        let index = self
            .board
            .position(card_id)
            .ok_or_else(|| MemoryError::CardNotFound {
                card_id: card_id.to_string(),
            })?;

        let card = &mut self.board.cards[index];
        if card.is_matched {
            return Err(MemoryError::CardAlreadyMatched {
                card_id: card_id.to_string(),
            });
        }
        if card.is_flipped {
            return Err(MemoryError::CardAlreadyFlipped {
                card_id: card_id.to_string(),
            });
        }
        card.is_flipped = true;
        self.board.flipped.push(index);

        let mut events = vec![MemoryEvent::CardFlipped {
            card_id: card_id.to_string(),
        }];
        if self.board.flipped.len() < 2 {
            return Ok(FlipOutcome {
                events,
                pending: None,
            });
        }

        let ticket = self.board.next_ticket;
        self.board.next_ticket += 1;
        self.board.pending_ticket = Some(ticket);
        let first = self.board.cards[self.board.flipped[0]].id.clone();
        let second = self.board.cards[self.board.flipped[1]].id.clone();
        let delay_ms = self.config.reveal_delay_ms;
        events.push(MemoryEvent::EvaluationScheduled { ticket, delay_ms });

        Ok(FlipOutcome {
            events,
            pending: Some(PendingEvaluation {
                generation: self.board.generation,
                ticket,
                cards: [first, second],
                delay_ms,
            }),
        })
    }

    /// 延迟到期后比对两张翻开的牌。过期凭据不会改动棋盘，
    /// 存储写入失败时棋盘照常推进。
    pub fn evaluate(&mut self, pending: &PendingEvaluation) -> Result<Vec<MemoryEvent>, MemoryError> {
        if pending.generation != self.board.generation
            || self.board.pending_ticket != Some(pending.ticket)
        {
            crate::console_log!(
                "ignoring stale evaluation {} from board {}",
                pending.ticket,
                pending.generation
            );
            return Err(MemoryError::StaleEvaluation {
                ticket: pending.ticket,
            });
        }
        let (first, second) = match self.board.flipped.as_slice() {
            [first, second] => (*first, *second),
            _ => {
                return Err(MemoryError::StaleEvaluation {
                    ticket: pending.ticket,
                })
            }
        };

        let first_id = self.board.cards[first].id.clone();
        let second_id = self.board.cards[second].id.clone();
        if pending.cards != [first_id.clone(), second_id.clone()] {
            return Err(MemoryError::StaleEvaluation {
                ticket: pending.ticket,
            });
        }

        let is_match = self.board.cards[first].pair_id == second_id;
        for index in [first, second] {
            let card = &mut self.board.cards[index];
            card.is_flipped = false;
            card.is_matched = is_match;
        }
        self.board.flipped.clear();
        self.board.pending_ticket = None;

        // 棋盘先转换；写入失败以 ScoreNotSaved 事件上报
        let player = self.session.scoring_slot();
        let mut events = Vec::new();
        let mut unsaved = self
            .scores
            .record_answer(MEMORY_MODE, player, is_match)
            .err();

        if is_match {
            self.board.matched_pairs += 1;
            events.push(MemoryEvent::PairMatched {
                first: first_id,
                second: second_id,
                player,
                matched_pairs: self.board.matched_pairs,
            });
            if self.board.is_complete() {
                let outcome = self.completion_outcome();
                self.outcome = Some(outcome.clone());
                events.push(MemoryEvent::GameCompleted {
                    outcome,
                    delay_ms: self.config.completion_delay_ms,
                });
            }
        } else {
            events.push(MemoryEvent::PairMismatched {
                first: first_id,
                second: second_id,
            });
            if player.is_some() {
                match self.session.switch_player() {
                    Ok(next) => events.push(MemoryEvent::PlayerSwitched { player: next }),
                    Err(error) => {
                        crate::console_error!("failed to switch player: {error}");
                        unsaved.get_or_insert(error);
                    }
                }
            }
        }

        if let Some(error) = unsaved {
            events.push(MemoryEvent::ScoreNotSaved { error });
        }
        Ok(events)
    }

    fn completion_outcome(&self) -> MemoryOutcome {
        match self.session.mode() {
            PlayerMode::Single => MemoryOutcome::Cleared {
                pairs: self.board.total_pairs,
            },
            PlayerMode::Two => {
                let player_one = self.scores.read(MEMORY_MODE, Some(PlayerSlot::One)).correct;
                let player_two = self.scores.read(MEMORY_MODE, Some(PlayerSlot::Two)).correct;
                match player_one.cmp(&player_two) {
                    Ordering::Greater => MemoryOutcome::Winner {
                        player: PlayerSlot::One,
                        player_one,
                        player_two,
                    },
                    Ordering::Less => MemoryOutcome::Winner {
                        player: PlayerSlot::Two,
                        player_one,
                        player_two,
                    },
                    Ordering::Equal => MemoryOutcome::Tie {
                        pairs_each: player_one,
                    },
                }
            }
        }
    }

    pub fn score_summary(&self) -> ScoreSummary {
        self.scores.summary(
            MEMORY_MODE,
            self.session.mode(),
            self.session.current_player(),
        )
    }

    /// 只清零分数，不重开棋盘。
    pub fn reset_scores(&mut self) -> Result<ScoreSummary, MemoryError> {
        self.scores.reset(MEMORY_MODE, self.session.mode())?;
        Ok(self.score_summary())
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            phase: self.board.phase(),
            cards: self.board.cards.clone(),
            matched_pairs: self.board.matched_pairs,
            total_pairs: self.board.total_pairs,
            current_player: self.session.scoring_slot(),
            scores: self.score_summary(),
            outcome: self.outcome.clone(),
        }
    }
}

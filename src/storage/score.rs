use serde::{Deserialize, Serialize};

use super::{read_count, write_count, KeyValueStore, PlayerMode, PlayerSlot, StorageError};

/// 某个模式、某个玩家的答题计数。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScoreCounter {
    pub correct: u32,
    pub attempted: u32,
}

impl ScoreCounter {
    pub fn record(self, is_correct: bool) -> Self {
        Self {
            correct: if is_correct {
                self.correct.saturating_add(1)
            } else {
                self.correct
            },
            attempted: self.attempted.saturating_add(1),
        }
    }
}

/// 供界面展示的分数汇总。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ScoreSummary {
    Single {
        score: ScoreCounter,
    },
    Two {
        player_one: ScoreCounter,
        player_two: ScoreCounter,
        current_player: PlayerSlot,
    },
}

pub fn score_key(quiz_mode: &str, slot: Option<PlayerSlot>) -> String {
    counter_key(quiz_mode, "score", slot)
}

pub fn total_key(quiz_mode: &str, slot: Option<PlayerSlot>) -> String {
    counter_key(quiz_mode, "total", slot)
}

fn counter_key(quiz_mode: &str, field: &str, slot: Option<PlayerSlot>) -> String {
    match slot {
        Some(player) => format!("{quiz_mode}_{field}_p{player}"),
        None => format!("{quiz_mode}_{field}"),
    }
}

/// 按 `(quiz_mode, slot)` 维护的持久化计数。
///
/// `record_answer` 是一次同步的读-改-写，在单个页面内天然串行；
/// 多个标签页同时写同一计数仍可能丢失更新。
#[derive(Debug, Clone)]
pub struct ScoreStore<S> {
    store: S,
}

impl<S: KeyValueStore> ScoreStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 为模式涉及的每个槽位补齐为 0 的计数，已有值保持不变。
    pub fn initialize(&self, quiz_mode: &str, mode: PlayerMode) -> Result<(), StorageError> {
        for slot in mode.slots() {
            for key in [score_key(quiz_mode, *slot), total_key(quiz_mode, *slot)] {
                if !self.store.contains(&key) {
                    write_count(&self.store, &key, 0)?;
                }
            }
        }
        Ok(())
    }

    pub fn read(&self, quiz_mode: &str, slot: Option<PlayerSlot>) -> ScoreCounter {
        let correct = read_count(&self.store, &score_key(quiz_mode, slot));
        let attempted = read_count(&self.store, &total_key(quiz_mode, slot));
        // 旧数据可能只写过 score，保持 attempted >= correct
        ScoreCounter {
            correct,
            attempted: attempted.max(correct),
        }
    }

    pub fn record_answer(
        &self,
        quiz_mode: &str,
        slot: Option<PlayerSlot>,
        is_correct: bool,
    ) -> Result<ScoreCounter, StorageError> {
        let updated = self.read(quiz_mode, slot).record(is_correct);
        write_count(&self.store, &total_key(quiz_mode, slot), updated.attempted)?;
        if is_correct {
            write_count(&self.store, &score_key(quiz_mode, slot), updated.correct)?;
        }
        Ok(updated)
    }

    pub fn reset(&self, quiz_mode: &str, mode: PlayerMode) -> Result<(), StorageError> {
        for slot in mode.slots() {
            write_count(&self.store, &score_key(quiz_mode, *slot), 0)?;
            write_count(&self.store, &total_key(quiz_mode, *slot), 0)?;
        }
        Ok(())
    }

    pub fn summary(&self, quiz_mode: &str, mode: PlayerMode, current: PlayerSlot) -> ScoreSummary {
        match mode {
            PlayerMode::Single => ScoreSummary::Single {
                score: self.read(quiz_mode, None),
            },
            PlayerMode::Two => ScoreSummary::Two {
                player_one: self.read(quiz_mode, Some(PlayerSlot::One)),
                player_two: self.read(quiz_mode, Some(PlayerSlot::Two)),
                current_player: current,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, PlayerSession};
    use pretty_assertions::assert_eq;

    #[test]
    fn keys_follow_storage_layout() {
        assert_eq!(score_key("mcq", None), "mcq_score");
        assert_eq!(total_key("mcq", None), "mcq_total");
        assert_eq!(score_key("memory", Some(PlayerSlot::Two)), "memory_score_p2");
        assert_eq!(total_key("fillblank", Some(PlayerSlot::One)), "fillblank_total_p1");
    }

    #[test]
    fn record_answer_counts_every_call() {
        let scores = ScoreStore::new(MemoryStore::new());
        let outcomes = [true, false, true, true, false, false, true];
        for outcome in outcomes {
            scores
                .record_answer("fillblank", None, outcome)
                .expect("record should succeed");
        }

        let counter = scores.read("fillblank", None);
        assert_eq!(counter.attempted, outcomes.len() as u32);
        assert_eq!(
            counter.correct,
            outcomes.iter().filter(|correct| **correct).count() as u32
        );
        assert_eq!(scores.read("mcq", None), ScoreCounter::default());
    }

    #[test]
    fn slots_are_counted_independently() {
        let scores = ScoreStore::new(MemoryStore::new());
        scores
            .record_answer("mcq", Some(PlayerSlot::One), true)
            .expect("record p1");
        scores
            .record_answer("mcq", Some(PlayerSlot::Two), false)
            .expect("record p2");

        assert_eq!(
            scores.read("mcq", Some(PlayerSlot::One)),
            ScoreCounter { correct: 1, attempted: 1 }
        );
        assert_eq!(
            scores.read("mcq", Some(PlayerSlot::Two)),
            ScoreCounter { correct: 0, attempted: 1 }
        );
        assert_eq!(scores.read("mcq", None), ScoreCounter::default());
    }

    #[test]
    fn initialize_keeps_existing_values() {
        let store = MemoryStore::with_entries([("mcq_score", "3"), ("mcq_total", "5")]);
        let scores = ScoreStore::new(store.clone());
        scores
            .initialize("mcq", PlayerMode::Two)
            .expect("initialize should succeed");
        scores
            .initialize("mcq", PlayerMode::Single)
            .expect("initialize should succeed");

        assert_eq!(scores.read("mcq", None), ScoreCounter { correct: 3, attempted: 5 });
        let snapshot = store.snapshot();
        for key in ["mcq_score_p1", "mcq_score_p2", "mcq_total_p1", "mcq_total_p2"] {
            assert_eq!(snapshot.get(key).map(String::as_str), Some("0"), "{key}");
        }
    }

    #[test]
    fn reset_zeroes_regardless_of_prior_state() {
        let store = MemoryStore::with_entries([("memory_score_p1", "4"), ("memory_total_p2", "12")]);
        let scores = ScoreStore::new(store);
        scores.reset("memory", PlayerMode::Two).expect("reset");

        for slot in PlayerMode::Two.slots() {
            assert_eq!(scores.read("memory", *slot), ScoreCounter::default());
        }
    }

    #[test]
    fn score_without_total_keeps_invariant() {
        let scores = ScoreStore::new(MemoryStore::with_entries([("memory_score", "6")]));
        let counter = scores.read("memory", None);
        assert!(counter.attempted >= counter.correct);
        assert_eq!(counter, ScoreCounter { correct: 6, attempted: 6 });
    }

    #[test]
    fn switching_player_mode_leaves_scores_untouched() {
        let store = MemoryStore::new();
        let scores = ScoreStore::new(store.clone());
        let session = PlayerSession::new(store.clone());
        scores.record_answer("mcq", None, true).expect("record");
        scores
            .record_answer("mcq", Some(PlayerSlot::Two), false)
            .expect("record");
        let before = store.snapshot();

        session.set_mode(PlayerMode::Two).expect("two");
        session.set_mode(PlayerMode::Single).expect("single");

        let after = store.snapshot();
        for (key, value) in before.iter().filter(|(key, _)| key.starts_with("mcq_")) {
            assert_eq!(after.get(key), Some(value));
        }
    }

    #[test]
    fn summary_reflects_mode_shape() {
        let scores = ScoreStore::new(MemoryStore::new());
        scores
            .record_answer("mcq", Some(PlayerSlot::Two), true)
            .expect("record");

        let summary = scores.summary("mcq", PlayerMode::Two, PlayerSlot::One);
        assert_eq!(
            summary,
            ScoreSummary::Two {
                player_one: ScoreCounter::default(),
                player_two: ScoreCounter { correct: 1, attempted: 1 },
                current_player: PlayerSlot::One,
            }
        );
        assert!(matches!(
            scores.summary("mcq", PlayerMode::Single, PlayerSlot::One),
            ScoreSummary::Single { .. }
        ));
    }
}

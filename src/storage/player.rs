use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{KeyValueStore, StorageError};

pub const PLAYER_MODE_KEY: &str = "playerMode";
pub const CURRENT_PLAYER_KEY: &str = "currentPlayer";

/// 单人 / 双人模式。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerMode {
    #[default]
    Single,
    Two,
}

impl PlayerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerMode::Single => "single",
            PlayerMode::Two => "two",
        }
    }

    /// 该模式下需要维护计数的玩家槽位；单人模式没有槽位后缀。
    pub fn slots(self) -> &'static [Option<PlayerSlot>] {
        match self {
            PlayerMode::Single => &[None],
            PlayerMode::Two => &[Some(PlayerSlot::One), Some(PlayerSlot::Two)],
        }
    }
}

impl FromStr for PlayerMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "1" => Ok(PlayerMode::Single),
            "two" | "2" => Ok(PlayerMode::Two),
            _ => Err(()),
        }
    }
}

/// 双人模式下的玩家槽位。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PlayerSlot {
    #[default]
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
}

impl PlayerSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerSlot::One => "1",
            PlayerSlot::Two => "2",
        }
    }

    pub fn other(self) -> Self {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerSlot {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(PlayerSlot::One),
            "2" => Ok(PlayerSlot::Two),
            _ => Err(()),
        }
    }
}

/// 玩家会话：当前模式以及双人模式下轮到谁。
#[derive(Debug, Clone)]
pub struct PlayerSession<S> {
    store: S,
}

impl<S: KeyValueStore> PlayerSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn mode(&self) -> PlayerMode {
        self.store
            .get(PLAYER_MODE_KEY)
            .and_then(|value| PlayerMode::from_str(&value).ok())
            .unwrap_or_default()
    }

    /// 仅修改模式，不会清空分数或重开游戏。
    pub fn set_mode(&self, mode: PlayerMode) -> Result<(), StorageError> {
        self.store.set(PLAYER_MODE_KEY, mode.as_str())
    }

    pub fn current_player(&self) -> PlayerSlot {
        self.store
            .get(CURRENT_PLAYER_KEY)
            .and_then(|value| PlayerSlot::from_str(&value).ok())
            .unwrap_or_default()
    }

    pub fn set_current_player(&self, player: PlayerSlot) -> Result<(), StorageError> {
        self.store.set(CURRENT_PLAYER_KEY, player.as_str())
    }

    /// 切换到另一位玩家并返回新玩家。调用方需自行确认处于双人模式。
    pub fn switch_player(&self) -> Result<PlayerSlot, StorageError> {
        let next = self.current_player().other();
        self.set_current_player(next)?;
        Ok(next)
    }

    pub fn reset_turn(&self) -> Result<(), StorageError> {
        self.set_current_player(PlayerSlot::One)
    }

    /// 计分归属：单人模式为 `None`，双人模式为当前玩家。
    pub fn scoring_slot(&self) -> Option<PlayerSlot> {
        match self.mode() {
            PlayerMode::Single => None,
            PlayerMode::Two => Some(self.current_player()),
        }
    }
}

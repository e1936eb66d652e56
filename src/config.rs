use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "/api/questions";
pub const DEFAULT_OPTION_COUNT: usize = 4;
pub const DEFAULT_PAIR_COUNT: usize = 8;
pub const DEFAULT_REVEAL_DELAY_MS: u32 = 1000;
pub const DEFAULT_COMPLETION_DELAY_MS: u32 = 500;
pub const DEFAULT_MAX_DISTRACTOR_DRAWS: u32 = 256;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum ConfigError {
    #[error("malformed config: {message}")]
    Malformed { message: String },
    #[error("option_count must be at least 2, got {value}")]
    TooFewOptions { value: usize },
    #[error("pair_count must be at least 1")]
    NoPairs,
    #[error("max_distractor_draws must be at least 1")]
    NoDistractorDraws,
}

/// 记忆游戏的棋盘规模预设。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoardSize {
    Small,
    Standard,
    Large,
}

impl BoardSize {
    pub fn pair_count(self) -> usize {
        match self {
            BoardSize::Small => 6,
            BoardSize::Standard => DEFAULT_PAIR_COUNT,
            BoardSize::Large => 12,
        }
    }
}

impl FromStr for BoardSize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" | "easy" => Ok(BoardSize::Small),
            "standard" | "normal" | "medium" => Ok(BoardSize::Standard),
            "large" | "hard" => Ok(BoardSize::Large),
            _ => Err(()),
        }
    }
}

/// 游戏运行参数，前端可通过 JSON 覆盖任意字段。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub endpoint: String,
    pub option_count: usize,
    pub pair_count: usize,
    pub reveal_delay_ms: u32,
    pub completion_delay_ms: u32,
    /// 抽取干扰项的随机尝试上限，超过后改为顺序补齐。
    pub max_distractor_draws: u32,
}

impl GameConfig {
    pub fn from_json(json: Option<&str>) -> Result<Self, ConfigError> {
        let config: GameConfig = match json {
            Some(raw) if !raw.trim().is_empty() => {
                serde_json::from_str(raw).map_err(|error| ConfigError::Malformed {
                    message: error.to_string(),
                })?
            }
            _ => GameConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_board_size(mut self, size: BoardSize) -> Self {
        self.pair_count = size.pair_count();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.option_count < 2 {
            return Err(ConfigError::TooFewOptions {
                value: self.option_count,
            });
        }
        if self.pair_count == 0 {
            return Err(ConfigError::NoPairs);
        }
        if self.max_distractor_draws == 0 {
            return Err(ConfigError::NoDistractorDraws);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            option_count: DEFAULT_OPTION_COUNT,
            pair_count: DEFAULT_PAIR_COUNT,
            reveal_delay_ms: DEFAULT_REVEAL_DELAY_MS,
            completion_delay_ms: DEFAULT_COMPLETION_DELAY_MS,
            max_distractor_draws: DEFAULT_MAX_DISTRACTOR_DRAWS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_json_uses_defaults() {
        let config = GameConfig::from_json(None).expect("default config should be valid");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.option_count, 4);
        assert_eq!(config.pair_count, 8);
        assert_eq!(config.reveal_delay_ms, 1000);
    }

    #[test]
    fn partial_json_overrides_only_given_fields() {
        let config = GameConfig::from_json(Some(r#"{"pair_count": 6, "endpoint": "/q.json"}"#))
            .expect("partial config should parse");
        assert_eq!(config.pair_count, 6);
        assert_eq!(config.endpoint, "/q.json");
        assert_eq!(config.option_count, DEFAULT_OPTION_COUNT);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let error = GameConfig::from_json(Some(r#"{"option_count": 1}"#))
            .expect_err("single option quiz should be rejected");
        assert_eq!(error, ConfigError::TooFewOptions { value: 1 });

        let error = GameConfig::from_json(Some(r#"{"pair_count": 0}"#))
            .expect_err("empty board should be rejected");
        assert_eq!(error, ConfigError::NoPairs);

        assert!(matches!(
            GameConfig::from_json(Some("{not json")),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn board_size_presets() {
        assert_eq!(BoardSize::from_str("HARD"), Ok(BoardSize::Large));
        assert_eq!(BoardSize::from_str("medium"), Ok(BoardSize::Standard));
        assert!(BoardSize::from_str("huge").is_err());

        let config = GameConfig::default().with_board_size(BoardSize::Small);
        assert_eq!(config.pair_count, 6);
    }
}

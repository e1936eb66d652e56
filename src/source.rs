//! 题库加载：主通道失败后只重试一次备用通道。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{QuestionRecord, QuestionSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum TransportError {
    #[error("request failed: {message}")]
    Network { message: String },
    #[error("server responded with status {status}")]
    Status { status: u16 },
}

/// 单次加载尝试失败的原因。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum AttemptError {
    #[error(transparent)]
    Transport {
        #[from]
        error: TransportError,
    },
    #[error("malformed question data: {message}")]
    Malformed { message: String },
    #[error("no usable questions in response")]
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum LoadError {
    #[error("failed to load questions (primary: {primary}; fallback: {fallback})")]
    DataLoadFailure {
        primary: AttemptError,
        fallback: AttemptError,
    },
}

impl LoadError {
    pub fn user_message(&self) -> &'static str {
        "Error loading questions. Please try again later."
    }
}

/// 取回端点上的原始文本。浏览器里分别由 `fetch` 与 `XMLHttpRequest` 实现。
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn fetch_text(&self, url: &str) -> Result<String, TransportError>;
}

pub struct QuestionSource<P, F> {
    endpoint: String,
    primary: P,
    fallback: F,
}

impl<P: Transport, F: Transport> QuestionSource<P, F> {
    pub fn new(endpoint: impl Into<String>, primary: P, fallback: F) -> Self {
        Self {
            endpoint: endpoint.into(),
            primary,
            fallback,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 先走主通道，失败（含数据无法解析或为空）后走一次备用通道。
    pub async fn load(&self) -> Result<QuestionSet, LoadError> {
        let primary = match self.attempt(&self.primary).await {
            Ok(questions) => return Ok(questions),
            Err(error) => error,
        };
        crate::console_warn!("error fetching questions: {primary}; trying fallback");

        match self.attempt(&self.fallback).await {
            Ok(questions) => Ok(questions),
            Err(fallback) => {
                crate::console_error!("error loading questions: {fallback}");
                Err(LoadError::DataLoadFailure { primary, fallback })
            }
        }
    }

    async fn attempt<T: Transport>(&self, transport: &T) -> Result<QuestionSet, AttemptError> {
        let body = transport.fetch_text(&self.endpoint).await?;
        parse_questions(&body)
    }
}

/// 解析端点返回的 JSON 数组，并剔除空字段与重复记录。
pub fn parse_questions(body: &str) -> Result<QuestionSet, AttemptError> {
    let records: Vec<QuestionRecord> =
        serde_json::from_str(body).map_err(|error| AttemptError::Malformed {
            message: error.to_string(),
        })?;
    let (questions, dropped) = QuestionSet::sanitized(records);
    if dropped > 0 {
        crate::console_warn!("dropped {dropped} blank or duplicate question records");
    }
    if questions.is_empty() {
        return Err(AttemptError::Empty);
    }
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    const PAYLOAD: &str = r#"[
        {"port": "80", "protocol": "HTTP", "hint": "web"},
        {"port": "443", "protocol": "HTTPS", "hint": "secure web"}
    ]"#;

    #[derive(Clone)]
    struct StubTransport {
        response: Result<String, TransportError>,
        calls: Rc<Cell<usize>>,
        urls: Rc<RefCell<Vec<String>>>,
    }

    impl StubTransport {
        fn ok(body: &str) -> Self {
            Self::with(Ok(body.to_string()))
        }

        fn failing(error: TransportError) -> Self {
            Self::with(Err(error))
        }

        fn with(response: Result<String, TransportError>) -> Self {
            Self {
                response,
                calls: Rc::new(Cell::new(0)),
                urls: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl Transport for StubTransport {
        async fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
            self.calls.set(self.calls.get() + 1);
            self.urls.borrow_mut().push(url.to_string());
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let primary = StubTransport::ok(PAYLOAD);
        let fallback = StubTransport::ok("[]");
        let source = QuestionSource::new("/api/questions", primary.clone(), fallback.clone());

        let questions = source.load().await.expect("primary should load");
        assert_eq!(questions.len(), 2);
        assert_eq!(primary.calls.get(), 1);
        assert_eq!(fallback.calls.get(), 0);
        assert_eq!(*primary.urls.borrow(), vec!["/api/questions".to_string()]);
    }

    #[tokio::test]
    async fn network_failure_uses_fallback_once() {
        let primary = StubTransport::failing(TransportError::Status { status: 503 });
        let fallback = StubTransport::ok(PAYLOAD);
        let source = QuestionSource::new("/api/questions", primary.clone(), fallback.clone());

        let questions = source.load().await.expect("fallback should load");
        assert_eq!(questions.get(0).map(|record| record.port.as_str()), Some("80"));
        assert_eq!(primary.calls.get(), 1);
        assert_eq!(fallback.calls.get(), 1);
    }

    #[tokio::test]
    async fn malformed_primary_payload_falls_back() {
        let primary = StubTransport::ok("<html>not json</html>");
        let fallback = StubTransport::ok(PAYLOAD);
        let source = QuestionSource::new("/api/questions", primary, fallback.clone());

        assert!(source.load().await.is_ok());
        assert_eq!(fallback.calls.get(), 1);
    }

    #[tokio::test]
    async fn both_failures_report_each_attempt() {
        let source = QuestionSource::new(
            "/api/questions",
            StubTransport::failing(TransportError::Network {
                message: "offline".into(),
            }),
            StubTransport::ok("[]"),
        );

        let error = source.load().await.expect_err("both attempts fail");
        assert_eq!(
            error,
            LoadError::DataLoadFailure {
                primary: AttemptError::Transport {
                    error: TransportError::Network {
                        message: "offline".into()
                    }
                },
                fallback: AttemptError::Empty,
            }
        );
        assert_eq!(
            error.user_message(),
            "Error loading questions. Please try again later."
        );
    }

    #[test]
    fn parse_drops_duplicates() {
        let body = r#"[
            {"port": "80", "protocol": "HTTP", "hint": "web"},
            {"port": "80", "protocol": "WWW", "hint": "dup"},
            {"port": "", "protocol": "NONE", "hint": "blank"}
        ]"#;
        let questions = parse_questions(body).expect("one record survives");
        assert_eq!(questions.len(), 1);
        assert!(matches!(
            parse_questions(r#"{"port": "80"}"#),
            Err(AttemptError::Malformed { .. })
        ));
    }
}

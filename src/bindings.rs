//! 导出给前端的 wasm 接口。所有结构化数据都以 `serde_wasm_bindgen` 值传递。

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;
use std::str::FromStr;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::js_sys::{Function, Promise};

use crate::config::{BoardSize, GameConfig};
use crate::game::{
    Feedback, InputModality, MemoryEngine, MemoryError, MemoryEvent, MemorySnapshot,
    PendingEvaluation, QuestionSet, QuizEngine, QuizVariation,
};
use crate::source::QuestionSource;
use crate::storage::{PlayerMode, PlayerSession, Preferences};
use crate::web::{FetchTransport, LocalStorageStore, XhrTransport};

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(JsValue::from)
}

fn parse_config(config_json: Option<String>) -> Result<GameConfig, JsValue> {
    GameConfig::from_json(config_json.as_deref()).map_err(to_js_error)
}

fn open_store() -> Result<LocalStorageStore, JsValue> {
    LocalStorageStore::open().map_err(to_js_error)
}

fn question_source(endpoint: &str) -> QuestionSource<FetchTransport, XhrTransport> {
    QuestionSource::new(endpoint, FetchTransport, XhrTransport)
}

#[derive(Serialize)]
struct FeedbackView {
    #[serde(flatten)]
    feedback: Feedback,
    message: String,
}

/// 填空题 / 选择题。
#[wasm_bindgen]
pub struct QuizGame {
    engine: Rc<RefCell<QuizEngine<LocalStorageStore>>>,
    endpoint: String,
}

#[wasm_bindgen]
impl QuizGame {
    /// `modality` 取 `fillblank` 或 `mcq`。
    #[wasm_bindgen(constructor)]
    pub fn new(modality: &str, config_json: Option<String>) -> Result<QuizGame, JsValue> {
        let modality = InputModality::from_str(modality)
            .map_err(|_| JsValue::from_str(&format!("unknown quiz modality `{modality}`")))?;
        let config = parse_config(config_json)?;
        let endpoint = config.endpoint.clone();
        let engine = QuizEngine::new(modality, open_store()?, config).map_err(to_js_error)?;
        Ok(QuizGame {
            engine: Rc::new(RefCell::new(engine)),
            endpoint,
        })
    }

    /// 加载题库并返回第一题。
    pub fn load(&self) -> Promise {
        let engine = Rc::clone(&self.engine);
        let source = question_source(&self.endpoint);
        future_to_promise(async move {
            let questions = source.load().await.map_err(to_js_error)?;
            let presentation = engine.borrow_mut().start(questions).map_err(to_js_error)?;
            to_js(&presentation)
        })
    }

    pub fn next(&self) -> Result<JsValue, JsValue> {
        let presentation = self
            .engine
            .borrow_mut()
            .present_next()
            .map_err(to_js_error)?;
        to_js(&presentation)
    }

    pub fn submit(&self, input: &str) -> Result<JsValue, JsValue> {
        let feedback = self
            .engine
            .borrow_mut()
            .submit_answer(input)
            .map_err(to_js_error)?;
        let message = feedback.message();
        to_js(&FeedbackView { feedback, message })
    }

    #[wasm_bindgen(js_name = "setVariation")]
    pub fn set_variation(&self, variation: &str) -> Result<JsValue, JsValue> {
        let variation = QuizVariation::from_str(variation)
            .map_err(|_| JsValue::from_str(&format!("unknown quiz variation `{variation}`")))?;
        let presentation = self
            .engine
            .borrow_mut()
            .set_variation(variation)
            .map_err(to_js_error)?;
        to_js(&presentation)
    }

    pub fn hint(&self) -> Result<String, JsValue> {
        let mut engine = self.engine.borrow_mut();
        let hint = engine.show_hint().map_err(to_js_error)?;
        Ok(hint.to_string())
    }

    pub fn scores(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.borrow().score_summary())
    }

    #[wasm_bindgen(js_name = "resetScores")]
    pub fn reset_scores(&self) -> Result<JsValue, JsValue> {
        let summary = self
            .engine
            .borrow_mut()
            .reset_scores()
            .map_err(to_js_error)?;
        to_js(&summary)
    }
}

#[derive(Serialize)]
struct MemoryUpdate<'a> {
    events: &'a [MemoryEvent],
    board: MemorySnapshot,
}

type SharedMemory = Rc<RefCell<MemoryEngine<LocalStorageStore>>>;
type SharedCallback = Rc<RefCell<Option<Function>>>;

/// 记忆配对游戏。翻牌后的延迟比对在后台完成，并通过 `onChange` 回调通知界面。
#[wasm_bindgen]
pub struct MemoryGame {
    engine: SharedMemory,
    on_change: SharedCallback,
    endpoint: String,
}

fn notify(engine: &SharedMemory, on_change: &SharedCallback, events: &[MemoryEvent]) {
    let update = MemoryUpdate {
        events,
        board: engine.borrow().snapshot(),
    };
    let Some(callback) = on_change.borrow().clone() else {
        return;
    };
    match to_value(&update) {
        Ok(value) => {
            if let Err(error) = callback.call1(&JsValue::NULL, &value) {
                crate::console_error!("memory onChange callback failed: {error:?}");
            }
        }
        Err(error) => crate::console_error!("failed to serialize memory update: {error}"),
    }
}

fn schedule_evaluation(engine: SharedMemory, on_change: SharedCallback, pending: PendingEvaluation) {
    spawn_local(async move {
        TimeoutFuture::new(pending.delay_ms).await;
        let result = engine.borrow_mut().evaluate(&pending);
        match result {
            Ok(events) => notify(&engine, &on_change, &events),
            Err(MemoryError::StaleEvaluation { .. }) => {}
            Err(error) => crate::console_error!("memory evaluation failed: {error}"),
        }
    });
}

#[wasm_bindgen]
impl MemoryGame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<MemoryGame, JsValue> {
        let config = parse_config(config_json)?;
        let endpoint = config.endpoint.clone();
        let engine = MemoryEngine::new(open_store()?, config).map_err(to_js_error)?;
        Ok(MemoryGame {
            engine: Rc::new(RefCell::new(engine)),
            on_change: Rc::new(RefCell::new(None)),
            endpoint,
        })
    }

    /// 按预设棋盘大小（`small` / `standard` / `large`）创建。
    #[wasm_bindgen(js_name = "withBoardSize")]
    pub fn with_board_size(size: &str) -> Result<MemoryGame, JsValue> {
        let size = BoardSize::from_str(size)
            .map_err(|_| JsValue::from_str(&format!("unknown board size `{size}`")))?;
        let config = GameConfig::default().with_board_size(size);
        let engine = MemoryEngine::new(open_store()?, config).map_err(to_js_error)?;
        Ok(MemoryGame {
            engine: Rc::new(RefCell::new(engine)),
            on_change: Rc::new(RefCell::new(None)),
            endpoint: GameConfig::default().endpoint,
        })
    }

    /// 加载题库、摆好棋盘，并登记状态变化回调。
    pub fn load(&self, on_change: Function) -> Promise {
        *self.on_change.borrow_mut() = Some(on_change);
        let engine = Rc::clone(&self.engine);
        let callback = Rc::clone(&self.on_change);
        let source = question_source(&self.endpoint);
        future_to_promise(async move {
            let questions = source.load().await.map_err(to_js_error)?;
            let events = engine.borrow_mut().setup(questions).map_err(to_js_error)?;
            notify(&engine, &callback, &events);
            let snapshot = engine.borrow().snapshot();
            to_js(&snapshot)
        })
    }

    pub fn flip(&self, card_id: &str) -> Result<JsValue, JsValue> {
        let outcome = self
            .engine
            .borrow_mut()
            .flip(card_id)
            .map_err(to_js_error)?;
        if let Some(pending) = outcome.pending {
            schedule_evaluation(Rc::clone(&self.engine), Rc::clone(&self.on_change), pending);
        }
        to_js(&outcome.events)
    }

    pub fn restart(&self) -> Result<JsValue, JsValue> {
        let events = self.engine.borrow_mut().restart().map_err(to_js_error)?;
        notify(&self.engine, &self.on_change, &events);
        to_js(&self.engine.borrow().snapshot())
    }

    pub fn board(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.borrow().snapshot())
    }

    pub fn scores(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.borrow().score_summary())
    }

    #[wasm_bindgen(js_name = "resetScores")]
    pub fn reset_scores(&self) -> Result<JsValue, JsValue> {
        let summary = self
            .engine
            .borrow_mut()
            .reset_scores()
            .map_err(to_js_error)?;
        to_js(&summary)
    }
}

#[wasm_bindgen(js_name = "playerMode")]
pub fn player_mode() -> Result<String, JsValue> {
    Ok(PlayerSession::new(open_store()?).mode().as_str().to_string())
}

/// 只修改模式；已有分数保持不变。
#[wasm_bindgen(js_name = "setPlayerMode")]
pub fn set_player_mode(mode: &str) -> Result<(), JsValue> {
    let mode = PlayerMode::from_str(mode)
        .map_err(|_| JsValue::from_str(&format!("unknown player mode `{mode}`")))?;
    PlayerSession::new(open_store()?)
        .set_mode(mode)
        .map_err(to_js_error)
}

#[wasm_bindgen(js_name = "currentPlayer")]
pub fn current_player() -> Result<String, JsValue> {
    Ok(PlayerSession::new(open_store()?)
        .current_player()
        .as_str()
        .to_string())
}

#[wasm_bindgen(js_name = "darkMode")]
pub fn dark_mode() -> Result<bool, JsValue> {
    Ok(Preferences::new(open_store()?).dark_mode())
}

#[wasm_bindgen(js_name = "setDarkMode")]
pub fn set_dark_mode(enabled: bool) -> Result<(), JsValue> {
    Preferences::new(open_store()?)
        .set_dark_mode(enabled)
        .map_err(to_js_error)
}

/// 返回内置示例题库，方便前端调试。
#[wasm_bindgen(js_name = "sampleQuestions")]
pub fn sample_questions() -> Result<JsValue, JsValue> {
    to_js(&QuestionSet::sample())
}

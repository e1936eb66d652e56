//! 浏览器内测试：`wasm-pack test --headless --chrome`。

#![cfg(target_arch = "wasm32")]

use port_quiz::web::LocalStorageStore;
use port_quiz::{
    GameConfig, InputModality, KeyValueStore, PlayerMode, PlayerSession, QuestionSet, QuizEngine,
    ScoreStore,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn fresh_store() -> LocalStorageStore {
    let store = LocalStorageStore::open().expect("localStorage should be available");
    for key in [
        "playerMode",
        "currentPlayer",
        "fillblank_score",
        "fillblank_total",
    ] {
        store.set(key, "").expect("clear key");
    }
    store
}

#[wasm_bindgen_test]
fn local_storage_round_trip() {
    let store = fresh_store();
    store.set("darkMode", "true").expect("write darkMode");
    assert_eq!(store.get("darkMode").as_deref(), Some("true"));

    let session = PlayerSession::new(store.clone());
    session.set_mode(PlayerMode::Two).expect("set mode");
    let reopened = LocalStorageStore::open().expect("reopen localStorage");
    assert_eq!(PlayerSession::new(reopened).mode(), PlayerMode::Two);
    session.set_mode(PlayerMode::Single).expect("restore mode");
}

#[wasm_bindgen_test]
fn quiz_scores_persist_in_local_storage() {
    let store = fresh_store();
    let mut quiz = QuizEngine::with_seed(
        InputModality::FreeText,
        store.clone(),
        GameConfig::default(),
        9,
    )
    .expect("engine");
    quiz.start(QuestionSet::sample()).expect("start");
    quiz.submit_answer("definitely-wrong").expect("answer");

    let counter = ScoreStore::new(store.clone()).read("fillblank", None);
    assert_eq!(counter.attempted, 1);
    assert_eq!(counter.correct, 0);
    assert_eq!(store.get("fillblank_total").as_deref(), Some("1"));
}

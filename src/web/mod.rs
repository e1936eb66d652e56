//! 浏览器端适配：`localStorage` 存储与两种题库请求方式。

mod storage;
mod transport;

pub use storage::LocalStorageStore;
pub use transport::{FetchTransport, XhrTransport};

use wasm_bindgen::JsValue;

/// 把 JS 抛出的异常转成可读文本。
pub(crate) fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

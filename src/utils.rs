//! 浏览器环境辅助工具（panic hook、控制台日志）。

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Log,
    Warn,
    Error,
}

/// 写入浏览器控制台；非 wasm 目标下不输出。
#[cfg(target_arch = "wasm32")]
pub fn console_write(level: LogLevel, message: &str) {
    let value = wasm_bindgen::JsValue::from_str(message);
    match level {
        LogLevel::Log => web_sys::console::log_1(&value),
        LogLevel::Warn => web_sys::console::warn_1(&value),
        LogLevel::Error => web_sys::console::error_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn console_write(_level: LogLevel, _message: &str) {}

#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {
        if cfg!(target_arch = "wasm32") {
            $crate::utils::console_write($crate::utils::LogLevel::Log, &format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! console_warn {
    ($($arg:tt)*) => {
        if cfg!(target_arch = "wasm32") {
            $crate::utils::console_write($crate::utils::LogLevel::Warn, &format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! console_error {
    ($($arg:tt)*) => {
        if cfg!(target_arch = "wasm32") {
            $crate::utils::console_write($crate::utils::LogLevel::Error, &format!($($arg)*));
        }
    };
}

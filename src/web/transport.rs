use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::{Function, Promise};
use web_sys::{Response, XmlHttpRequest};

use super::js_message;
use crate::source::{Transport, TransportError};

fn network(error: JsValue) -> TransportError {
    TransportError::Network {
        message: js_message(&error),
    }
}

/// 主通道：`window.fetch`。
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    async fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        let window = web_sys::window().ok_or_else(|| TransportError::Network {
            message: "no global window".to_string(),
        })?;
        let response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(network)?;
        let response: Response = response.dyn_into().map_err(network)?;
        if !response.ok() {
            return Err(TransportError::Status {
                status: response.status(),
            });
        }
        let text = JsFuture::from(response.text().map_err(network)?)
            .await
            .map_err(network)?;
        text.as_string().ok_or_else(|| TransportError::Network {
            message: "response body is not text".to_string(),
        })
    }
}

/// 备用通道：`XMLHttpRequest`，只接受 200。
#[derive(Debug, Clone, Copy, Default)]
pub struct XhrTransport;

impl Transport for XhrTransport {
    async fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        let xhr = XmlHttpRequest::new().map_err(network)?;
        xhr.open_with_async("GET", url, true).map_err(network)?;

        let request = xhr.clone();
        let finished = Promise::new(&mut |resolve: Function, _reject: Function| {
            request.set_onloadend(Some(&resolve));
        });
        xhr.send().map_err(network)?;
        JsFuture::from(finished).await.map_err(network)?;
        xhr.set_onloadend(None);

        let status = xhr.status().map_err(network)?;
        if status != 200 {
            return Err(TransportError::Status { status });
        }
        xhr.response_text()
            .map_err(network)?
            .ok_or_else(|| TransportError::Network {
                message: "empty response".to_string(),
            })
    }
}

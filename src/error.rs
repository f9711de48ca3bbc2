use thiserror::Error;
use wasm_bindgen::JsValue;

pub type ViewerResult<T> = Result<T, ViewerError>;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no element with id '{0}'")]
    MissingElement(String),

    #[error("JavaScript error: {0}")]
    Js(String),
}

impl ViewerError {
    pub fn js(value: JsValue) -> Self {
        let text = value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value));
        ViewerError::Js(text)
    }
}

impl From<ViewerError> for JsValue {
    fn from(err: ViewerError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

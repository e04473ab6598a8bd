mod mock;

pub use mock::MockTransport;

use crate::error::{ApiError, ApiResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Post,
    Patch,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FilePart),
}

/// Ordered multipart fields. Repeated names are kept, as browsers do.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartBody {
    pub fields: Vec<(String, FormValue)>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_text(name, value);
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: FilePart) -> Self {
        self.fields.push((name.into(), FormValue::File(file)));
        self
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields
            .push((name.into(), FormValue::Text(value.into())));
    }

    /// Last text value under `name`.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.fields.iter().rev().find_map(|(k, v)| match v {
            FormValue::Text(s) if k == name => Some(s.as_str()),
            _ => None,
        })
    }

    fn into_form(self) -> ApiResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in self.fields {
            form = match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File(file) => {
                    let mut part =
                        reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
                    if let Some(mime) = file.mime.filter(|m| !m.trim().is_empty()) {
                        part = part.mime_str(&mime).map_err(ApiError::parse)?;
                    }
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

impl RequestBody {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Multipart(_) => None,
        }
    }

    pub fn as_multipart(&self) -> Option<&MultipartBody> {
        match self {
            Self::Multipart(m) => Some(m),
            Self::Json(_) => None,
        }
    }
}

/// A fully routed request, relative to the configured base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
}

/// Sends routed requests to the admin backend.
///
/// The browser runs everything on one thread, so implementations are not
/// required to produce `Send` futures.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> ApiResult<serde_json::Value>;
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &crate::config::EnvConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for ApiClient {
    async fn send(&self, request: ApiRequest) -> ApiResult<serde_json::Value> {
        let client = reqwest::Client::new();
        let mut req = client.request(request.method.into(), self.url(&request.path));

        req = match request.body {
            RequestBody::Json(v) => req.json(&v),
            RequestBody::Multipart(m) => req.multipart(m.into_form()?),
        };

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            let text = res.text().await.map_err(ApiError::network)?;
            if text.trim().is_empty() {
                return Ok(serde_json::Value::Null);
            }
            serde_json::from_str(&text).map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }
}

/// Percent-encodes one path segment.
pub(crate) fn segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

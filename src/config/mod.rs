use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://0.0.0.0:8000";

/// Key names the image endpoints use for the entity reference.
///
/// The admin backend has been deployed with both spellings. `Entity` is the
/// canonical one; `Table` matches the create/delete endpoints.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageWireNaming {
    /// `entity_name` / `entity_id`
    #[default]
    Entity,
    /// `table_name` / `id`
    Table,
}

impl ImageWireNaming {
    pub fn table_key(self) -> &'static str {
        match self {
            Self::Entity => "entity_name",
            Self::Table => "table_name",
        }
    }

    pub fn id_key(self) -> &'static str {
        match self {
            Self::Entity => "entity_id",
            Self::Table => "id",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entity" => Some(Self::Entity),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EnvConfig {
    pub api_url: String,
    #[serde(default)]
    pub image_naming: ImageWireNaming,
}

impl EnvConfig {
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            image_naming: ImageWireNaming::default(),
        }
    }

    /// Reads `window.ENV` in the browser; defaults everywhere else.
    pub fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(config) = Self::from_window() {
                return config;
            }
        }

        Self::with_api_url(DEFAULT_API_URL)
    }

    // We support BOTH `window.ENV.API_URL` and `window.ENV.api_url`.
    #[cfg(target_arch = "wasm32")]
    fn from_window() -> Option<Self> {
        let window = web_sys::window()?;
        let env = window.get("ENV")?;
        if env.is_undefined() || !env.is_object() {
            return None;
        }

        let get_s = |k: &str| {
            js_sys::Reflect::get(&env, &k.into())
                .ok()
                .and_then(|v| v.as_string())
        };

        let api_url = get_s("API_URL")
            .or_else(|| get_s("api_url"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mut config = Self::with_api_url(api_url);
        if let Some(naming) = get_s("IMAGE_NAMING").and_then(|s| ImageWireNaming::parse(&s)) {
            config.image_naming = naming;
        }
        Some(config)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

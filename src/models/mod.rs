use serde::{Deserialize, Serialize};
use std::fmt;

pub type EntityId = i64;

/// Tables the admin backend maps to models. Other names are passed through untouched.
pub const SECTIONS_TABLE: &str = "sections";
pub const ACHIEVEMENTS_TABLE: &str = "achievements";
pub const PRODUCTS_TABLE: &str = "products";
pub const STRATEGIES_TABLE: &str = "strategies";

/// (table name, numeric id) pair that addresses every mutation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub table: String,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(table: impl Into<String>, id: EntityId) -> Self {
        Self {
            table: table.into(),
            id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table, self.id)
    }
}

/// An editable text region bound to one column of one record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EditableField {
    pub entity: EntityRef,
    pub field: String,
}

impl EditableField {
    pub fn new(entity: EntityRef, field: impl Into<String>) -> Self {
        Self {
            entity,
            field: field.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkFields {
    pub link_text: Option<String>,
    pub link_url: Option<String>,
}

/// Body of a create request. Everything but the parent section and table
/// starts out null; the server assigns the id and the final order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewEntityTemplate {
    pub section_id: EntityId,
    pub table_name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_desktop: Option<String>,
    pub image_mobile: Option<String>,
    pub image_alt: Option<String>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,

    /// Only card tables with a secondary link carry these columns.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub links: Option<LinkFields>,

    pub order_value: i64,
}

impl NewEntityTemplate {
    pub fn new(section_id: EntityId, table_name: impl Into<String>) -> Self {
        Self {
            section_id,
            table_name: table_name.into(),
            title: None,
            description: None,
            image_desktop: None,
            image_mobile: None,
            image_alt: None,
            button_text: None,
            button_url: None,
            links: None,
            order_value: 0,
        }
    }

    pub fn with_links(mut self) -> Self {
        self.links = Some(LinkFields::default());
        self
    }
}

/// Delete body. The id travels here rather than in the path.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeleteInstanceRequest {
    pub id: EntityId,
    pub table_name: String,
}

/// Image slot name, read verbatim from markup.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ImageType(pub String);

impl ImageType {
    pub const DESKTOP: &'static str = "image_desktop";
    pub const MOBILE: &'static str = "image_mobile";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What to do with an existing image, read verbatim from markup.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ImageAction(pub String);

impl ImageAction {
    pub const DELETE: &'static str = "image_delete";
    pub const REFRESH: &'static str = "image_refresh";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageAction {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An image slot on a record plus the action a button requests for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAttachment {
    pub entity: EntityRef,
    pub image_type: ImageType,
    pub image_action: ImageAction,
    /// Existing asset path, when the action refers to one.
    pub image_src: Option<String>,
}

/// Loose view of a record echoed back by the server.
///
/// The backend returns whole ORM rows whose columns depend on the table, so
/// only the id is named and the rest is kept as-is.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct EntityRecord {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

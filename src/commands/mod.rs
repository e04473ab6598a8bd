use crate::api::{segment, ApiRequest, Method, MultipartBody, RequestBody};
use crate::config::ImageWireNaming;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    DeleteInstanceRequest, EditableField, EntityRef, ImageAttachment, ImageType,
    NewEntityTemplate,
};
use serde_json::{Map, Value};

pub const CREATE_INSTANCE_ALERT: &str = "Error creating instance: ";
pub const DELETE_INSTANCE_ALERT: &str = "Error deleting instance: ";
pub const UPLOAD_IMAGE_ALERT: &str = "Error uploading image: ";
pub const UPDATE_IMAGE_ALERT: &str = "Error updating image: ";

/// How loudly a failed command is surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Console only. The edited text stays on screen either way.
    Silent,
    /// Console plus a blocking alert prefixed with the given text.
    UserVisible(&'static str),
}

/// One mutation against the admin backend.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    UpdateField {
        field: EditableField,
        value: String,
    },
    CreateInstance(NewEntityTemplate),
    DeleteInstance(EntityRef),
    UploadImage {
        entity: EntityRef,
        image_type: ImageType,
        form: MultipartBody,
    },
    UpdateImage(ImageAttachment),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateField { .. } => "update_field",
            Self::CreateInstance(_) => "create_instance",
            Self::DeleteInstance(_) => "delete_instance",
            Self::UploadImage { .. } => "upload_image",
            Self::UpdateImage(_) => "update_image",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UpdateField { .. } => Severity::Silent,
            Self::CreateInstance(_) => Severity::UserVisible(CREATE_INSTANCE_ALERT),
            Self::DeleteInstance(_) => Severity::UserVisible(DELETE_INSTANCE_ALERT),
            Self::UploadImage { .. } => Severity::UserVisible(UPLOAD_IMAGE_ALERT),
            Self::UpdateImage(_) => Severity::UserVisible(UPDATE_IMAGE_ALERT),
        }
    }

    /// Table the command is addressed to, for log fields.
    pub fn table(&self) -> &str {
        match self {
            Self::UpdateField { field, .. } => &field.entity.table,
            Self::CreateInstance(t) => &t.table_name,
            Self::DeleteInstance(e) | Self::UploadImage { entity: e, .. } => &e.table,
            Self::UpdateImage(a) => &a.entity.table,
        }
    }

    /// Routes the command onto the backend's admin endpoints.
    pub fn into_request(self, naming: ImageWireNaming) -> ApiResult<ApiRequest> {
        let request = match self {
            Self::UpdateField { field, value } => {
                let mut body = Map::new();
                body.insert("id".to_string(), Value::from(field.entity.id));
                body.insert("table".to_string(), Value::from(field.entity.table.clone()));
                // Inserted last so a column literally named `id` or `table` wins.
                body.insert(field.field, Value::String(value));

                ApiRequest {
                    method: Method::Patch,
                    path: format!(
                        "/admin/{}/{}",
                        segment(&field.entity.table),
                        field.entity.id
                    ),
                    body: RequestBody::Json(Value::Object(body)),
                }
            }
            Self::CreateInstance(template) => ApiRequest {
                method: Method::Post,
                path: format!("/admin/sections/{}", segment(&template.table_name)),
                body: RequestBody::Json(to_json(&template)?),
            },
            Self::DeleteInstance(entity) => ApiRequest {
                method: Method::Delete,
                path: format!("/admin/sections/{}", segment(&entity.table)),
                body: RequestBody::Json(to_json(&DeleteInstanceRequest {
                    id: entity.id,
                    table_name: entity.table,
                })?),
            },
            Self::UploadImage {
                entity,
                image_type,
                mut form,
            } => {
                form.push_text(naming.table_key(), entity.table);
                form.push_text(naming.id_key(), entity.id.to_string());
                form.push_text("image_type", image_type.0);

                ApiRequest {
                    method: Method::Post,
                    path: "/admin/images".to_string(),
                    body: RequestBody::Multipart(form),
                }
            }
            Self::UpdateImage(attachment) => {
                let path = format!(
                    "/admin/images/{}/{}",
                    segment(&attachment.entity.table),
                    attachment.entity.id
                );

                let mut body = Map::new();
                body.insert("image_type".to_string(), Value::String(attachment.image_type.0));
                body.insert(
                    "image_action".to_string(),
                    Value::String(attachment.image_action.0),
                );
                if let Some(src) = attachment.image_src {
                    body.insert("image_src".to_string(), Value::String(src));
                }
                body.insert(naming.id_key().to_string(), Value::from(attachment.entity.id));
                body.insert(
                    naming.table_key().to_string(),
                    Value::String(attachment.entity.table),
                );

                ApiRequest {
                    method: Method::Patch,
                    path,
                    body: RequestBody::Json(Value::Object(body)),
                }
            }
        };
        Ok(request)
    }
}

fn to_json<T: serde::Serialize>(v: &T) -> ApiResult<Value> {
    serde_json::to_value(v).map_err(ApiError::parse)
}

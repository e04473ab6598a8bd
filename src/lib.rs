//! Client-side sync layer for the admin panel.
//!
//! Editable regions, buttons and upload forms are bound to records of the
//! admin backend by `(table, id)`. Each interaction becomes one typed
//! [`commands::Command`] that a [`dispatch::Dispatcher`] sends as a single REST
//! call. Field edits go through [`state::FieldSyncEngine`], which only sends
//! when the text differs from what it was on focus.
//!
//! Two ways in:
//! - server-rendered pages: the wasm start function binds every annotated
//!   element once the document is parsed (see [`bind`])
//! - Leptos pages: wrap the page in [`components::AdminProvider`] and use the
//!   admin components directly

pub mod api;
pub mod bind;
pub mod commands;
pub mod components;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;

pub use commands::Command;
pub use dispatch::Dispatcher;
pub use error::{ApiError, ApiErrorKind, ApiResult, ContextError};
pub use state::{AdminContext, AdminHandle, AdminState, FieldOutcome, FieldSyncEngine};

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init();
    bind::bind_when_ready(AdminState::from_env());
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Method, MockTransport, MultipartBody};
    use crate::config::ImageWireNaming;
    use crate::context::{resolve_new_entity, Annotated, ID_ATTR, TABLE_ATTR};
    use crate::dispatch::RecordingReporter;
    use crate::models::{EditableField, EntityRef, ImageType};
    use serde_json::json;
    use std::sync::Arc;

    struct Attrs(Vec<(&'static str, &'static str)>);

    impl Annotated for Attrs {
        fn annotation(&self, name: &str) -> Option<String> {
            self.0
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    fn wired() -> (
        Dispatcher<MockTransport>,
        FieldSyncEngine<MockTransport>,
        Arc<MockTransport>,
        Arc<RecordingReporter>,
    ) {
        let transport = Arc::new(MockTransport::new());
        let reporter = Arc::new(RecordingReporter::new());
        let dispatcher =
            Dispatcher::new(transport.clone(), reporter.clone(), ImageWireNaming::Entity);
        let engine = FieldSyncEngine::new(dispatcher.clone());
        (dispatcher, engine, transport, reporter)
    }

    #[tokio::test]
    async fn title_edit_round_trip() {
        let (_, engine, transport, reporter) = wired();
        let field = EditableField::new(EntityRef::new("achievements", 42), "title");

        engine.focus(&field, "Old Title");
        engine.blur(&field, "New Title").await.expect("saved");

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Patch);
        assert_eq!(sent[0].path, "/admin/achievements/42");
        assert_eq!(
            sent[0].body.as_json(),
            Some(&json!({"id": 42, "table": "achievements", "title": "New Title"}))
        );
        assert!(reporter.alerts().is_empty());
    }

    #[tokio::test]
    async fn add_instance_under_section() {
        let (dispatcher, _, transport, _) = wired();
        let chain = vec![
            Attrs(vec![(TABLE_ATTR, "cards")]),
            Attrs(vec![(TABLE_ATTR, "sections"), (ID_ATTR, "7")]),
        ];

        let template = resolve_new_entity(&chain).expect("resolves");
        dispatcher
            .dispatch(Command::CreateInstance(template))
            .await
            .expect("created");

        let sent = transport.requests();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].path, "/admin/sections/cards");
        let body = sent[0].body.as_json().expect("json");
        assert_eq!(body["section_id"], 7);
        assert_eq!(body["table_name"], "cards");
        assert_eq!(body["order_value"], 0);
        assert_eq!(body["title"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn upload_appends_reference_to_form_fields() {
        let (dispatcher, _, transport, _) = wired();
        let form = MultipartBody::new().text("image_alt", "Hero");

        dispatcher
            .dispatch(Command::UploadImage {
                entity: EntityRef::new("heroes", 3),
                image_type: ImageType::from("desktop"),
                form,
            })
            .await
            .expect("uploaded");

        let sent = transport.requests();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].path, "/admin/images");
        let body = sent[0].body.as_multipart().expect("multipart");
        assert_eq!(body.text_value("image_alt"), Some("Hero"));
        assert_eq!(body.text_value("entity_name"), Some("heroes"));
        assert_eq!(body.text_value("entity_id"), Some("3"));
        assert_eq!(body.text_value("image_type"), Some("desktop"));
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_another_interaction() {
        let (dispatcher, engine, transport, reporter) = wired();
        transport.push_network_error("offline");
        transport.push_response(json!({"id": 9}));

        let title = EditableField::new(EntityRef::new("products", 9), "title");
        assert!(engine.blur(&title, "x").await.is_err());

        let deleted = dispatcher
            .dispatch(Command::DeleteInstance(EntityRef::new("products", 9)))
            .await
            .expect("delete succeeds");
        assert_eq!(deleted["id"], 9);
        assert!(reporter.alerts().is_empty());
    }
}

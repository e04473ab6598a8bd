mod field_sync;

pub use field_sync::{FieldOutcome, FieldSyncEngine};

use crate::api::{ApiClient, Transport};
use crate::commands::{Command, Severity};
use crate::config::EnvConfig;
use crate::dispatch::{Dispatcher, Reporter, WindowReporter};
use crate::error::ApiResult;
use crate::models::EditableField;
use futures::future::{FutureExt, LocalBoxFuture};
use std::ops::Deref;
use std::sync::Arc;

/// Everything an admin page needs to push edits: one dispatcher for
/// create/delete/image commands and one field engine sharing it.
pub struct AdminState<T = ApiClient> {
    pub dispatcher: Dispatcher<T>,
    pub fields: FieldSyncEngine<T>,
}

impl<T> Clone for AdminState<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<T: Transport> AdminState<T> {
    pub fn with_dispatcher(dispatcher: Dispatcher<T>) -> Self {
        Self {
            fields: FieldSyncEngine::new(dispatcher.clone()),
            dispatcher,
        }
    }
}

impl AdminState {
    pub fn new(config: &EnvConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self::with_dispatcher(Dispatcher::new(
            Arc::new(ApiClient::from_config(config)),
            reporter,
            config.image_naming,
        ))
    }

    /// Browser defaults: `window.ENV` config and `window.alert` reporting.
    pub fn from_env() -> Self {
        Self::new(&EnvConfig::new(), Arc::new(WindowReporter))
    }
}

/// The admin operations a component can trigger, independent of transport.
pub trait AdminHandle: Send + Sync {
    fn focus(&self, field: &EditableField, current: &str);

    fn blur(
        &self,
        field: EditableField,
        current: String,
    ) -> LocalBoxFuture<'static, ApiResult<FieldOutcome>>;

    fn dispatch(&self, command: Command) -> LocalBoxFuture<'static, ApiResult<serde_json::Value>>;

    fn report(&self, severity: Severity, error: &dyn std::fmt::Display);
}

impl<T> AdminHandle for AdminState<T>
where
    T: Transport + Send + Sync + 'static,
{
    fn focus(&self, field: &EditableField, current: &str) {
        self.fields.focus(field, current);
    }

    fn blur(
        &self,
        field: EditableField,
        current: String,
    ) -> LocalBoxFuture<'static, ApiResult<FieldOutcome>> {
        let engine = self.fields.clone();
        async move { engine.blur(&field, &current).await }.boxed_local()
    }

    fn dispatch(&self, command: Command) -> LocalBoxFuture<'static, ApiResult<serde_json::Value>> {
        let dispatcher = self.dispatcher.clone();
        async move { dispatcher.dispatch(command).await }.boxed_local()
    }

    fn report(&self, severity: Severity, error: &dyn std::fmt::Display) {
        self.dispatcher.report(severity, error);
    }
}

/// Provided through Leptos context to the admin components.
#[derive(Clone)]
pub struct AdminContext(Arc<dyn AdminHandle>);

impl AdminContext {
    pub fn new<T>(state: AdminState<T>) -> Self
    where
        T: Transport + Send + Sync + 'static,
    {
        Self(Arc::new(state))
    }
}

impl Deref for AdminContext {
    type Target = dyn AdminHandle;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockTransport;
    use crate::config::ImageWireNaming;
    use crate::dispatch::RecordingReporter;
    use crate::models::{EntityRef, NewEntityTemplate};
    use serde_json::json;

    #[test]
    fn admin_state_shares_config() {
        let mut config = EnvConfig::with_api_url("http://localhost:8000/");
        config.image_naming = ImageWireNaming::Table;
        let state = AdminState::new(&config, Arc::new(RecordingReporter::new()));

        assert_eq!(state.dispatcher.transport().base_url, "http://localhost:8000");
        assert_eq!(state.dispatcher.naming(), ImageWireNaming::Table);
    }

    #[tokio::test]
    async fn context_forwards_to_the_wrapped_state() {
        let transport = Arc::new(MockTransport::new());
        let reporter = Arc::new(RecordingReporter::new());
        let state = AdminState::with_dispatcher(Dispatcher::new(
            transport.clone(),
            reporter.clone(),
            ImageWireNaming::Entity,
        ));
        let admin = AdminContext::new(state);
        let field = EditableField::new(EntityRef::new("achievements", 42), "title");

        admin.focus(&field, "Old Title");
        let outcome = admin
            .blur(field, "New Title".to_string())
            .await
            .expect("saved");
        assert!(matches!(outcome, FieldOutcome::Saved(_)));

        transport.push_http_error(500, "boom");
        let _ = admin
            .dispatch(Command::CreateInstance(NewEntityTemplate::new(7, "cards")))
            .await;

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[0].body.as_json(),
            Some(&json!({"id": 42, "table": "achievements", "title": "New Title"}))
        );
        assert_eq!(sent[1].path, "/admin/sections/cards");
        assert_eq!(reporter.alerts().len(), 1);
    }
}

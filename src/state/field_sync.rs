use crate::api::Transport;
use crate::commands::Command;
use crate::dispatch::Dispatcher;
use crate::error::ApiResult;
use crate::models::EditableField;
use futures::lock::Mutex as AsyncMutex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, PartialEq)]
pub enum FieldOutcome {
    /// Text matched the baseline; nothing was sent.
    Unchanged,
    /// The backend accepted the edit and echoed the record.
    Saved(serde_json::Value),
    /// A later blur on the same field was queued while this one waited for
    /// its turn; this value was never sent.
    Superseded,
}

struct FieldState {
    /// Captured on focus, taken on blur.
    baseline: Option<String>,
    /// Token of the most recent blur that found a change.
    latest: u64,
    /// Blurs that are waiting for or holding `turn`.
    pending: usize,
    /// One request per field on the wire at a time.
    turn: Arc<AsyncMutex<()>>,
}

impl Default for FieldState {
    fn default() -> Self {
        Self {
            baseline: None,
            latest: 0,
            pending: 0,
            turn: Arc::new(AsyncMutex::new(())),
        }
    }
}

/// Dirty tracking for editable fields.
///
/// Responsibilities:
/// - baseline capture on focus
/// - dirty check and single-field PATCH on blur
/// - per-field ordering: a PATCH is only sent once the previous one for the
///   same field has completed, and a queued value is dropped when a newer
///   one is queued behind it
///
/// Non-responsibilities:
/// - retries, batching, debounce
/// - writing anything back to the page
pub struct FieldSyncEngine<T> {
    dispatcher: Dispatcher<T>,
    fields: Arc<Mutex<HashMap<EditableField, FieldState>>>,
}

impl<T> Clone for FieldSyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            fields: Arc::clone(&self.fields),
        }
    }
}

impl<T: Transport> FieldSyncEngine<T> {
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Self {
            dispatcher,
            fields: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EditableField, FieldState>> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called when the field gains focus.
    pub fn focus(&self, field: &EditableField, current: &str) {
        self.lock().entry(field.clone()).or_default().baseline = Some(current.to_string());
    }

    pub fn baseline(&self, field: &EditableField) -> Option<String> {
        self.lock().get(field).and_then(|s| s.baseline.clone())
    }

    /// Called when the field loses focus.
    ///
    /// A blur without a preceding focus compares against the empty string, so
    /// any non-empty text is sent.
    pub async fn blur(&self, field: &EditableField, current: &str) -> ApiResult<FieldOutcome> {
        let (token, turn) = {
            let mut fields = self.lock();
            let state = fields.entry(field.clone()).or_default();
            let baseline = state.baseline.take().unwrap_or_default();

            if baseline == current {
                if state.pending == 0 {
                    fields.remove(field);
                }
                tracing::debug!(
                    table = %field.entity.table,
                    id = field.entity.id,
                    field = %field.field,
                    "field unchanged"
                );
                return Ok(FieldOutcome::Unchanged);
            }

            state.latest += 1;
            state.pending += 1;
            (state.latest, Arc::clone(&state.turn))
        };

        let _turn = turn.lock().await;

        if self.is_stale(field, token) {
            self.release(field);
            tracing::debug!(
                table = %field.entity.table,
                id = field.entity.id,
                field = %field.field,
                token,
                "skipping superseded edit"
            );
            return Ok(FieldOutcome::Superseded);
        }

        let result = self
            .dispatcher
            .dispatch(Command::UpdateField {
                field: field.clone(),
                value: current.to_string(),
            })
            .await;
        self.release(field);

        result.map(FieldOutcome::Saved)
    }

    fn is_stale(&self, field: &EditableField, token: u64) -> bool {
        self.lock().get(field).is_some_and(|s| s.latest != token)
    }

    /// Drops the field's entry once nothing is queued and no baseline is held.
    fn release(&self, field: &EditableField) {
        let mut fields = self.lock();
        let idle = match fields.get_mut(field) {
            Some(state) => {
                state.pending = state.pending.saturating_sub(1);
                state.pending == 0 && state.baseline.is_none()
            }
            None => false,
        };
        if idle {
            fields.remove(field);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.lock().len()
    }
}

//! Actionable notifications: the pending-entry store and the process-wide
//! action registry that resolves symbolic callback names.
//!
//! A pending entry lives until one of its actions is executed; the whole
//! entry is then retired, unexecuted actions included. There is no timed
//! eviction; an external consumer is expected to eventually act on or
//! discard entries.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::request::{Action, ActionCallback, ActionHandler, NotificationRequest};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("action name must not be empty")]
    EmptyName,
}

/// Mapping from symbolic name to callback. Entries are added and removed
/// explicitly by callers; nothing auto-populates it.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: Mutex<HashMap<String, ActionHandler>>,
}

impl ActionRegistry {
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: ActionHandler,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        debug!("Registered action {name}");
        self.handlers.lock().unwrap().insert(name, handler);
        Ok(())
    }

    pub fn unregister(&self, name: &str) {
        self.handlers.lock().unwrap().remove(name);
        debug!("Unregistered action {name}");
    }

    pub fn resolve(&self, name: &str) -> Option<ActionHandler> {
        self.handlers.lock().unwrap().get(name).cloned()
    }
}

/// A notification that declared follow-up actions and awaits execution.
pub struct PendingNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub actions: Vec<Action>,
    pub request: NotificationRequest,
}

/// Read-only view of a pending entry for an external presentation layer.
#[derive(Debug, Clone)]
pub struct PendingSummary {
    pub id: String,
    pub title: String,
    pub message: String,
    /// (action id, label) pairs in declaration order.
    pub actions: Vec<(String, String)>,
}

#[derive(Default)]
pub struct PendingStore {
    entries: Mutex<HashMap<String, PendingNotification>>,
}

impl PendingStore {
    /// Store an actionable notification and return its fresh id.
    pub fn insert(&self, request: &NotificationRequest) -> String {
        let id = Uuid::new_v4().to_string();
        let entry = PendingNotification {
            id: id.clone(),
            title: request.title.clone(),
            message: request.message.clone(),
            actions: request.actions.clone(),
            request: request.clone(),
        };
        self.entries.lock().unwrap().insert(id.clone(), entry);
        debug!("Stored actionable notification {id}");
        id
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<PendingSummary> {
        self.entries
            .lock()
            .unwrap()
            .values()
            .map(|entry| PendingSummary {
                id: entry.id.clone(),
                title: entry.title.clone(),
                message: entry.message.clone(),
                actions: entry
                    .actions
                    .iter()
                    .map(|a| (a.id.clone(), a.label.clone()))
                    .collect(),
            })
            .collect()
    }

    /// Execute `action_id` on entry `id`. Returns `true` iff a matching
    /// action id was found on an existing entry.
    ///
    /// The find-then-delete is atomic under the store lock, so concurrent
    /// calls with the same id cannot both fire. The matched entry is
    /// removed before the callback runs; a named callback missing from the
    /// registry is a logged no-op and still counts as executed.
    pub fn execute(&self, id: &str, action_id: &str, registry: &ActionRegistry) -> bool {
        let callback = {
            let mut entries = self.entries.lock().unwrap();
            let Some(entry) = entries.get(id) else {
                debug!("No pending notification {id}");
                return false;
            };
            let Some(action) = entry.actions.iter().find(|a| a.id == action_id) else {
                debug!("Action id {action_id} not found in notification {id}");
                return false;
            };
            let callback = action.callback.clone();
            entries.remove(id);
            callback
        };

        match callback {
            Some(ActionCallback::Direct(handler)) => invoke(&handler, action_id),
            Some(ActionCallback::Named(name)) => match registry.resolve(&name) {
                Some(handler) => invoke(&handler, action_id),
                None => info!("Action registry entry missing for {name}"),
            },
            None => info!("No callback attached to action {action_id}"),
        }
        true
    }
}

// A misbehaving handler must not take the dispatcher down with it.
fn invoke(handler: &ActionHandler, action_id: &str) {
    if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler())).is_err() {
        warn!("Action callback panicked for {action_id}");
    }
}

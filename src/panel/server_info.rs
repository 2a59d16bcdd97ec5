use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::PanelError;

/// Status value reported while the panel waits for the owner to accept the allocated server
pub const WAITING_FOR_ACCEPT: &str = "WAITING_FOR_ACCEPT";

/// Snapshot returned by the status endpoint.
///
/// Only the handful of fields the lifecycle logic inspects get typed accessors;
/// everything else is kept untouched and reachable through [`ServerInfo::get`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerInfo {
    fields: Map<String, Value>,
}

impl ServerInfo {
    /// Current status string, e.g. `"WAITING_FOR_ACCEPT"`
    pub fn status(&self) -> Option<&str> {
        self.fields.get("status").and_then(Value::as_str)
    }

    pub fn is_started(&self) -> Option<bool> {
        self.flag("isStarted")
    }

    pub fn is_running(&self) -> Option<bool> {
        self.flag("isRunning")
    }

    pub fn is_editor_mode(&self) -> Option<bool> {
        self.flag("isEditorMode")
    }

    /// The `error` field as sent by the panel, if any
    pub fn error(&self) -> Option<&Value> {
        self.fields.get("error")
    }

    /// Server is started and running, i.e. reachable by players
    pub fn is_up(&self) -> bool {
        self.is_started() == Some(true) && self.is_running() == Some(true)
    }

    /// Queueing finished and the panel needs an explicit accept
    pub fn needs_accept(&self) -> bool {
        self.status() == Some(WAITING_FOR_ACCEPT)
    }

    /// Both flags must be reported as `false`; a missing flag does not count.
    pub fn can_restart(&self) -> bool {
        self.is_running() == Some(false) && self.is_editor_mode() == Some(false)
    }

    /// Raw access to any field, known or not
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }
}

impl TryFrom<Value> for ServerInfo {
    type Error = PanelError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(PanelError::ParseError(format!(
                "expected a JSON object from the status endpoint, got: {}",
                other
            ))),
        }
    }
}

/// Truthiness of a JSON value, as the panel's `error` flag is interpreted.
///
/// `null`, `false`, `0`, `""`, `[]` and `{}` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Check a mutating endpoint's response for a truthy `error` field.
///
/// A body without an `error` key is treated as success.
pub fn ensure_no_error(action: &str, body: &Value) -> Result<(), PanelError> {
    match body.get("error") {
        Some(flag) if is_truthy(flag) => Err(PanelError::RemoteActionError {
            action: action.to_string(),
            body: body.clone(),
        }),
        _ => Ok(()),
    }
}

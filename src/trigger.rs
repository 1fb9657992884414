use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Event name the notification shortcuts fire on the client.
pub const DEFAULT_NOTIFICATION_KEY: &str = "showMessage";

const NOTIFICATION_KEY_LEVEL: &str = "level";
const NOTIFICATION_KEY_MESSAGE: &str = "message";

/// Severity carried in a notification trigger payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NotificationLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Builder for `HX-Trigger` header values.
///
/// Stays in the simple comma-joined form (`"event-a, event-b"`) as long as
/// every event is bare; adding a detailed or object event switches the whole
/// set to the JSON object form.
#[derive(Debug, Clone)]
pub struct Trigger {
    events: Vec<(String, Value)>,
    only_simple: bool,
}

impl Default for Trigger {
    fn default() -> Self {
        Self::new()
    }
}

impl Trigger {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            only_simple: true,
        }
    }

    fn add(mut self, event: impl Into<String>, data: Value) -> Self {
        self.events.push((event.into(), data));
        self
    }

    /// Add a bare event.
    pub fn add_event(self, event: impl Into<String>) -> Self {
        self.add(event, Value::String(String::new()))
    }

    /// Add an event carrying a plain string payload.
    pub fn add_event_detailed(mut self, event: impl Into<String>, message: impl Into<String>) -> Self {
        self.only_simple = false;
        self.add(event, Value::String(message.into()))
    }

    /// Add an event carrying a structured payload. A payload that cannot be
    /// serialized is replaced with null.
    pub fn add_event_object(mut self, event: impl Into<String>, details: impl Serialize) -> Self {
        self.only_simple = false;
        let data = match serde_json::to_value(details) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("unserializable trigger payload: {err}");
                Value::Null
            }
        };
        self.add(event, data)
    }

    /// Build the notification payload used by the response helpers: a
    /// `showMessage` event with `level` and `message` keys plus any extra
    /// vars, with reserved keys escaped by an underscore prefix.
    pub fn notification(level: NotificationLevel, message: &str, vars: &[(&str, &str)]) -> Self {
        let mut details = serde_json::Map::new();
        details.insert(
            NOTIFICATION_KEY_LEVEL.to_string(),
            Value::String(level.as_str().to_string()),
        );
        details.insert(
            NOTIFICATION_KEY_MESSAGE.to_string(),
            Value::String(message.to_string()),
        );

        for (key, value) in vars {
            let key = if *key == NOTIFICATION_KEY_LEVEL || *key == NOTIFICATION_KEY_MESSAGE {
                format!("_{key}")
            } else {
                (*key).to_string()
            };
            details.insert(key, Value::String((*value).to_string()));
        }

        Trigger::new().add_event_object(DEFAULT_NOTIFICATION_KEY, Value::Object(details))
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.only_simple {
            let names: Vec<&str> = self.events.iter().map(|(event, _)| event.as_str()).collect();
            return f.write_str(&names.join(", "));
        }

        let mut map = serde_json::Map::new();
        for (event, data) in &self.events {
            map.insert(event.clone(), data.clone());
        }

        match serde_json::to_string(&Value::Object(map)) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_events_join_with_commas() {
        let trigger = Trigger::new().add_event("saved").add_event("closed");
        assert_eq!(trigger.to_string(), "saved, closed");
    }

    #[test]
    fn detailed_event_switches_to_object_form() {
        let trigger = Trigger::new().add_event_detailed("saved", "article stored");
        let value: Value = serde_json::from_str(&trigger.to_string()).unwrap();
        assert_eq!(value["saved"], "article stored");
    }

    #[test]
    fn object_event_carries_structured_payload() {
        let trigger = Trigger::new()
            .add_event_object("saved", serde_json::json!({ "id": 42, "kind": "article" }));
        let value: Value = serde_json::from_str(&trigger.to_string()).unwrap();
        assert_eq!(value["saved"]["id"], 42);
        assert_eq!(value["saved"]["kind"], "article");
    }

    #[test]
    fn mixing_simple_and_detailed_uses_object_form() {
        let trigger = Trigger::new()
            .add_event("closed")
            .add_event_detailed("saved", "done");
        let value: Value = serde_json::from_str(&trigger.to_string()).unwrap();
        assert_eq!(value["closed"], "");
        assert_eq!(value["saved"], "done");
    }

    #[test]
    fn notification_payload_shape() {
        let trigger = Trigger::notification(
            NotificationLevel::Warning,
            "low disk",
            &[("host", "web-1")],
        );
        let value: Value = serde_json::from_str(&trigger.to_string()).unwrap();
        let payload = &value[DEFAULT_NOTIFICATION_KEY];
        assert_eq!(payload["level"], "warning");
        assert_eq!(payload["message"], "low disk");
        assert_eq!(payload["host"], "web-1");
    }

    #[test]
    fn notification_escapes_reserved_keys() {
        let trigger = Trigger::notification(
            NotificationLevel::Error,
            "boom",
            &[("level", "fatal"), ("message", "override")],
        );
        let value: Value = serde_json::from_str(&trigger.to_string()).unwrap();
        let payload = &value[DEFAULT_NOTIFICATION_KEY];
        assert_eq!(payload["level"], "error");
        assert_eq!(payload["_level"], "fatal");
        assert_eq!(payload["_message"], "override");
    }
}

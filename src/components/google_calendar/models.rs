use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Calendar event exactly as the provider returned it
///
/// Only `summary` and `start` are ever read; the object is relayed to clients untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarEvent(pub Value);

impl CalendarEvent {
    /// Event title, empty when the provider sent none
    pub fn summary(&self) -> &str {
        self.0.get("summary").and_then(Value::as_str).unwrap_or("")
    }

    /// Raw start value: `start.dateTime`, falling back to `start.date` for all-day events
    pub fn start_value(&self) -> Option<&str> {
        let start = self.0.get("start")?;
        start
            .get("dateTime")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| start.get("date").and_then(Value::as_str))
    }
}

impl From<Value> for CalendarEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Body of a calendar events-list response
#[derive(Debug, Default, Deserialize)]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
}

/// Events split into buckets; `important` is always a subset of `regular`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifiedEvents {
    pub important: Vec<CalendarEvent>,
    pub regular: Vec<CalendarEvent>,
}

/// Token endpoint response for both grant types
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

use serde_json::Value;

pub const DEFAULT_SCAN_NAME: &str = "Unknown";
pub const DEFAULT_ALERT_NAME: &str = "Chartink Alert";

/// Free-form fields copied from the alert onto every row of its iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertMeta {
    pub scan_name: String,
    pub alert_name: String,

    // None => stamp with the processing time
    pub triggered_at: Option<String>,

    pub scan_url: String,
}

fn field_text(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl AlertMeta {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            scan_name: field_text(payload, "scan_name").unwrap_or_else(|| DEFAULT_SCAN_NAME.to_string()),
            alert_name: field_text(payload, "alert_name").unwrap_or_else(|| DEFAULT_ALERT_NAME.to_string()),
            triggered_at: field_text(payload, "triggered_at"),
            scan_url: field_text(payload, "scan_url").unwrap_or_default(),
        }
    }
}

/// An alert after symbol cleanup, ready to be written as one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAlert {
    pub symbols: Vec<String>,
    pub trigger_prices: Vec<f64>,
    pub meta: AlertMeta,
}

impl NormalizedAlert {
    /// Positional match; anything past the end of the price list is 0.
    pub fn trigger_price(&self, index: usize) -> f64 {
        self.trigger_prices.get(index).copied().unwrap_or(0.0)
    }
}

use serde_json::Value;

use crate::models::{AlertMeta, NormalizedAlert};

pub const MAX_SYMBOL_LEN: usize = 20;

/// Trim, upper-case and strip the `NSE:` / `.NS` exchange markers.
///
/// Returns `None` for entries that end up empty or longer than
/// [`MAX_SYMBOL_LEN`] characters.
pub fn clean_symbol(raw: &str) -> Option<String> {
    let clean = raw
        .trim()
        .to_uppercase()
        .replace("NSE:", "")
        .replace(".NS", "");

    if clean.is_empty() || clean.chars().count() > MAX_SYMBOL_LEN {
        return None;
    }
    Some(clean)
}

/// Pull the symbol list out of an alert payload.
///
/// `stocks` may be a comma separated string or a list; any other shape (or a
/// missing field) gives an empty list. Order is kept, duplicates are not removed.
pub fn extract_symbols(payload: &Value) -> Vec<String> {
    let raw: Vec<&str> = match payload.get("stocks") {
        Some(Value::String(s)) => s.split(',').collect(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => {
            tracing::debug!("no usable 'stocks' field in alert payload");
            return Vec::new();
        }
    };

    raw.into_iter()
        .filter_map(|s| {
            let cleaned = clean_symbol(s);
            if let Some(c) = &cleaned {
                tracing::debug!(raw = s, cleaned = %c, "cleaned symbol");
            }
            cleaned
        })
        .collect()
}

fn price_of(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse `trigger_prices`. A single bad entry discards the whole list.
pub fn parse_trigger_prices(payload: &Value) -> Vec<f64> {
    let parsed: Option<Vec<f64>> = match payload.get("trigger_prices") {
        Some(Value::String(s)) => s.split(',').map(|p| p.trim().parse().ok()).collect(),
        Some(Value::Array(items)) => items.iter().map(price_of).collect(),
        _ => Some(Vec::new()),
    };

    parsed.unwrap_or_else(|| {
        tracing::warn!("unparseable trigger_prices, defaulting every price to 0");
        Vec::new()
    })
}

pub fn normalize(payload: &Value) -> NormalizedAlert {
    NormalizedAlert {
        symbols: extract_symbols(payload),
        trigger_prices: parse_trigger_prices(payload),
        meta: AlertMeta::from_payload(payload),
    }
}

use chrono::{DateTime, TimeZone};

use super::NormalizedAlert;

pub const ITERATION_HEADERS: [&str; 10] = [
    "Sr_No",
    "Stock_Symbol",
    "Trigger_Price",
    "Scan_Name",
    "Alert_Name",
    "Triggered_At",
    "Date_Added",
    "Iteration",
    "Alert_Time",
    "Scan_URL",
];

#[derive(Debug, Clone, PartialEq)]
pub struct StockRow {
    pub sr_no: u32,
    pub symbol: String,
    pub trigger_price: f64,
    pub scan_name: String,
    pub alert_name: String,
    pub triggered_at: String,
    pub date_added: String,
    pub iteration: u32,
    pub alert_time: String,
    pub scan_url: String,
}

impl StockRow {
    /// One row per symbol, numbered from 1 in alert order.
    pub fn build_all<Tz>(alert: &NormalizedAlert, iteration: u32, now: &DateTime<Tz>) -> Vec<StockRow>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let triggered_at = alert
            .meta
            .triggered_at
            .clone()
            .unwrap_or_else(|| now.format("%H:%M %p").to_string());
        let date_added = now.format("%Y-%m-%d").to_string();
        let alert_time = now.format("%H:%M:%S").to_string();

        alert
            .symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| StockRow {
                sr_no: (i + 1) as u32,
                symbol: symbol.clone(),
                trigger_price: alert.trigger_price(i),
                scan_name: alert.meta.scan_name.clone(),
                alert_name: alert.meta.alert_name.clone(),
                triggered_at: triggered_at.clone(),
                date_added: date_added.clone(),
                iteration,
                alert_time: alert_time.clone(),
                scan_url: alert.meta.scan_url.clone(),
            })
            .collect()
    }
}

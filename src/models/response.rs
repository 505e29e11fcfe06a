use serde::{Deserialize, Serialize};

/// JSON body returned by the webhook and download endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stocks: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
}

impl ApiResponse {
    pub fn success(stocks: Vec<String>, iteration: u32) -> Self {
        Self {
            status: "success".to_string(),
            message: format!("Added {} stocks to iteration {}", stocks.len(), iteration),
            stocks: Some(stocks),
            iteration: Some(iteration),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            stocks: None,
            iteration: None,
        }
    }
}

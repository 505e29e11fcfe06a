pub mod alert;
pub mod stock_row;
pub mod response;

pub use alert::{AlertMeta, NormalizedAlert};
pub use stock_row::StockRow;
pub use response::ApiResponse;

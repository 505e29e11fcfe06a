use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;
use umya_spreadsheet::{Spreadsheet, reader, writer};

use crate::{
    error::AppError,
    models::{NormalizedAlert, StockRow, stock_row::ITERATION_HEADERS},
};

pub const MASTER_SHEET: &str = "Master_List";
pub const MASTER_HEADERS: [&str; 5] = [
    "Stock_Symbol",
    "First_Appearance_Date",
    "First_Iteration",
    "Total_Appearances",
    "Last_Updated",
];

pub const EXPORT_SHEET: &str = "TradingView_Export";
pub const EXPORT_HEADERS: [&str; 1] = ["TradingView_Symbols"];

pub const ITERATION_PREFIX: &str = "Iteration_";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// "Iteration_7" and "Iteration_7_old" both count as 7
static ITERATION_SHEET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Iteration_(\d+)(?:_|$)").expect("static regex"));

pub fn iteration_sheet_name(iteration: u32) -> String {
    format!("{ITERATION_PREFIX}{iteration}")
}

pub fn iteration_from_sheet_name(name: &str) -> Option<u32> {
    ITERATION_SHEET
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// One past the highest `Iteration_N` sheet in the workbook at `path`.
///
/// A missing or unreadable workbook starts over at 1. Saturates at `u32::MAX`.
pub fn next_iteration_number(path: &Path) -> u32 {
    if !path.exists() {
        return 1;
    }

    let book = match reader::xlsx::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("could not read {}: {e}; starting at iteration 1", path.display());
            return 1;
        }
    };

    sheet_names(&book)
        .iter()
        .filter_map(|n| iteration_from_sheet_name(n))
        .max()
        .map(|n| n.saturating_add(1))
        .unwrap_or(1)
}

pub fn sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection()
        .iter()
        .map(|s| s.get_name().to_string())
        .collect()
}

fn write_header(book: &mut Spreadsheet, sheet: &str, headers: &[&str]) -> Result<(), AppError> {
    let ws = book.new_sheet(sheet).map_err(|e| AppError::Workbook(e.to_string()))?;
    for (col, title) in headers.iter().enumerate() {
        ws.get_cell_mut((col as u32 + 1, 1u32)).set_value(*title);
    }
    Ok(())
}

fn baseline_workbook() -> Result<Spreadsheet, AppError> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    write_header(&mut book, MASTER_SHEET, &MASTER_HEADERS)?;
    write_header(&mut book, EXPORT_SHEET, &EXPORT_HEADERS)?;
    Ok(book)
}

fn load_or_create(path: &Path) -> Result<Spreadsheet, AppError> {
    if path.exists() {
        return reader::xlsx::read(path).map_err(|e| AppError::Workbook(e.to_string()));
    }
    tracing::info!("creating new workbook: {}", path.display());
    baseline_workbook()
}

/// Result of persisting one iteration.
#[derive(Debug, Clone)]
pub struct WrittenIteration {
    pub iteration: u32,
    pub rows: usize,

    // snapshot of the saved file, handed to the uploader
    pub bytes: Vec<u8>,
}

/// Owns the workbook file and the in-memory iteration counter.
#[derive(Debug)]
pub struct WorkbookWriter {
    path: PathBuf,
    next_iteration: u32,
}

impl WorkbookWriter {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let next_iteration = next_iteration_number(&path);
        tracing::info!("workbook {} next iteration {}", path.display(), next_iteration);
        Self { path, next_iteration }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn next_iteration(&self) -> u32 {
        self.next_iteration
    }

    /// Write `Iteration_<iteration>`, replacing any sheet of that name, and
    /// save the whole workbook.
    pub fn write_iteration(&self, iteration: u32, rows: &[StockRow]) -> Result<(), AppError> {
        let mut book = load_or_create(&self.path)?;
        let name = iteration_sheet_name(iteration);

        if book.get_sheet_by_name(&name).is_some() {
            book.remove_sheet_by_name(&name)
                .map_err(|e| AppError::Workbook(e.to_string()))?;
        }

        let ws = book
            .new_sheet(name.as_str())
            .map_err(|e| AppError::Workbook(e.to_string()))?;

        for (col, title) in ITERATION_HEADERS.iter().enumerate() {
            ws.get_cell_mut((col as u32 + 1, 1u32)).set_value(*title);
        }

        for (i, row) in rows.iter().enumerate() {
            let r = i as u32 + 2;
            ws.get_cell_mut((1u32, r)).set_value_number(row.sr_no);
            ws.get_cell_mut((2u32, r)).set_value(row.symbol.as_str());
            ws.get_cell_mut((3u32, r)).set_value_number(row.trigger_price);
            ws.get_cell_mut((4u32, r)).set_value(row.scan_name.as_str());
            ws.get_cell_mut((5u32, r)).set_value(row.alert_name.as_str());
            ws.get_cell_mut((6u32, r)).set_value(row.triggered_at.as_str());
            ws.get_cell_mut((7u32, r)).set_value(row.date_added.as_str());
            ws.get_cell_mut((8u32, r)).set_value_number(row.iteration);
            ws.get_cell_mut((9u32, r)).set_value(row.alert_time.as_str());
            ws.get_cell_mut((10u32, r)).set_value(row.scan_url.as_str());
        }

        writer::xlsx::write(&book, &self.path).map_err(|e| AppError::Workbook(e.to_string()))
    }

    /// Append the alert as the next iteration. The counter only advances once
    /// the file has been written.
    pub fn append_alert(&mut self, alert: &NormalizedAlert) -> Result<WrittenIteration, AppError> {
        let iteration = self.next_iteration;
        let Some(following) = iteration.checked_add(1) else {
            return Err(AppError::Workbook(format!(
                "iteration counter exhausted at {}",
                iteration_sheet_name(iteration)
            )));
        };
        let rows = StockRow::build_all(alert, iteration, &Local::now());

        self.write_iteration(iteration, &rows)?;
        let bytes = std::fs::read(&self.path)?;

        self.next_iteration = following;

        Ok(WrittenIteration {
            iteration,
            rows: rows.len(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iteration_sheet_names() {
        assert_eq!(iteration_from_sheet_name("Iteration_1"), Some(1));
        assert_eq!(iteration_from_sheet_name("Iteration_42"), Some(42));
        assert_eq!(iteration_from_sheet_name("Iteration_7_old"), Some(7));
        assert_eq!(iteration_from_sheet_name("Iteration_"), None);
        assert_eq!(iteration_from_sheet_name("Iteration_x"), None);
        assert_eq!(iteration_from_sheet_name("Master_List"), None);
        assert_eq!(iteration_from_sheet_name("Iteration_5x"), None);
    }

    fn row(sr_no: u32, symbol: &str, iteration: u32) -> StockRow {
        StockRow {
            sr_no,
            symbol: symbol.to_string(),
            trigger_price: 0.0,
            scan_name: "Unknown".into(),
            alert_name: "Chartink Alert".into(),
            triggered_at: "09:15 AM".into(),
            date_added: "2024-03-05".into(),
            iteration,
            alert_time: "09:15:00".into(),
            scan_url: String::new(),
        }
    }

    #[test]
    fn rewriting_an_iteration_replaces_its_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WorkbookWriter::open(dir.path().join("book.xlsx"));

        let first = [row(1, "TCS", 1), row(2, "INFY", 1), row(3, "SBIN", 1)];
        writer.write_iteration(1, &first).unwrap();
        writer.write_iteration(1, &[row(1, "ITC", 1)]).unwrap();

        let book = reader::xlsx::read(writer.path()).unwrap();
        assert_eq!(sheet_names(&book), vec![MASTER_SHEET, EXPORT_SHEET, "Iteration_1"]);

        let ws = book.get_sheet_by_name("Iteration_1").unwrap();
        assert_eq!(ws.get_value((1u32, 1u32)), "Sr_No");
        assert_eq!(ws.get_value((2u32, 2u32)), "ITC");
        assert_eq!(ws.get_value((2u32, 3u32)), "");
        assert_eq!(ws.get_value((2u32, 4u32)), "");
    }

    #[test]
    fn highest_possible_iteration_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        WorkbookWriter::open(&path).write_iteration(u32::MAX, &[]).unwrap();

        assert_eq!(next_iteration_number(&path), u32::MAX);

        let mut writer = WorkbookWriter::open(&path);
        let alert = NormalizedAlert {
            symbols: vec!["TCS".into()],
            trigger_prices: vec![],
            meta: Default::default(),
        };
        assert!(matches!(writer.append_alert(&alert), Err(AppError::Workbook(_))));
        assert_eq!(writer.next_iteration(), u32::MAX);
    }

    #[test]
    fn missing_workbook_starts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_iteration_number(&dir.path().join("none.xlsx")), 1);
    }

    #[test]
    fn unreadable_workbook_starts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert_eq!(next_iteration_number(&path), 1);
    }
}

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub workbook_path: PathBuf,

    pub drive_enabled: bool,
    pub drive_credentials_file: PathBuf,
    pub drive_folder_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            workbook_path: PathBuf::from("Chartink_Workflow.xlsx"),
            drive_enabled: true,
            drive_credentials_file: PathBuf::from("credentials.json"),
            drive_folder_name: "Chartink_Data".to_string(),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let defaults = Settings::default();

    let host = env::var("HOST").unwrap_or(defaults.host);

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(defaults.port);

    let workbook_path = env::var("WORKBOOK_FILE")
        .map(PathBuf::from)
        .unwrap_or(defaults.workbook_path);

    let drive_enabled = env::var("USE_GOOGLE_DRIVE")
        .ok()
        .and_then(|s| parse_flag(&s))
        .unwrap_or(defaults.drive_enabled);

    let drive_credentials_file = env::var("GOOGLE_CREDENTIALS_FILE")
        .map(PathBuf::from)
        .unwrap_or(defaults.drive_credentials_file);

    let drive_folder_name = env::var("DRIVE_FOLDER_NAME")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(defaults.drive_folder_name);

    Settings {
        host,
        port,
        workbook_path,
        drive_enabled,
        drive_credentials_file,
        drive_folder_name,
    }
}

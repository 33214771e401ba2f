use log::LevelFilter;
use std::path::PathBuf;

pub const DATA_DIR_VAR: &str = "ULTISTATS_DATA_DIR";
pub const LOG_VAR: &str = "ULTISTATS_LOG";
const APP_DIR: &str = "ultistats";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// Where roster, history and the active game are stored.
    pub data_dir: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            data_dir: PathBuf::from(format!("{APP_DIR}-data")),
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = if let Some(dir) = var(DATA_DIR_VAR) {
            PathBuf::from(dir)
        } else if let Some(config_dir) = var("XDG_CONFIG_HOME") {
            PathBuf::from(config_dir).join(APP_DIR)
        } else if let Some(home) = var("HOME") {
            PathBuf::from(home).join(".config").join(APP_DIR)
        } else {
            Self::default().data_dir
        };

        let log_level = var(LOG_VAR).and_then(|level| level.trim().parse::<LevelFilter>().ok());

        Self {
            full_screen: false,
            log_level,
            data_dir,
        }
    }
}

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::stats::label::LabelRule;

const DEFAULT_FILE_NAME: &str = "settings.json";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeaderSettingsFile {
    pub name: String,
    pub version: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SettingsStruct {
    pub header: HeaderSettingsFile,
    /// Connection labeling rules, tried in order.
    #[serde(default = "LabelRule::defaults")]
    pub labels: Vec<LabelRule>,
}

impl Default for SettingsStruct {
    fn default() -> Self {
        SettingsStruct {
            header: HeaderSettingsFile {
                name: "RTC Dump Report".to_string(),
                version: 0,
            },
            labels: LabelRule::defaults(),
        }
    }
}

#[derive(Debug, Default)]
struct Manager {
    content: Option<SettingsStruct>,
}

lazy_static! {
    static ref MANAGER: Arc<Mutex<Manager>> = Default::default();
}

/// `settings.json` in the per-user configuration folder.
pub fn default_file_name() -> Option<PathBuf> {
    ProjectDirs::from("com", "Blue Robotics", env!("CARGO_PKG_NAME"))
        .map(|project| project.config_dir().join(DEFAULT_FILE_NAME))
}

// Init settings manager with the desired settings file, defaults are used
// when it does not exist
pub fn init(file_name: Option<&Path>) {
    let file_name = file_name.map(Path::to_path_buf).or_else(default_file_name);

    let settings = match &file_name {
        Some(file_name) => {
            debug!("Using settings file: {file_name:?}");
            load_settings_from_file(file_name)
        }
        None => {
            warn!("Failed to find user settings path, using defaults.");
            SettingsStruct::default()
        }
    };

    MANAGER.lock().unwrap().content = Some(settings);
}

pub fn load_settings_from_file(file_name: &Path) -> SettingsStruct {
    let content = match std::fs::read_to_string(file_name) {
        Ok(content) => content,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read settings file {file_name:?}: {error}, using defaults.");
            }
            return SettingsStruct::default();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|error| {
        warn!("Failed to parse settings file {file_name:?}: {error}, using defaults.");
        SettingsStruct::default()
    })
}

pub fn labels() -> Vec<LabelRule> {
    MANAGER
        .lock()
        .unwrap()
        .content
        .as_ref()
        .map(|settings| settings.labels.clone())
        .unwrap_or_else(LabelRule::defaults)
}

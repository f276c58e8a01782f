use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::{debug, warn};

pub const SETTINGS_FILE: &str = "ida_presence.toml";
const ENV_PREFIX: &str = "IDA_PRESENCE__";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PresenceSettings {
    pub client_id: String,
    pub throttle_secs: u64,
    pub large_image: String,
    pub large_text: String,
    pub no_function_label: String,
    pub autostart: bool,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            client_id: "1274210451273551973".into(),
            throttle_secs: 5,
            large_image: "ida_logo".into(),
            large_text: "IDA Pro 9.0".into(),
            no_function_label: "No function".into(),
            autostart: true,
        }
    }
}

impl PresenceSettings {
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_secs(self.throttle_secs)
    }
}

pub fn load_settings() -> PresenceSettings {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> PresenceSettings {
    let mut settings = read_settings_file(path).unwrap_or_default();
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn read_settings_file(path: &Path) -> Option<PresenceSettings> {
    let raw = fs::read_to_string(path).ok()?;
    match toml::from_str::<PresenceSettings>(&raw) {
        Ok(settings) => {
            debug!(path = %path.display(), "loaded presence settings");
            Some(settings)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unparsable settings file");
            None
        }
    }
}

pub fn apply_env_overrides(
    settings: &mut PresenceSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

    if let Some(v) = var("CLIENT_ID") {
        settings.client_id = v;
    }
    if let Some(v) = var("THROTTLE_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.throttle_secs = parsed;
        }
    }
    if let Some(v) = var("LARGE_IMAGE") {
        settings.large_image = v;
    }
    if let Some(v) = var("LARGE_TEXT") {
        settings.large_text = v;
    }
    if let Some(v) = var("NO_FUNCTION_LABEL") {
        settings.no_function_label = v;
    }
    if let Some(v) = var("AUTOSTART") {
        if let Some(parsed) = parse_flag(&v) {
            settings.autostart = parsed;
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

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

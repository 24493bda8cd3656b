use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const READABLE_TEMPLATE: &str = "YYYY-MM-DD h:mm A TZ";

/// Date rendering selected for log entry headings.
///
/// Serialized as the template string the selector stands for, so a persisted
/// value reads the same way it is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "YYYY-MM-DD h:mm A TZ")]
    Readable,
    #[serde(rename = "YYYY-MM-DDTHH:mm:ss.sssZ")]
    IsoDateTimeMs,
    #[serde(rename = "YYYY-MM-DD")]
    IsoDate,
    #[serde(rename = "YYYY-MM-DD HH:mm:ss")]
    IsoDateTime,
    #[serde(rename = "MM/DD/YYYY")]
    UsDate,
    #[serde(rename = "DD/MM/YYYY")]
    EuDate,
    #[serde(rename = "custom")]
    Custom,
}

impl DateFormat {
    pub const ALL: [DateFormat; 7] = [
        DateFormat::Readable,
        DateFormat::IsoDateTimeMs,
        DateFormat::IsoDate,
        DateFormat::IsoDateTime,
        DateFormat::UsDate,
        DateFormat::EuDate,
        DateFormat::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::Readable => READABLE_TEMPLATE,
            DateFormat::IsoDateTimeMs => "YYYY-MM-DDTHH:mm:ss.sssZ",
            DateFormat::IsoDate => "YYYY-MM-DD",
            DateFormat::IsoDateTime => "YYYY-MM-DD HH:mm:ss",
            DateFormat::UsDate => "MM/DD/YYYY",
            DateFormat::EuDate => "DD/MM/YYYY",
            DateFormat::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat, fully-defaulted settings record.
///
/// `#[serde(default)]` makes a partially written file merge over
/// [`Settings::default`] field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub enabled: bool,
    pub log_file_name: String,
    /// Empty means the vault root. May be relative or absolute.
    pub log_directory: String,
    pub include_timestamp: bool,
    pub include_source_file: bool,
    #[serde(deserialize_with = "lenient_date_format")]
    pub date_format: DateFormat,
    pub custom_date_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file_name: "task-log.md".to_string(),
            log_directory: String::new(),
            include_timestamp: true,
            include_source_file: true,
            date_format: DateFormat::Custom,
            custom_date_format: READABLE_TEMPLATE.to_string(),
        }
    }
}

/// Live settings handle shared by every component.
pub type SharedSettings = Rc<RefCell<Settings>>;

pub fn shared(settings: Settings) -> SharedSettings {
    Rc::new(RefCell::new(settings))
}

impl Settings {
    /// Picks a selector. Fixed selectors also become the editable template.
    pub fn select_date_format(&mut self, format: DateFormat) {
        self.date_format = format;
        if format != DateFormat::Custom {
            self.custom_date_format = format.as_str().to_string();
        }
    }

    /// Editing the template by hand always switches to the custom selector.
    pub fn set_custom_date_format(&mut self, template: &str) {
        self.custom_date_format = template.to_string();
        self.date_format = DateFormat::Custom;
    }

    /// Applies a single `key = value` change coming from the command line.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "enabled" => self.enabled = parse_bool(key, value)?,
            "log_file_name" => {
                if value.trim().is_empty() {
                    bail!("log_file_name cannot be empty");
                }
                self.log_file_name = value.to_string();
            }
            "log_directory" => self.log_directory = value.to_string(),
            "include_timestamp" => self.include_timestamp = parse_bool(key, value)?,
            "include_source_file" => self.include_source_file = parse_bool(key, value)?,
            "date_format" => {
                let format = DateFormat::parse(value).with_context(|| {
                    let known: Vec<&str> = DateFormat::ALL.iter().map(|f| f.as_str()).collect();
                    format!("Unknown date format '{}' (expected one of: {})", value, known.join(", "))
                })?;
                self.select_date_format(format);
            }
            "custom_date_format" => self.set_custom_date_format(value),
            other => bail!("Unknown setting '{}'", other),
        }
        Ok(())
    }
}

/// Unrecognised selectors render as a plain ISO date instead of failing the load.
fn lenient_date_format<'de, D>(deserializer: D) -> std::result::Result<DateFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(DateFormat::parse(&raw).unwrap_or_else(|| {
        log::warn!("Unknown date format '{}', using {}", raw, DateFormat::IsoDate);
        DateFormat::IsoDate
    }))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => bail!("Setting '{}' expects true or false, got '{}'", key, value),
    }
}

pub fn default_settings_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("task_log").join("settings.toml"))
}

/// Reads persisted settings, merged over defaults. A missing file yields defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        log::debug!("No settings file at {:?}, using defaults", path);
        return Ok(Settings::default());
    }

    let content =
        fs::read_to_string(path).context(format!("Failed to read settings at {:?}", path))?;

    let settings: Settings = toml::from_str(&content)
        .context(format!("Failed to parse settings at {:?}", path))?;

    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .context(format!("Failed to create settings directory {:?}", parent))?;
    }
    let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, content).context(format!("Failed to write settings to {:?}", path))?;
    log::info!("Saved settings to {:?}", path);
    Ok(())
}

//! Layered settings: built-in defaults, the system-wide file, then the
//! user's file. Each top-level table is a profile; `[DEFAULT]` supplies
//! fallback values for every profile.

use anyhow::{Context, Result};
use log::{debug, warn};
use reconcile::ConfigSource;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Table whose values every profile inherits
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// System-wide settings, read before the user's file
pub const SYSTEM_CONFIG: &str = "/etc/emoji-sync/config.toml";

const BUILTIN_DEFAULTS: &str = r#"
[DEFAULT]
"browser.user_agent" = "emoji-sync"
"#;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("emoji-sync"))
}

/// Default location of the user's settings file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Expand `~` and environment variables in a path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw).unwrap_or(std::borrow::Cow::Borrowed(raw.as_ref()));
    PathBuf::from(expanded.as_ref())
}

/// Flattened key/value settings for one profile
#[derive(Debug, Clone, Default)]
pub struct Settings {
    profile: String,
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Load `profile` from the built-in defaults, [`SYSTEM_CONFIG`] and
    /// `user_path`, later layers overriding earlier ones.
    pub fn load(user_path: &Path, profile: &str) -> Result<Self> {
        Self::load_layers(&[PathBuf::from(SYSTEM_CONFIG), user_path.to_path_buf()], profile)
    }

    /// Load `profile` from the built-in defaults followed by `paths`.
    ///
    /// Missing files are skipped; unreadable or invalid files are errors.
    pub fn load_layers(paths: &[PathBuf], profile: &str) -> Result<Self> {
        debug!(
            "Loading settings from \"{}\"",
            paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\", \"")
        );

        let mut layers = vec![parse_layer(BUILTIN_DEFAULTS).context("Invalid built-in defaults")?];
        for path in paths {
            if !path.exists() {
                debug!("Settings file {} does not exist, skipping", path.display());
                continue;
            }
            let content = fs::read_to_string(path)
                .with_context(|| format!("Could not read {}", path.display()))?;
            let layer = parse_layer(&content)
                .with_context(|| format!("Invalid settings in {}", path.display()))?;
            layers.push(layer);
        }

        Ok(Self::from_layers(&layers, profile))
    }

    /// Merge parsed layers into the view of one profile
    fn from_layers(layers: &[Layer], profile: &str) -> Self {
        let mut defaults = BTreeMap::new();
        let mut selected = BTreeMap::new();
        let mut found = false;

        for layer in layers {
            if let Some(section) = layer.get(DEFAULT_SECTION) {
                defaults.extend(section.clone());
            }
            if profile != DEFAULT_SECTION
                && let Some(section) = layer.get(profile)
            {
                found = true;
                selected.extend(section.clone());
            }
        }

        if found || profile == DEFAULT_SECTION {
            debug!("Loading \"{profile}\" profile from settings");
        } else {
            debug!("Profile \"{profile}\" was not found in settings");
        }

        // Profile values win over DEFAULT regardless of which layer set them
        defaults.extend(selected);
        Self {
            profile: profile.to_string(),
            values: defaults,
        }
    }

    /// Name of the loaded profile
    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl ConfigSource for Settings {
    fn get(&self, key: &str) -> Option<&str> {
        Settings::get(self, key)
    }
}

/// Section name -> flattened key/value pairs
type Layer = BTreeMap<String, BTreeMap<String, String>>;

fn parse_layer(content: &str) -> Result<Layer> {
    let table: Table = toml::from_str(content)?;
    let mut layer = Layer::new();

    for (name, value) in table {
        match value {
            Value::Table(section) => {
                let values = layer.entry(name).or_default();
                flatten_into(values, None, Value::Table(section));
            }
            // Keys outside any table behave like DEFAULT entries
            scalar => {
                let values = layer.entry(DEFAULT_SECTION.to_string()).or_default();
                flatten_into(values, Some(name), scalar);
            }
        }
    }

    Ok(layer)
}

/// Flatten nested tables into dotted keys, so `1.id = "a"` and
/// `"1.id" = "a"` read the same
fn flatten_into(out: &mut BTreeMap<String, String>, prefix: Option<String>, value: Value) {
    let join = |key: &str| match &prefix {
        Some(p) => format!("{p}.{key}"),
        None => key.to_string(),
    };

    match value {
        Value::Table(table) => {
            for (key, nested) in table {
                flatten_into(out, Some(join(&key)), nested);
            }
        }
        Value::Array(items) => {
            let key = prefix.clone().unwrap_or_default();
            let parts: Option<Vec<String>> = items.into_iter().map(scalar_to_string).collect();
            match parts {
                Some(parts) => {
                    out.insert(key, parts.join("|"));
                }
                None => warn!("Setting \"{key}\" must be a list of plain values, ignoring"),
            }
        }
        scalar => {
            if let (Some(key), Some(text)) = (prefix, scalar_to_string(scalar)) {
                out.insert(key, text);
            }
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(d) => Some(d.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Environment variable naming an alternate overlay path.
pub const CONFIG_PATH_ENV: &str = "CHATGATE_CONFIG";
/// Environment variable overriding `settings.owner`.
pub const OWNER_ENV: &str = "CHATGATE_OWNER";
/// Environment variable overriding `settings.mode`.
pub const MODE_ENV: &str = "CHATGATE_MODE";

/// Errors from explicit configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid mode {0:?} (expected \"public\" or \"private\")")]
    InvalidMode(String),
}

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub commands: Commands,
}

/// Operating mode of the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Any permitted sender may run unrestricted commands.
    #[default]
    Public,
    /// Only the owner may run anything.
    Private,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Public => "public",
            Mode::Private => "private",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Mode::Public),
            "private" => Ok(Mode::Private),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Owner identifier, local part only (e.g. "15551234567").
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub mode: Mode,
}

/// The four classification sets. A command may appear in several.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Commands {
    #[serde(default)]
    pub owner_only: Vec<String>,
    #[serde(default)]
    pub group_admin: Vec<String>,
    #[serde(default)]
    pub group_only: Vec<String>,
    #[serde(default)]
    pub general: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    commands: CommandsOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    owner: Option<String>,
    mode: Option<Mode>,
}

#[derive(Debug, Deserialize, Default)]
struct CommandsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    owner_only: Vec<String>,
    #[serde(default)]
    group_admin: Vec<String>,
    #[serde(default)]
    group_only: Vec<String>,
    #[serde(default)]
    general: Vec<String>,
    #[serde(default)]
    remove_owner_only: Vec<String>,
    #[serde(default)]
    remove_group_admin: Vec<String>,
    #[serde(default)]
    remove_group_only: Vec<String>,
    #[serde(default)]
    remove_general: Vec<String>,
}

// ── Merge logic ──

/// Canonical form of a command name in the registry: trimmed, lowercase.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
/// Names are compared in their normalized form.
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        base.clear();
    } else {
        let remove: Vec<String> = remove.iter().map(|r| normalize_name(r)).collect();
        base.retain(|item| !remove.contains(&normalize_name(item)));
    }
    for item in add {
        let item = normalize_name(&item);
        if !base.iter().any(|b| normalize_name(b) == item) {
            base.push(item);
        }
    }
}

/// Strip a domain suffix (`111@s.whatsapp.net` → `111`).
fn normalize_owner(owner: &str) -> String {
    let owner = owner.trim();
    owner.split('@').next().unwrap_or(owner).to_string()
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from `$CHATGATE_CONFIG` or ~/.config/chatgate/config.toml
    /// 3. Apply `CHATGATE_OWNER` / `CHATGATE_MODE` from the environment
    ///
    /// A broken overlay is logged and skipped; defaults still apply.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(path) = Self::overlay_path() {
            match Self::read_overlay(&path) {
                Ok(Some(overlay)) => config.apply_overlay(overlay),
                Ok(None) => {}
                Err(e) => log::warn!("ignoring config overlay: {e}"),
            }
        }
        if let Err(e) = config.apply_env(|key| std::env::var(key).ok()) {
            log::warn!("ignoring environment override: {e}");
        }
        config
    }

    /// Load defaults merged with the overlay at `path`. Unlike [`Config::load`],
    /// a missing or malformed file is an error.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_overlay_str(&content)
    }

    /// Load defaults merged with an overlay given as TOML text.
    pub fn from_overlay_str(toml_str: &str) -> Result<Self, ConfigError> {
        let overlay: ConfigOverlay = toml::from_str(toml_str)?;
        let mut config = Self::default_config();
        config.apply_overlay(overlay);
        Ok(config)
    }

    fn overlay_path() -> Option<PathBuf> {
        if let Ok(custom) = std::env::var(CONFIG_PATH_ENV) {
            let expanded = shellexpand::tilde(&custom);
            return Some(PathBuf::from(expanded.as_ref()));
        }
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(".config/chatgate/config.toml"))
    }

    /// `Ok(None)` when the file does not exist.
    fn read_overlay(path: &Path) -> Result<Option<ConfigOverlay>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(Some(toml::from_str(&content)?))
    }

    /// Apply owner/mode overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Validate everything before assigning anything.
        let mode = lookup(MODE_ENV).map(|m| m.parse::<Mode>()).transpose()?;
        let owner = lookup(OWNER_ENV).map(|o| normalize_owner(&o));
        if let Some(owner) = owner {
            self.settings.owner = owner;
        }
        if let Some(mode) = mode {
            self.settings.mode = mode;
        }
        Ok(())
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        if let Some(owner) = overlay.settings.owner {
            self.settings.owner = normalize_owner(&owner);
        }
        if let Some(mode) = overlay.settings.mode {
            self.settings.mode = mode;
        }

        let c = overlay.commands;
        merge_list(
            &mut self.commands.owner_only,
            c.owner_only,
            &c.remove_owner_only,
            c.replace,
        );
        merge_list(
            &mut self.commands.group_admin,
            c.group_admin,
            &c.remove_group_admin,
            c.replace,
        );
        merge_list(
            &mut self.commands.group_only,
            c.group_only,
            &c.remove_group_only,
            c.replace,
        );
        merge_list(
            &mut self.commands.general,
            c.general,
            &c.remove_general,
            c.replace,
        );
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

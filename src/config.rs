/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults when the file or any key is missing; a file
/// that exists but cannot be read or parsed is reported as an error and
/// the caller decides whether to carry on with defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ── Public Config Struct ──

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub viewport: ViewportConfig,
    pub general: GeneralConfig,
    pub debug: DebugConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpeedConfig {
    /// Period of the animation frame timer.
    pub frame_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewportConfig {
    pub width: i32,
    pub height: i32,
    pub margin: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneralConfig {
    /// Level file; the built-in level when `None`.
    pub level_path: Option<PathBuf>,
    /// Procedural endless world instead of a level.
    pub infinite: bool,
    pub seed: u64,
    pub log_file: PathBuf,
    pub save_path: PathBuf,
}

/// Which subsystems may log at debug level.
#[derive(Clone, Debug, PartialEq)]
pub struct DebugConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_moves: bool,
    pub log_animations: bool,
    pub log_chunks: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} parse error: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    viewport: TomlViewport,
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    debug: TomlDebug,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlViewport {
    #[serde(default = "default_width")]
    width: i32,
    #[serde(default = "default_height")]
    height: i32,
    #[serde(default = "default_margin")]
    margin: i32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    level_path: Option<String>,
    #[serde(default)]
    infinite: bool,
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_save_path")]
    save_path: String,
}

#[derive(Deserialize, Debug)]
struct TomlDebug {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_moves: bool,
    #[serde(default)]
    log_animations: bool,
    #[serde(default)]
    log_chunks: bool,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 30 }
fn default_width() -> i32 { 31 }
fn default_height() -> i32 { 17 }
fn default_margin() -> i32 { 1 }
fn default_seed() -> u64 { 0x5EED }
fn default_log_file() -> String { "jumpgrid.log".into() }
fn default_save_path() -> String { "jumpgrid-save.json".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { frame_ms: default_frame_ms() }
    }
}

impl Default for TomlViewport {
    fn default() -> Self {
        TomlViewport {
            width: default_width(),
            height: default_height(),
            margin: default_margin(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            level_path: None,
            infinite: false,
            seed: default_seed(),
            log_file: default_log_file(),
            save_path: default_save_path(),
        }
    }
}

impl Default for TomlDebug {
    fn default() -> Self {
        TomlDebug {
            log_level: default_log_level(),
            log_moves: false,
            log_animations: false,
            log_chunks: false,
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        TomlConfig::default().into_config(&[]).speed
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        TomlConfig::default().into_config(&[]).viewport
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        TomlConfig::default().into_config(&[]).general
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        TomlConfig::default().into_config(&[]).debug
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// No file at all is not an error: every key takes its default.
    pub fn load() -> Result<Self, ConfigError> {
        let search_dirs = candidate_dirs();
        for dir in &search_dirs {
            let path = dir.join("config.toml");
            if path.exists() {
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
                let toml_cfg = toml::from_str::<TomlConfig>(&text)
                    .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
                return Ok(toml_cfg.into_config(&search_dirs));
            }
        }
        Ok(TomlConfig::default().into_config(&search_dirs))
    }

    /// Parse config text directly; relative paths stay as written.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        Ok(toml::from_str::<TomlConfig>(text)?.into_config(&[]))
    }
}

impl TomlConfig {
    fn into_config(self, search_dirs: &[PathBuf]) -> GameConfig {
        GameConfig {
            speed: SpeedConfig {
                frame_ms: self.speed.frame_ms.max(1),
            },
            viewport: ViewportConfig {
                width: self.viewport.width.max(3),
                height: self.viewport.height.max(3),
                margin: self.viewport.margin.max(0),
            },
            general: GeneralConfig {
                level_path: self.general.level_path.map(|p| resolve_path(&p, search_dirs)),
                infinite: self.general.infinite,
                seed: self.general.seed,
                log_file: PathBuf::from(self.general.log_file),
                save_path: PathBuf::from(self.general.save_path),
            },
            debug: DebugConfig {
                log_level: self.debug.log_level,
                log_moves: self.debug.log_moves,
                log_animations: self.debug.log_animations,
                log_chunks: self.debug.log_chunks,
            },
        }
    }
}

/// Absolute paths as-is; relative ones are looked up in the search dirs,
/// falling back to the CWD.
fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs
        .iter()
        .map(|d| d.join(path))
        .find(|p| p.is_file())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

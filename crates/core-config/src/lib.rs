//! The engine's explicit configuration context, and optional TOML loading.
//!
//! Grounded in the source config crate's `ConfigFile`/serde pattern, trimmed
//! down to the knobs the buffer core actually consumes. Where the source
//! reads a process-wide global (`G`) for tab width, default tab type, and
//! similar, the engine takes an `EditorContext` value instead — see spec §9's
//! "Global registry" note.

use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::trace;

/// Parameters the edit engine needs but has no business owning itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorContext {
    pub tab_width: u16,
    pub default_tab_type: i32,
    pub vertical_margin: u16,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self {
            tab_width: 4,
            default_tab_type: 4,
            vertical_margin: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct BufferConfig {
    #[serde(default)]
    pub tab_width: Option<u16>,
    #[serde(default)]
    pub default_tab_type: Option<i32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScrollConfig {
    #[serde(default)]
    pub vertical_margin: Option<u16>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
}

impl ConfigFile {
    /// Fold the parsed (possibly partial) file over the built-in defaults.
    pub fn into_context(self) -> EditorContext {
        let defaults = EditorContext::default();
        EditorContext {
            tab_width: self.buffer.tab_width.unwrap_or(defaults.tab_width),
            default_tab_type: self.buffer.default_tab_type.unwrap_or(defaults.default_tab_type),
            vertical_margin: self.scroll.vertical_margin.unwrap_or(defaults.vertical_margin),
        }
    }
}

/// Best-effort config path: local `editor.toml` first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("editor.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("editor").join("editor.toml");
    }
    PathBuf::from("editor.toml")
}

/// Load `EditorContext` from `path` (or the discovered default location). A
/// missing or unparseable file falls back to defaults rather than erroring —
/// config is not part of the core's bubbling-error surface (§7).
pub fn load_from(path: Option<PathBuf>) -> EditorContext {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        trace!(target: "config", path = %path.display(), "no config file, using defaults");
        return EditorContext::default();
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => file.into_context(),
        Err(err) => {
            trace!(target: "config", path = %path.display(), %err, "config parse error, using defaults");
            EditorContext::default()
        }
    }
}

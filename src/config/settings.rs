use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // Toolbar (drag sources) side panel visibility
    #[serde(default = "AppSettings::default_true")]
    pub sidebar_open: bool,
    // Dotted background behind the canvas
    #[serde(default = "AppSettings::default_true")]
    pub show_grid: bool,
    #[serde(default = "AppSettings::default_zoom_min")]
    pub zoom_min: f32,
    #[serde(default = "AppSettings::default_zoom_max")]
    pub zoom_max: f32,
    // Mouse button that pans the canvas when dragged over empty space
    #[serde(default = "AppSettings::default_pan_button")]
    pub pan_button: PanButton,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            show_grid: true,
            zoom_min: Self::default_zoom_min(),
            zoom_max: Self::default_zoom_max(),
            pan_button: Self::default_pan_button(),
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/UML-Loom
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("UML-Loom");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\UML-Loom
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("UML-Loom");
            }
            return PathBuf::from("UML-Loom");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/UML-Loom or ~/.config/UML-Loom
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("UML-Loom");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("UML-Loom");
        }
    }

    /// Return the directory where the settings file (settings.json) is stored.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    pub fn settings_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    pub fn load() -> anyhow::Result<Self> {
        let path = Self::settings_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut f = fs::File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        Self::from_json(&s)
    }

    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join("settings.json");
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(&path)?;
        f.write_all(s.as_bytes())?;
        Ok(path)
    }

    // Parse and sanitise; swapped or non-positive zoom bounds fall back to defaults
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let mut v: Self = serde_json::from_str(s)?;
        v.normalize();
        Ok(v)
    }

    pub fn normalize(&mut self) {
        if !(self.zoom_min > 0.0 && self.zoom_min < self.zoom_max) {
            log::warn!("invalid zoom bounds {}..{}; using defaults", self.zoom_min, self.zoom_max);
            self.zoom_min = Self::default_zoom_min();
            self.zoom_max = Self::default_zoom_max();
        }
    }

    fn default_true() -> bool { true }
    pub(crate) fn default_zoom_min() -> f32 { 0.25 }
    pub(crate) fn default_zoom_max() -> f32 { 2.0 }
    pub(crate) fn default_pan_button() -> PanButton { PanButton::Secondary }
}

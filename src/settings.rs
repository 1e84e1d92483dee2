//! Flat settings store shared by every window.
//!
//! The file is a set of named sections holding string key/value pairs, kept
//! human-editable on disk. Everything is a string at the file boundary
//! (booleans are the literals `"True"`/`"False"`); code works with the typed
//! config structs below, which parse a section once at load and stringify
//! back only when saving. The roll-call widget additionally stashes its pool
//! snapshot in this store as JSON-encoded values under three fixed keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::constants::config;
use crate::pool::ALL_GROUP;

pub type Section = BTreeMap<String, String>;
pub type Sections = BTreeMap<String, Section>;

pub const LAUNCHER_SECTION: &str = "Launcher";
pub const ROLL_CALL_SECTION: &str = "RollCallTimer";
pub const PAINT_SECTION: &str = "Paint";

/// Keys inside [`ROLL_CALL_SECTION`] holding the JSON-encoded pool snapshot.
pub const KEY_GROUP_REMAINING: &str = "group_remaining";
pub const KEY_GROUP_LAST: &str = "group_last";
pub const KEY_GLOBAL_DRAWN: &str = "global_drawn";

pub fn bool_to_str(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

pub fn str_to_bool(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

pub fn get_str<'a>(section: &'a Section, key: &str, default: &'a str) -> &'a str {
    section.get(key).map_or(default, String::as_str)
}

pub fn get_bool(section: &Section, key: &str, default: bool) -> bool {
    section.get(key).map_or(default, |value| str_to_bool(value, default))
}

pub fn get_num<T: std::str::FromStr + Copy>(section: &Section, key: &str, default: T) -> T {
    section
        .get(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Window placement in the classic `WIDTHxHEIGHT+X+Y` text form used by the
/// settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl WindowGeometry {
    pub fn parse(text: &str) -> Option<Self> {
        let (size, rest) = text.split_once('+')?;
        let (width, height) = size.split_once('x')?;
        let (x, y) = rest.split_once('+')?;
        Some(Self {
            width: width.trim().parse().ok()?,
            height: height.trim().parse().ok()?,
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }

    pub fn to_text(self) -> String {
        format!("{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetMode {
    RollCall,
    Timer,
}

impl WidgetMode {
    pub fn from_key(key: &str) -> Self {
        if key == "timer" { Self::Timer } else { Self::RollCall }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::RollCall => "roll_call",
            Self::Timer => "timer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOrder {
    Rank,
    Id,
}

impl ScoreOrder {
    pub fn from_key(key: &str) -> Self {
        if key == "id" { Self::Id } else { Self::Rank }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Id => "id",
        }
    }
}

/// What to do when the selected group runs dry: wait for the user to reset,
/// or reshuffle the group on the spot and keep drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPolicy {
    Manual,
    ReshuffleOnExhaustion,
}

/// Typed view of the [`ROLL_CALL_SECTION`] settings (pool snapshot keys are
/// handled separately by the session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollCallConfig {
    pub geometry: WindowGeometry,
    pub show_id: bool,
    pub show_name: bool,
    pub current_group: String,
    pub mode: WidgetMode,
    pub scoreboard_order: ScoreOrder,
    pub draw_policy: DrawPolicy,
    pub id_font_size: u32,
    pub name_font_size: u32,
    pub timer_font_size: u32,
}

impl Default for RollCallConfig {
    fn default() -> Self {
        Self {
            geometry: WindowGeometry {
                width: 480,
                height: 280,
                x: 180,
                y: 180,
            },
            show_id: true,
            show_name: true,
            current_group: ALL_GROUP.to_string(),
            mode: WidgetMode::RollCall,
            scoreboard_order: ScoreOrder::Rank,
            draw_policy: DrawPolicy::Manual,
            id_font_size: 48,
            name_font_size: 60,
            timer_font_size: 56,
        }
    }
}

impl RollCallConfig {
    pub fn from_section(section: &Section) -> Self {
        let defaults = Self::default();
        Self {
            geometry: section
                .get("geometry")
                .and_then(|text| WindowGeometry::parse(text))
                .unwrap_or(defaults.geometry),
            show_id: get_bool(section, "show_id", defaults.show_id),
            show_name: get_bool(section, "show_name", defaults.show_name),
            current_group: get_str(section, "current_group", &defaults.current_group).to_string(),
            mode: WidgetMode::from_key(get_str(section, "mode", defaults.mode.as_key())),
            scoreboard_order: ScoreOrder::from_key(get_str(
                section,
                "scoreboard_order",
                defaults.scoreboard_order.as_key(),
            )),
            draw_policy: if get_bool(section, "auto_reshuffle", false) {
                DrawPolicy::ReshuffleOnExhaustion
            } else {
                DrawPolicy::Manual
            },
            id_font_size: get_num(section, "id_font_size", defaults.id_font_size),
            name_font_size: get_num(section, "name_font_size", defaults.name_font_size),
            timer_font_size: get_num(section, "timer_font_size", defaults.timer_font_size),
        }
    }

    pub fn apply(&self, section: &mut Section) {
        section.insert("geometry".to_string(), self.geometry.to_text());
        section.insert("show_id".to_string(), bool_to_str(self.show_id).to_string());
        section.insert("show_name".to_string(), bool_to_str(self.show_name).to_string());
        section.insert("current_group".to_string(), self.current_group.clone());
        section.insert("mode".to_string(), self.mode.as_key().to_string());
        section.insert(
            "scoreboard_order".to_string(),
            self.scoreboard_order.as_key().to_string(),
        );
        section.insert(
            "auto_reshuffle".to_string(),
            bool_to_str(self.draw_policy == DrawPolicy::ReshuffleOnExhaustion).to_string(),
        );
        section.insert("id_font_size".to_string(), self.id_font_size.to_string());
        section.insert("name_font_size".to_string(), self.name_font_size.to_string());
        section.insert("timer_font_size".to_string(), self.timer_font_size.to_string());
    }
}

/// Typed view of the [`LAUNCHER_SECTION`] settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LauncherConfig {
    pub x: i32,
    pub y: i32,
    pub minimized: bool,
    pub bubble_x: i32,
    pub bubble_y: i32,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            x: 120,
            y: 120,
            minimized: false,
            bubble_x: 120,
            bubble_y: 120,
        }
    }
}

impl LauncherConfig {
    pub fn from_section(section: &Section) -> Self {
        let defaults = Self::default();
        Self {
            x: get_num(section, "x", defaults.x),
            y: get_num(section, "y", defaults.y),
            minimized: get_bool(section, "minimized", defaults.minimized),
            bubble_x: get_num(section, "bubble_x", defaults.bubble_x),
            bubble_y: get_num(section, "bubble_y", defaults.bubble_y),
        }
    }

    pub fn apply(&self, section: &mut Section) {
        section.insert("x".to_string(), self.x.to_string());
        section.insert("y".to_string(), self.y.to_string());
        section.insert("minimized".to_string(), bool_to_str(self.minimized).to_string());
        section.insert("bubble_x".to_string(), self.bubble_x.to_string());
        section.insert("bubble_y".to_string(), self.bubble_y.to_string());
    }
}

/// Typed view of the [`PAINT_SECTION`] settings for the overlay toolbar.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintConfig {
    pub x: i32,
    pub y: i32,
    pub brush_size: f32,
    pub brush_color: String,
}

impl Default for PaintConfig {
    fn default() -> Self {
        Self {
            x: 260,
            y: 260,
            brush_size: 12.0,
            brush_color: "#ff0000".to_string(),
        }
    }
}

impl PaintConfig {
    pub fn from_section(section: &Section) -> Self {
        let defaults = Self::default();
        Self {
            x: get_num(section, "x", defaults.x),
            y: get_num(section, "y", defaults.y),
            brush_size: get_num(section, "brush_size", defaults.brush_size),
            brush_color: get_str(section, "brush_color", &defaults.brush_color).to_string(),
        }
    }

    pub fn apply(&self, section: &mut Section) {
        section.insert("x".to_string(), self.x.to_string());
        section.insert("y".to_string(), self.y.to_string());
        section.insert("brush_size".to_string(), self.brush_size.to_string());
        section.insert("brush_color".to_string(), self.brush_color.clone());
    }
}

/// Section/key/value store backed by one file in the user's config
/// directory. Reads are cached; writes replace the file atomically so a
/// crash mid-save cannot corrupt previous state.
pub struct SettingsManager {
    path: PathBuf,
    cache: Option<Sections>,
}

impl SettingsManager {
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path, cache: None }
    }

    fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::SETTINGS_FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults() -> Sections {
        let mut sections = Sections::new();
        let mut launcher = Section::new();
        LauncherConfig::default().apply(&mut launcher);
        sections.insert(LAUNCHER_SECTION.to_string(), launcher);

        let mut roll_call = Section::new();
        RollCallConfig::default().apply(&mut roll_call);
        crate::timer::TimerConfig::default().apply(&mut roll_call);
        sections.insert(ROLL_CALL_SECTION.to_string(), roll_call);

        let mut paint = Section::new();
        PaintConfig::default().apply(&mut paint);
        sections.insert(PAINT_SECTION.to_string(), paint);
        sections
    }

    /// Loads the whole store, defaults merged underneath whatever the file
    /// contains. A missing or unparseable file degrades to defaults.
    pub fn load(&mut self) -> Sections {
        if let Some(cache) = &self.cache {
            return cache.clone();
        }
        let mut sections = Self::defaults();
        if self.path.exists() {
            match fs::read_to_string(&self.path) {
                Ok(contents) => match parse_sections(&contents) {
                    Ok(parsed) => {
                        for (name, entries) in parsed {
                            sections.entry(name).or_default().extend(entries);
                        }
                    }
                    Err(error) => {
                        warn!(path = %self.path.display(), error = %error, "settings file unparseable, using defaults");
                    }
                },
                Err(error) => {
                    warn!(path = %self.path.display(), error = %error, "cannot read settings file, using defaults");
                }
            }
        }
        self.cache = Some(sections.clone());
        sections
    }

    /// Replaces the store on disk. The in-memory cache is updated even when
    /// the write fails, so the running session keeps its state.
    pub fn save(&mut self, sections: Sections) -> Result<()> {
        self.cache = Some(sections.clone());
        let rendered = toml::to_string_pretty(&sections).context("failed to render settings")?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create settings directory {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, rendered)
            .with_context(|| format!("failed to write settings to {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace settings file {}", self.path.display()))?;
        Ok(())
    }

    pub fn load_section(&mut self, name: &str) -> Section {
        self.load().remove(name).unwrap_or_default()
    }

    pub fn save_section(&mut self, name: &str, section: Section) -> Result<()> {
        let mut sections = self.load();
        sections.insert(name.to_string(), section);
        self.save(sections)
    }

    /// Forgets the persisted roll-call history. Only called on an explicit
    /// whole-roster reset.
    pub fn clear_roll_call_history(&mut self) -> Result<()> {
        let mut sections = self.load();
        let Some(section) = sections.get_mut(ROLL_CALL_SECTION) else {
            return Ok(());
        };
        let mut removed = false;
        for key in [KEY_GROUP_REMAINING, KEY_GROUP_LAST, KEY_GLOBAL_DRAWN] {
            removed |= section.remove(key).is_some();
        }
        if removed {
            info!("cleared persisted roll-call history");
            self.save(sections)?;
        }
        Ok(())
    }
}

impl Default for SettingsManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Lenient section parser: string values are taken as-is, other scalars are
/// coerced to their text form, and anything nested is skipped. A hand-edited
/// `x = 12` therefore still loads as `"12"`.
fn parse_sections(contents: &str) -> Result<Sections, toml::de::Error> {
    let value: toml::Value = toml::from_str(contents)?;
    let mut sections = Sections::new();
    if let toml::Value::Table(table) = value {
        for (name, entry) in table {
            let toml::Value::Table(entries) = entry else { continue };
            let section = sections.entry(name).or_default();
            for (key, value) in entries {
                let text = match value {
                    toml::Value::String(text) => text,
                    toml::Value::Table(_) | toml::Value::Array(_) => continue,
                    other => other.to_string(),
                };
                section.insert(key, text);
            }
        }
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> SettingsManager {
        SettingsManager::with_path(dir.path().join("settings.toml"))
    }

    #[test]
    fn test_bool_literals_round_trip() {
        assert_eq!(bool_to_str(true), "True");
        assert_eq!(bool_to_str(false), "False");
        assert!(str_to_bool("True", false));
        assert!(str_to_bool("1", false));
        assert!(!str_to_bool("False", true));
        assert!(!str_to_bool("off", true));
        // Unknown text falls back to the default.
        assert!(str_to_bool("maybe", true));
        assert!(!str_to_bool("", false));
    }

    #[test]
    fn test_geometry_text_round_trip() {
        let geometry = WindowGeometry {
            width: 480,
            height: 280,
            x: -5,
            y: 180,
        };
        let text = geometry.to_text();
        assert_eq!(text, "480x280+-5+180");
        assert_eq!(WindowGeometry::parse(&text), Some(geometry));
        assert_eq!(WindowGeometry::parse("garbage"), None);
        assert_eq!(WindowGeometry::parse("480x280"), None);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager_in(&dir);
        let section = manager.load_section(ROLL_CALL_SECTION);
        assert_eq!(get_str(&section, "mode", ""), "roll_call");
        assert_eq!(get_str(&section, "current_group", ""), "ALL");
        assert_eq!(get_bool(&section, "show_id", false), true);
    }

    #[test]
    fn test_save_and_reload_section() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager_in(&dir);
        let mut section = manager.load_section(ROLL_CALL_SECTION);
        section.insert("current_group".to_string(), "B".to_string());
        section.insert(KEY_GLOBAL_DRAWN.to_string(), "[1,2]".to_string());
        manager.save_section(ROLL_CALL_SECTION, section).unwrap();

        let mut fresh = manager_in(&dir);
        let reloaded = fresh.load_section(ROLL_CALL_SECTION);
        assert_eq!(get_str(&reloaded, "current_group", ""), "B");
        assert_eq!(get_str(&reloaded, KEY_GLOBAL_DRAWN, ""), "[1,2]");
        // Defaults for untouched keys survive alongside.
        assert_eq!(get_str(&reloaded, "mode", ""), "roll_call");
    }

    #[test]
    fn test_lenient_parse_coerces_scalars() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("settings.toml"),
            "[Launcher]\nx = 42\nminimized = true\n\n[RollCallTimer]\nshow_id = \"False\"\n",
        )
        .unwrap();
        let mut manager = manager_in(&dir);
        let launcher = manager.load_section(LAUNCHER_SECTION);
        assert_eq!(get_num(&launcher, "x", 0), 42);
        assert!(get_bool(&launcher, "minimized", false));
        let roll_call = manager.load_section(ROLL_CALL_SECTION);
        assert!(!get_bool(&roll_call, "show_id", true));
    }

    #[test]
    fn test_corrupt_file_degrades_to_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("settings.toml"), "not [valid toml").unwrap();
        let mut manager = manager_in(&dir);
        let section = manager.load_section(LAUNCHER_SECTION);
        assert_eq!(get_num(&section, "x", 0), 120);
    }

    #[test]
    fn test_clear_roll_call_history_removes_only_pool_keys() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager_in(&dir);
        let mut section = manager.load_section(ROLL_CALL_SECTION);
        section.insert(KEY_GROUP_REMAINING.to_string(), "{}".to_string());
        section.insert(KEY_GROUP_LAST.to_string(), "{}".to_string());
        section.insert(KEY_GLOBAL_DRAWN.to_string(), "[]".to_string());
        manager.save_section(ROLL_CALL_SECTION, section).unwrap();

        manager.clear_roll_call_history().unwrap();
        let section = manager.load_section(ROLL_CALL_SECTION);
        assert!(!section.contains_key(KEY_GROUP_REMAINING));
        assert!(!section.contains_key(KEY_GROUP_LAST));
        assert!(!section.contains_key(KEY_GLOBAL_DRAWN));
        assert_eq!(get_str(&section, "mode", ""), "roll_call");
    }

    #[test]
    fn test_roll_call_config_round_trip() {
        let config = RollCallConfig {
            current_group: "A".to_string(),
            mode: WidgetMode::Timer,
            draw_policy: DrawPolicy::ReshuffleOnExhaustion,
            show_name: false,
            ..RollCallConfig::default()
        };

        let mut section = Section::new();
        config.apply(&mut section);
        assert_eq!(get_str(&section, "mode", ""), "timer");
        assert_eq!(get_str(&section, "auto_reshuffle", ""), "True");
        assert_eq!(get_str(&section, "show_name", ""), "False");

        let parsed = RollCallConfig::from_section(&section);
        assert_eq!(parsed, config);
    }
}

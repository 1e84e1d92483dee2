//! Layout and timing constants for the egui windows

use egui::Color32;

pub const PADDING: f32 = 8.0;
pub const SECTION_SPACING: f32 = 10.0;
pub const ITEM_SPACING: f32 = 6.0;

pub const LAUNCHER_WIDTH: f32 = 220.0;
pub const LAUNCHER_HEIGHT: f32 = 170.0;

pub const TOOLBAR_WIDTH: f32 = 420.0;
pub const TOOLBAR_HEIGHT: f32 = 130.0;

/// Repaint cadence while the timer is running
pub const ACTIVE_REPAINT_MS: u64 = 200;
/// Repaint cadence when idle
pub const IDLE_REPAINT_MS: u64 = 500;

/// How long transient status messages stay visible, in milliseconds
pub const STATUS_DURATION_MS: u64 = 4000;

pub const STATUS_INFO: Color32 = Color32::from_rgb(0xe0, 0xa8, 0x00);
pub const FLASH_COLOR: Color32 = Color32::from_rgb(0xd8, 0x30, 0x30);

//! Application-wide constants
//!
//! Magic numbers and string literals used throughout the application,
//! providing a single source of truth for constant values.

/// Configuration file locations
pub mod config {
    /// Directory under the user's config dir holding all app files
    pub const APP_DIR: &str = "ClassroomTools";

    /// Settings store filename
    pub const SETTINGS_FILENAME: &str = "settings.toml";

    /// Student roster filename
    pub const ROSTER_FILENAME: &str = "students.csv";
}

/// Overlay drawing limits
pub mod overlay {
    /// Undo history depth; oldest snapshots are dropped beyond this
    pub const MAX_UNDO_DEPTH: usize = 50;

    /// Hit radius in points when erasing
    pub const ERASER_RADIUS: f32 = 18.0;

    /// Brush width bounds for the toolbar slider
    pub const MIN_BRUSH_WIDTH: f32 = 2.0;
    pub const MAX_BRUSH_WIDTH: f32 = 40.0;

    /// Points sampled when flattening an ellipse outline
    pub const ELLIPSE_SEGMENTS: usize = 48;

    /// Arrow head length in points, and its half-angle in radians
    pub const ARROW_HEAD_LENGTH: f32 = 18.0;
    pub const ARROW_HEAD_ANGLE: f32 = 0.5;
}

/// Timer behavior
pub mod timer {
    /// How long the finish flash stays on screen, in milliseconds
    pub const FINISH_FLASH_MS: u64 = 1800;
}

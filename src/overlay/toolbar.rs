//! Floating toolbar content for the annotation overlay.

use egui::{Color32, RichText, Ui};

use crate::constants::overlay::{MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH};

use super::{OverlayScene, ShapeKind, Tool};

/// Pen colors offered as one-click swatches.
const PEN_COLORS: [(Color32, &str); 6] = [
    (Color32::from_rgb(0xff, 0x00, 0x00), "Red"),
    (Color32::from_rgb(0xff, 0xa5, 0x00), "Orange"),
    (Color32::from_rgb(0x00, 0xb0, 0x50), "Green"),
    (Color32::from_rgb(0x00, 0x70, 0xc0), "Blue"),
    (Color32::from_rgb(0xff, 0xff, 0xff), "White"),
    (Color32::from_rgb(0x00, 0x00, 0x00), "Black"),
];

const BOARD_WHITE: Color32 = Color32::from_rgb(0xf5, 0xf5, 0xf0);
const BOARD_GREEN: Color32 = Color32::from_rgb(0x2e, 0x5c, 0x3e);

/// Requests the toolbar cannot satisfy on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    CloseOverlay,
}

/// Renders the toolbar body and applies tool changes straight to the scene.
pub fn toolbar_ui(ui: &mut Ui, scene: &mut OverlayScene) -> Option<ToolbarAction> {
    let mut action = None;

    ui.horizontal_wrapped(|ui| {
        tool_button(ui, scene, Tool::Brush, "\u{270F} Pen");
        tool_button(ui, scene, Tool::Shape(ShapeKind::Line), "\u{2215} Line");
        tool_button(ui, scene, Tool::Shape(ShapeKind::Arrow), "\u{2192} Arrow");
        tool_button(ui, scene, Tool::Shape(ShapeKind::Rect), "\u{25AD} Rect");
        tool_button(ui, scene, Tool::Shape(ShapeKind::Ellipse), "\u{25EF} Ellipse");
        tool_button(ui, scene, Tool::Eraser, "\u{232B} Erase");
        tool_button(ui, scene, Tool::Cursor, "\u{2196} Cursor");
    });

    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Width");
        ui.add(
            egui::Slider::new(&mut scene.brush_width, MIN_BRUSH_WIDTH..=MAX_BRUSH_WIDTH)
                .show_value(false),
        );
        for (color, name) in PEN_COLORS {
            let selected = scene.brush_color == color;
            let swatch = egui::Button::new(" ").fill(color).selected(selected);
            if ui.add(swatch).on_hover_text(name).clicked() {
                scene.brush_color = color;
                if scene.tool == Tool::Eraser || scene.tool == Tool::Cursor {
                    scene.tool = Tool::Brush;
                }
            }
        }
    });

    ui.separator();

    ui.horizontal(|ui| {
        if ui
            .add_enabled(scene.can_undo(), egui::Button::new("Undo"))
            .clicked()
        {
            scene.undo();
        }
        if ui.button("Clear").clicked() {
            scene.clear_all();
        }
        let on_white = scene.whiteboard == Some(BOARD_WHITE);
        if ui.selectable_label(on_white, "Whiteboard").clicked() {
            scene.whiteboard = if on_white { None } else { Some(BOARD_WHITE) };
        }
        let on_green = scene.whiteboard == Some(BOARD_GREEN);
        if ui.selectable_label(on_green, "Blackboard").clicked() {
            scene.whiteboard = if on_green { None } else { Some(BOARD_GREEN) };
        }
        if ui
            .button(RichText::new("Exit").color(Color32::LIGHT_RED))
            .clicked()
        {
            action = Some(ToolbarAction::CloseOverlay);
        }
    });

    action
}

fn tool_button(ui: &mut Ui, scene: &mut OverlayScene, tool: Tool, label: &str) {
    if ui.selectable_label(scene.tool == tool, label).clicked() {
        scene.tool = tool;
    }
}

//! Transparent annotation canvas.
//!
//! Holds the ink on screen as a list of committed items (freehand strokes
//! and shape primitives) plus one in-progress item while the pointer is
//! down. The model is plain data so the interaction rules are testable
//! without a window; painting is a straight walk over the items.

mod toolbar;

pub use toolbar::{ToolbarAction, toolbar_ui};

use egui::{Color32, Painter, Pos2, Stroke, Vec2};

use crate::constants::overlay::{
    ARROW_HEAD_ANGLE, ARROW_HEAD_LENGTH, ELLIPSE_SEGMENTS, ERASER_RADIUS, MAX_UNDO_DEPTH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Line,
    Rect,
    Ellipse,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Brush,
    Shape(ShapeKind),
    Eraser,
    /// Clicks pass through to whatever is underneath the overlay.
    Cursor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrushStroke {
    pub points: Vec<Pos2>,
    pub width: f32,
    pub color: Color32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeItem {
    pub kind: ShapeKind,
    pub start: Pos2,
    pub end: Pos2,
    pub width: f32,
    pub color: Color32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    Brush(BrushStroke),
    Shape(ShapeItem),
}

#[derive(Debug, Clone)]
enum ActiveDraw {
    Brush(BrushStroke),
    Shape {
        kind: ShapeKind,
        start: Pos2,
        current: Pos2,
    },
}

/// Everything currently inked onto the screen, plus tool state.
pub struct OverlayScene {
    items: Vec<SceneItem>,
    undo_stack: Vec<Vec<SceneItem>>,
    active: Option<ActiveDraw>,
    /// Items as they were when the pointer went down; becomes an undo entry
    /// if the gesture actually changed something.
    gesture_start: Option<Vec<SceneItem>>,
    pub tool: Tool,
    pub brush_width: f32,
    pub brush_color: Color32,
    /// Opaque backdrop color while whiteboard mode is on.
    pub whiteboard: Option<Color32>,
}

impl OverlayScene {
    pub fn new(brush_width: f32, brush_color: Color32) -> Self {
        Self {
            items: Vec::new(),
            undo_stack: Vec::new(),
            active: None,
            gesture_start: None,
            tool: Tool::Brush,
            brush_width,
            brush_color,
            whiteboard: None,
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Cursor mode lets input fall through to the desktop below.
    pub fn is_pass_through(&self) -> bool {
        self.tool == Tool::Cursor
    }

    pub fn pointer_pressed(&mut self, pos: Pos2) {
        self.gesture_start = Some(self.items.clone());
        match self.tool {
            Tool::Brush => {
                self.active = Some(ActiveDraw::Brush(BrushStroke {
                    points: vec![pos],
                    width: self.brush_width,
                    color: self.brush_color,
                }));
            }
            Tool::Shape(kind) => {
                self.active = Some(ActiveDraw::Shape {
                    kind,
                    start: pos,
                    current: pos,
                });
            }
            Tool::Eraser => self.erase_at(pos),
            Tool::Cursor => {
                self.gesture_start = None;
            }
        }
    }

    pub fn pointer_moved(&mut self, pos: Pos2) {
        match &mut self.active {
            Some(ActiveDraw::Brush(stroke)) => {
                if stroke
                    .points
                    .last()
                    .is_none_or(|last| last.distance(pos) > 0.5)
                {
                    stroke.points.push(pos);
                }
            }
            Some(ActiveDraw::Shape { current, .. }) => *current = pos,
            None => {
                if self.tool == Tool::Eraser && self.gesture_start.is_some() {
                    self.erase_at(pos);
                }
            }
        }
    }

    pub fn pointer_released(&mut self, pos: Pos2) {
        match self.active.take() {
            Some(ActiveDraw::Brush(mut stroke)) => {
                if stroke
                    .points
                    .last()
                    .is_none_or(|last| last.distance(pos) > 0.5)
                {
                    stroke.points.push(pos);
                }
                self.items.push(SceneItem::Brush(stroke));
            }
            Some(ActiveDraw::Shape {
                kind,
                start,
                current: _,
            }) => {
                if start.distance(pos) > 1.0 {
                    self.items.push(SceneItem::Shape(ShapeItem {
                        kind,
                        start,
                        end: pos,
                        width: self.brush_width,
                        color: self.brush_color,
                    }));
                }
            }
            None => {}
        }
        self.finish_gesture();
    }

    /// Pushes the pre-gesture state onto the undo stack when the gesture
    /// changed anything.
    fn finish_gesture(&mut self) {
        if let Some(before) = self.gesture_start.take() {
            if before != self.items {
                if self.undo_stack.len() >= MAX_UNDO_DEPTH {
                    self.undo_stack.remove(0);
                }
                self.undo_stack.push(before);
            }
        }
    }

    fn erase_at(&mut self, pos: Pos2) {
        self.items.retain(|item| !item_hit(item, pos, ERASER_RADIUS));
    }

    pub fn undo(&mut self) {
        if let Some(previous) = self.undo_stack.pop() {
            self.items = previous;
            self.active = None;
            self.gesture_start = None;
        }
    }

    pub fn clear_all(&mut self) {
        if self.items.is_empty() {
            return;
        }
        if self.undo_stack.len() >= MAX_UNDO_DEPTH {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(std::mem::take(&mut self.items));
        self.active = None;
        self.gesture_start = None;
    }

    pub fn toggle_whiteboard(&mut self, color: Color32) {
        self.whiteboard = match self.whiteboard {
            Some(_) => None,
            None => Some(color),
        };
    }

    pub fn paint(&self, painter: &Painter) {
        for item in &self.items {
            paint_item(painter, item);
        }
        match &self.active {
            Some(ActiveDraw::Brush(stroke)) => {
                paint_item(painter, &SceneItem::Brush(stroke.clone()));
            }
            Some(ActiveDraw::Shape {
                kind,
                start,
                current,
            }) => {
                paint_item(
                    painter,
                    &SceneItem::Shape(ShapeItem {
                        kind: *kind,
                        start: *start,
                        end: *current,
                        width: self.brush_width,
                        color: self.brush_color,
                    }),
                );
            }
            None => {}
        }
    }
}

fn paint_item(painter: &Painter, item: &SceneItem) {
    match item {
        SceneItem::Brush(stroke) => {
            if stroke.points.len() < 2 {
                if let Some(point) = stroke.points.first() {
                    painter.circle_filled(*point, stroke.width / 2.0, stroke.color);
                }
            } else {
                painter.add(egui::Shape::line(
                    stroke.points.clone(),
                    Stroke::new(stroke.width, stroke.color),
                ));
            }
        }
        SceneItem::Shape(shape) => {
            let stroke = Stroke::new(shape.width, shape.color);
            match shape.kind {
                ShapeKind::Line => {
                    painter.line_segment([shape.start, shape.end], stroke);
                }
                ShapeKind::Arrow => {
                    painter.line_segment([shape.start, shape.end], stroke);
                    for head in arrow_head(shape.start, shape.end) {
                        painter.line_segment([shape.end, head], stroke);
                    }
                }
                ShapeKind::Rect | ShapeKind::Ellipse => {
                    painter.add(egui::Shape::closed_line(shape_outline(shape), stroke));
                }
            }
        }
    }
}

/// Closed outline points for rectangle and ellipse shapes.
fn shape_outline(shape: &ShapeItem) -> Vec<Pos2> {
    match shape.kind {
        ShapeKind::Rect => vec![
            shape.start,
            Pos2::new(shape.end.x, shape.start.y),
            shape.end,
            Pos2::new(shape.start.x, shape.end.y),
        ],
        ShapeKind::Ellipse => {
            let center = Pos2::new(
                (shape.start.x + shape.end.x) / 2.0,
                (shape.start.y + shape.end.y) / 2.0,
            );
            let radius = Vec2::new(
                (shape.end.x - shape.start.x).abs() / 2.0,
                (shape.end.y - shape.start.y).abs() / 2.0,
            );
            (0..ELLIPSE_SEGMENTS)
                .map(|segment| {
                    let angle =
                        segment as f32 / ELLIPSE_SEGMENTS as f32 * std::f32::consts::TAU;
                    Pos2::new(
                        center.x + radius.x * angle.cos(),
                        center.y + radius.y * angle.sin(),
                    )
                })
                .collect()
        }
        ShapeKind::Line | ShapeKind::Arrow => vec![shape.start, shape.end],
    }
}

fn arrow_head(start: Pos2, end: Pos2) -> Vec<Pos2> {
    let shaft = end - start;
    if shaft.length() < 1.0 {
        return Vec::new();
    }
    let angle = shaft.y.atan2(shaft.x);
    [angle + ARROW_HEAD_ANGLE, angle - ARROW_HEAD_ANGLE]
        .into_iter()
        .map(|theta| {
            Pos2::new(
                end.x - ARROW_HEAD_LENGTH * theta.cos(),
                end.y - ARROW_HEAD_LENGTH * theta.sin(),
            )
        })
        .collect()
}

fn item_hit(item: &SceneItem, pos: Pos2, radius: f32) -> bool {
    match item {
        SceneItem::Brush(stroke) => stroke
            .points
            .iter()
            .any(|point| point.distance(pos) <= radius),
        SceneItem::Shape(shape) => {
            let outline = shape_outline(shape);
            outline.iter().any(|point| point.distance(pos) <= radius)
                || segment_near(&outline, shape.kind, pos, radius)
        }
    }
}

/// Distance check against each outline edge, not only its vertices.
fn segment_near(outline: &[Pos2], kind: ShapeKind, pos: Pos2, radius: f32) -> bool {
    let closed = matches!(kind, ShapeKind::Rect | ShapeKind::Ellipse);
    let pairs = outline.windows(2).map(|pair| (pair[0], pair[1]));
    let wrap = if closed && outline.len() > 2 {
        Some((outline[outline.len() - 1], outline[0]))
    } else {
        None
    };
    pairs
        .chain(wrap)
        .any(|(a, b)| point_segment_distance(pos, a, b) <= radius)
}

fn point_segment_distance(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let length_squared = ab.length_sq();
    if length_squared == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> OverlayScene {
        OverlayScene::new(6.0, Color32::RED)
    }

    #[test]
    fn test_brush_stroke_commits_on_release() {
        let mut scene = scene();
        scene.pointer_pressed(Pos2::new(10.0, 10.0));
        scene.pointer_moved(Pos2::new(20.0, 10.0));
        scene.pointer_moved(Pos2::new(30.0, 10.0));
        assert_eq!(scene.item_count(), 0);
        scene.pointer_released(Pos2::new(40.0, 10.0));
        assert_eq!(scene.item_count(), 1);
        assert!(scene.can_undo());
        let SceneItem::Brush(stroke) = &scene.items[0] else {
            panic!("expected a brush stroke");
        };
        assert_eq!(stroke.points.len(), 4);
    }

    #[test]
    fn test_undo_restores_previous_items() {
        let mut scene = scene();
        scene.pointer_pressed(Pos2::new(0.0, 0.0));
        scene.pointer_released(Pos2::new(10.0, 0.0));
        scene.pointer_pressed(Pos2::new(50.0, 50.0));
        scene.pointer_released(Pos2::new(60.0, 50.0));
        assert_eq!(scene.item_count(), 2);
        scene.undo();
        assert_eq!(scene.item_count(), 1);
        scene.undo();
        assert_eq!(scene.item_count(), 0);
        assert!(!scene.can_undo());
    }

    #[test]
    fn test_shape_commits_and_ignores_zero_size() {
        let mut scene = scene();
        scene.tool = Tool::Shape(ShapeKind::Rect);
        scene.pointer_pressed(Pos2::new(5.0, 5.0));
        scene.pointer_moved(Pos2::new(40.0, 30.0));
        scene.pointer_released(Pos2::new(40.0, 30.0));
        assert_eq!(scene.item_count(), 1);

        // A click without movement draws nothing and leaves no undo entry.
        scene.pointer_pressed(Pos2::new(80.0, 80.0));
        scene.pointer_released(Pos2::new(80.0, 80.0));
        assert_eq!(scene.item_count(), 1);
        assert_eq!(scene.undo_stack.len(), 1);
    }

    #[test]
    fn test_eraser_removes_nearby_stroke() {
        let mut scene = scene();
        scene.pointer_pressed(Pos2::new(10.0, 10.0));
        scene.pointer_released(Pos2::new(20.0, 10.0));
        assert_eq!(scene.item_count(), 1);

        scene.tool = Tool::Eraser;
        scene.pointer_pressed(Pos2::new(12.0, 12.0));
        scene.pointer_released(Pos2::new(12.0, 12.0));
        assert_eq!(scene.item_count(), 0);
        // The erase gesture is undoable.
        scene.undo();
        assert_eq!(scene.item_count(), 1);
    }

    #[test]
    fn test_eraser_misses_leave_items_and_undo_alone() {
        let mut scene = scene();
        scene.pointer_pressed(Pos2::new(10.0, 10.0));
        scene.pointer_released(Pos2::new(20.0, 10.0));

        scene.tool = Tool::Eraser;
        scene.pointer_pressed(Pos2::new(500.0, 500.0));
        scene.pointer_released(Pos2::new(500.0, 500.0));
        assert_eq!(scene.item_count(), 1);
        assert_eq!(scene.undo_stack.len(), 1);
    }

    #[test]
    fn test_eraser_hits_shape_edge_not_just_corners() {
        let mut scene = scene();
        scene.tool = Tool::Shape(ShapeKind::Rect);
        scene.pointer_pressed(Pos2::new(0.0, 0.0));
        scene.pointer_moved(Pos2::new(100.0, 100.0));
        scene.pointer_released(Pos2::new(100.0, 100.0));

        scene.tool = Tool::Eraser;
        // Midpoint of the top edge, far from every corner.
        scene.pointer_pressed(Pos2::new(50.0, 2.0));
        scene.pointer_released(Pos2::new(50.0, 2.0));
        assert_eq!(scene.item_count(), 0);
    }

    #[test]
    fn test_clear_all_is_undoable() {
        let mut scene = scene();
        scene.pointer_pressed(Pos2::new(0.0, 0.0));
        scene.pointer_released(Pos2::new(10.0, 0.0));
        scene.clear_all();
        assert_eq!(scene.item_count(), 0);
        scene.undo();
        assert_eq!(scene.item_count(), 1);
        // Clearing an empty scene is a no-op.
        let depth = scene.undo_stack.len();
        scene.undo();
        scene.clear_all();
        assert_eq!(scene.undo_stack.len(), depth.saturating_sub(1));
    }

    #[test]
    fn test_undo_depth_is_bounded() {
        let mut scene = scene();
        for step in 0..(MAX_UNDO_DEPTH + 10) {
            let x = step as f32;
            scene.pointer_pressed(Pos2::new(x, 0.0));
            scene.pointer_released(Pos2::new(x + 5.0, 0.0));
        }
        assert_eq!(scene.undo_stack.len(), MAX_UNDO_DEPTH);
    }

    #[test]
    fn test_cursor_mode_draws_nothing() {
        let mut scene = scene();
        scene.tool = Tool::Cursor;
        assert!(scene.is_pass_through());
        scene.pointer_pressed(Pos2::new(10.0, 10.0));
        scene.pointer_moved(Pos2::new(20.0, 20.0));
        scene.pointer_released(Pos2::new(20.0, 20.0));
        assert_eq!(scene.item_count(), 0);
        assert!(!scene.can_undo());
    }

    #[test]
    fn test_whiteboard_toggles() {
        let mut scene = scene();
        assert_eq!(scene.whiteboard, None);
        scene.toggle_whiteboard(Color32::WHITE);
        assert_eq!(scene.whiteboard, Some(Color32::WHITE));
        scene.toggle_whiteboard(Color32::WHITE);
        assert_eq!(scene.whiteboard, None);
    }
}

//! Application shell: launcher window plus the roll-call and overlay
//! viewports, all driven from one eframe app.

use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tracing::{info, warn};

use crate::color::{parse_hex_color, to_hex_string};
use crate::constants::timer::FINISH_FLASH_MS;
use crate::gui::constants::*;
use crate::gui::roll_call::{self, PanelState, WidgetEvent};
use crate::overlay::{OverlayScene, ToolbarAction, toolbar_ui};
use crate::roster::{RosterStore, Student};
use crate::session::RollCallSession;
use crate::settings::{
    LAUNCHER_SECTION, LauncherConfig, PAINT_SECTION, PaintConfig, ROLL_CALL_SECTION,
    RollCallConfig, SettingsManager, WindowGeometry,
};
use crate::timer::{TimerConfig, TimerState};

pub struct ClassroomApp {
    settings: SettingsManager,
    roster_store: RosterStore,
    launcher: LauncherConfig,
    paint: PaintConfig,
    session: RollCallSession,
    timer: TimerState,
    scene: OverlayScene,
    panel: PanelState,
    widget_open: bool,
    overlay_open: bool,
    overlay_passthrough: bool,
    /// Placement applied when the widget viewport opens. Kept separate from
    /// the live config so builder diffing never fights a user drag.
    widget_spawn_geometry: WindowGeometry,
    toolbar_spawn_pos: (f32, f32),
    last_pointer: egui::Pos2,
    last_tick: Instant,
    startup_notice: Option<String>,
}

impl ClassroomApp {
    fn new(
        _cc: &CreationContext<'_>,
        mut settings: SettingsManager,
        roster_store: RosterStore,
        students: Vec<Student>,
        startup_notice: Option<String>,
    ) -> Self {
        let launcher = LauncherConfig::from_section(&settings.load_section(LAUNCHER_SECTION));
        let paint = PaintConfig::from_section(&settings.load_section(PAINT_SECTION));
        let roll_call_section = settings.load_section(ROLL_CALL_SECTION);

        let config = RollCallConfig::from_section(&roll_call_section);
        let mut session = RollCallSession::new(students, config);
        session.restore_from(&roll_call_section);
        let timer = TimerState::from_config(TimerConfig::from_section(&roll_call_section));

        let brush_color = parse_hex_color(&paint.brush_color).unwrap_or(egui::Color32::RED);
        let scene = OverlayScene::new(paint.brush_size, brush_color);

        info!(
            groups = session.groups().len(),
            students = session.students().len(),
            "classroom session ready"
        );

        let widget_spawn_geometry = session.config.geometry;
        let toolbar_spawn_pos = (paint.x as f32, paint.y as f32);

        Self {
            settings,
            roster_store,
            launcher,
            paint,
            session,
            timer,
            scene,
            panel: PanelState::new(),
            widget_open: true,
            overlay_open: false,
            overlay_passthrough: false,
            widget_spawn_geometry,
            toolbar_spawn_pos,
            last_pointer: egui::Pos2::ZERO,
            last_tick: Instant::now(),
            startup_notice,
        }
    }

    /// Writes the full roll-call section: widget config, timer keys, and the
    /// JSON pool snapshot. Called at every point the user could plausibly
    /// quit, so a crash loses at most the in-flight draw.
    fn save_widget_state(&mut self) {
        let mut section = self.settings.load_section(ROLL_CALL_SECTION);
        self.session.write_state(&mut section);
        self.timer.to_config().apply(&mut section);
        if let Err(err) = self.settings.save_section(ROLL_CALL_SECTION, section) {
            warn!(error = ?err, "failed to save roll-call state");
        }
    }

    fn save_launcher_state(&mut self) {
        let mut section = self.settings.load_section(LAUNCHER_SECTION);
        self.launcher.apply(&mut section);
        if let Err(err) = self.settings.save_section(LAUNCHER_SECTION, section) {
            warn!(error = ?err, "failed to save launcher state");
        }
    }

    fn save_paint_state(&mut self) {
        self.paint.brush_size = self.scene.brush_width;
        self.paint.brush_color = to_hex_string(self.scene.brush_color);
        let mut section = self.settings.load_section(PAINT_SECTION);
        self.paint.apply(&mut section);
        if let Err(err) = self.settings.save_section(PAINT_SECTION, section) {
            warn!(error = ?err, "failed to save overlay toolbar state");
        }
    }

    fn save_scores(&mut self) {
        if let Err(err) = self.roster_store.save_scores(self.session.students()) {
            warn!(error = %err, "failed to write scores back to the roster");
        }
    }

    fn handle_widget_events(&mut self, events: Vec<WidgetEvent>) {
        for event in events {
            match event {
                WidgetEvent::Persist => self.save_widget_state(),
                WidgetEvent::ClearHistory => {
                    if let Err(err) = self.settings.clear_roll_call_history() {
                        warn!(error = ?err, "failed to clear persisted roll-call history");
                    }
                }
                WidgetEvent::PersistScores => self.save_scores(),
                WidgetEvent::Hide => {
                    self.widget_open = false;
                    self.save_widget_state();
                }
            }
        }
    }

    /// Advances the 1 Hz timer clock by however many whole seconds passed
    /// since the last frame.
    fn advance_timer(&mut self) {
        let elapsed = self.last_tick.elapsed();
        let steps = elapsed.as_secs();
        if steps == 0 {
            return;
        }
        self.last_tick += Duration::from_secs(steps);
        let mut finished = false;
        for _ in 0..steps {
            finished |= self.timer.tick();
        }
        if finished {
            self.panel.flash_until =
                Some(Instant::now() + Duration::from_millis(FINISH_FLASH_MS));
            self.save_widget_state();
        }
    }

    fn launcher_ui(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.add_space(PADDING);
        ui.heading("ClassroomTools");
        ui.add_space(SECTION_SPACING);

        if let Some(notice) = self.startup_notice.clone() {
            ui.group(|ui| {
                ui.colored_label(STATUS_INFO, notice);
                if ui.small_button("Dismiss").clicked() {
                    self.startup_notice = None;
                }
            });
            ui.add_space(ITEM_SPACING);
        }

        let annotate_label = if self.overlay_open {
            "\u{1F58C} Stop annotating"
        } else {
            "\u{1F58C} Annotate screen"
        };
        if ui.button(annotate_label).clicked() {
            self.overlay_open = !self.overlay_open;
            if self.overlay_open {
                self.toolbar_spawn_pos = (self.paint.x as f32, self.paint.y as f32);
            } else {
                self.save_paint_state();
            }
        }
        ui.add_space(ITEM_SPACING);

        let widget_label = if self.widget_open {
            "\u{1F4E2} Hide roll call"
        } else {
            "\u{1F4E2} Roll call / timer"
        };
        if ui.button(widget_label).clicked() {
            self.widget_open = !self.widget_open;
            if self.widget_open {
                self.widget_spawn_geometry = self.session.config.geometry;
            } else {
                self.save_widget_state();
            }
        }
        ui.add_space(SECTION_SPACING);
        ui.separator();

        if ui.button("Quit").clicked() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        // Track launcher placement for the next start.
        if let Some(rect) = ctx.input(|i| i.viewport().outer_rect) {
            self.launcher.x = rect.min.x as i32;
            self.launcher.y = rect.min.y as i32;
        }
    }

    fn roll_call_viewport(&mut self, ctx: &egui::Context) {
        let geometry = self.widget_spawn_geometry;
        let builder = egui::ViewportBuilder::default()
            .with_title("Roll Call")
            .with_inner_size([geometry.width as f32, geometry.height as f32])
            .with_position([geometry.x as f32, geometry.y as f32])
            .with_always_on_top();

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("roll_call_widget"),
            builder,
            |ctx, _class| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    let events =
                        roll_call::ui(ui, &mut self.session, &mut self.timer, &mut self.panel);
                    self.handle_widget_events(events);
                });

                // Remember where the user parked the window.
                let (outer, inner) = ctx.input(|i| {
                    let viewport = i.viewport();
                    (viewport.outer_rect, viewport.inner_rect)
                });
                if let Some(rect) = outer {
                    self.session.config.geometry.x = rect.min.x as i32;
                    self.session.config.geometry.y = rect.min.y as i32;
                }
                if let Some(rect) = inner {
                    self.session.config.geometry = WindowGeometry {
                        width: rect.width() as u32,
                        height: rect.height() as u32,
                        ..self.session.config.geometry
                    };
                }

                if ctx.input(|i| i.viewport().close_requested()) {
                    self.widget_open = false;
                    self.save_widget_state();
                }
            },
        );
    }

    fn overlay_viewport(&mut self, ctx: &egui::Context) {
        let builder = egui::ViewportBuilder::default()
            .with_title("Annotation Overlay")
            .with_transparent(true)
            .with_decorations(false)
            .with_maximized(true)
            .with_always_on_top()
            .with_mouse_passthrough(self.overlay_passthrough);

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("annotation_overlay"),
            builder,
            |ctx, _class| {
                let fill = self
                    .scene
                    .whiteboard
                    .unwrap_or(egui::Color32::TRANSPARENT);
                egui::CentralPanel::default()
                    .frame(egui::Frame::NONE.fill(fill))
                    .show(ctx, |ui| {
                        let (response, painter) = ui.allocate_painter(
                            ui.available_size(),
                            egui::Sense::click_and_drag(),
                        );
                        if let Some(pos) = response.interact_pointer_pos() {
                            self.last_pointer = pos;
                        }
                        if response.drag_started() {
                            self.scene.pointer_pressed(self.last_pointer);
                        } else if response.dragged() {
                            self.scene.pointer_moved(self.last_pointer);
                        }
                        if response.drag_stopped() {
                            self.scene.pointer_released(self.last_pointer);
                        } else if response.clicked() {
                            self.scene.pointer_pressed(self.last_pointer);
                            self.scene.pointer_released(self.last_pointer);
                        }
                        self.scene.paint(&painter);
                    });

                // Cursor mode lets clicks reach whatever is underneath; the
                // toolbar lives in its own window and stays clickable.
                let pass_through = self.scene.is_pass_through();
                if pass_through != self.overlay_passthrough {
                    ctx.send_viewport_cmd(egui::ViewportCommand::MousePassthrough(pass_through));
                    self.overlay_passthrough = pass_through;
                }
            },
        );
    }

    fn toolbar_viewport(&mut self, ctx: &egui::Context) {
        let builder = egui::ViewportBuilder::default()
            .with_title("Overlay Tools")
            .with_inner_size([TOOLBAR_WIDTH, TOOLBAR_HEIGHT])
            .with_position([self.toolbar_spawn_pos.0, self.toolbar_spawn_pos.1])
            .with_decorations(false)
            .with_always_on_top();

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("overlay_toolbar"),
            builder,
            |ctx, _class| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    let grip = ui.add(
                        egui::Label::new(egui::RichText::new("\u{2630} Overlay tools").strong())
                            .sense(egui::Sense::drag()),
                    );
                    if grip.drag_started() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
                    }
                    ui.separator();
                    if let Some(ToolbarAction::CloseOverlay) = toolbar_ui(ui, &mut self.scene) {
                        self.overlay_open = false;
                        self.save_paint_state();
                    }
                });

                if let Some(rect) = ctx.input(|i| i.viewport().outer_rect) {
                    self.paint.x = rect.min.x as i32;
                    self.paint.y = rect.min.y as i32;
                }
            },
        );
    }
}

impl eframe::App for ClassroomApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.advance_timer();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.launcher_ui(ctx, ui);
        });

        if self.widget_open {
            self.roll_call_viewport(ctx);
        }
        if self.overlay_open {
            self.overlay_viewport(ctx);
            self.toolbar_viewport(ctx);
        }

        let cadence = if self.timer.running {
            ACTIVE_REPAINT_MS
        } else {
            IDLE_REPAINT_MS
        };
        ctx.request_repaint_after(Duration::from_millis(cadence));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_widget_state();
        self.save_launcher_state();
        self.save_paint_state();
        info!("classroom tools exiting");
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // The overlay viewport needs a transparent clear to see the desktop.
        [0.0, 0.0, 0.0, 0.0]
    }
}

pub fn run_app(
    mut settings: SettingsManager,
    roster_store: RosterStore,
    students: Vec<Student>,
    startup_notice: Option<String>,
) -> Result<()> {
    let launcher = LauncherConfig::from_section(&settings.load_section(LAUNCHER_SECTION));
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("ClassroomTools")
            .with_inner_size([LAUNCHER_WIDTH, LAUNCHER_HEIGHT])
            .with_position([launcher.x as f32, launcher.y as f32])
            .with_always_on_top(),
        ..Default::default()
    };

    eframe::run_native(
        "ClassroomTools",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ClassroomApp::new(
                cc,
                settings,
                roster_store,
                students,
                startup_notice,
            )))
        }),
    )
    .map_err(|err| anyhow!("failed to launch classroom tools: {err}"))
}

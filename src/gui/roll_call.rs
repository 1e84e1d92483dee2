//! Roll-call/timer widget body.
//!
//! Renders the group picker, the big id/name display, the draw and reset
//! buttons, and the timer face. All state changes go through the session or
//! timer; anything that needs to reach the settings file or the roster is
//! reported back as a [`WidgetEvent`] for the app shell to act on.

use std::time::{Duration, Instant};

use egui::{RichText, Ui};

use crate::gui::constants::{FLASH_COLOR, ITEM_SPACING, SECTION_SPACING, STATUS_DURATION_MS, STATUS_INFO};
use crate::roster::StudentId;
use crate::session::{DrawFeedback, RollCallSession};
use crate::settings::{DrawPolicy, ScoreOrder, WidgetMode};
use crate::timer::TimerState;

/// Side effects the app shell must perform after the UI pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Widget or pool state changed; save the roll-call section.
    Persist,
    /// The whole-roster history was discarded; drop the persisted keys too.
    ClearHistory,
    /// A score changed; write the roster file back.
    PersistScores,
    /// The user asked to hide the widget window.
    Hide,
}

/// Transient per-window UI state that does not belong in the settings file.
pub struct PanelState {
    pub scoreboard_open: bool,
    pub picker_open: bool,
    pub status: Option<(String, Instant)>,
    pub flash_until: Option<Instant>,
}

impl PanelState {
    pub fn new() -> Self {
        Self {
            scoreboard_open: false,
            picker_open: false,
            status: None,
            flash_until: None,
        }
    }

    pub fn show_status(&mut self, message: String) {
        self.status = Some((
            message,
            Instant::now() + Duration::from_millis(STATUS_DURATION_MS),
        ));
    }
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn ui(
    ui: &mut Ui,
    session: &mut RollCallSession,
    timer: &mut TimerState,
    panel: &mut PanelState,
) -> Vec<WidgetEvent> {
    let mut events = Vec::new();

    header_row(ui, session, panel, &mut events);
    ui.separator();
    ui.add_space(ITEM_SPACING);

    match session.config.mode {
        WidgetMode::RollCall => roll_call_body(ui, session, panel, &mut events),
        WidgetMode::Timer => timer_body(ui, session, timer, panel, &mut events),
    }

    status_line(ui, panel);
    scoreboard_window(ui, session, panel, &mut events);
    picker_window(ui, session, panel, &mut events);

    events
}

fn header_row(
    ui: &mut Ui,
    session: &mut RollCallSession,
    panel: &mut PanelState,
    events: &mut Vec<WidgetEvent>,
) {
    ui.horizontal(|ui| {
        ui.label("Group");
        let mut selected = session.current_group().to_string();
        let before = selected.clone();
        egui::ComboBox::from_id_salt("group_select")
            .selected_text(selected.clone())
            .show_ui(ui, |ui| {
                for group in session.groups() {
                    ui.selectable_value(&mut selected, group.clone(), group);
                }
            });
        if selected != before {
            session.select_group(&selected);
            events.push(WidgetEvent::Persist);
        }

        let mode_label = match session.config.mode {
            WidgetMode::RollCall => "\u{23F1} Timer",
            WidgetMode::Timer => "\u{1F4E2} Roll call",
        };
        if ui.button(mode_label).clicked() {
            session.config.mode = match session.config.mode {
                WidgetMode::RollCall => WidgetMode::Timer,
                WidgetMode::Timer => WidgetMode::RollCall,
            };
            events.push(WidgetEvent::Persist);
        }

        ui.menu_button("\u{2630}", |ui| {
            if ui.checkbox(&mut session.config.show_id, "Show id").changed() {
                events.push(WidgetEvent::Persist);
            }
            if ui
                .checkbox(&mut session.config.show_name, "Show name")
                .changed()
            {
                events.push(WidgetEvent::Persist);
            }
            let mut auto = session.config.draw_policy == DrawPolicy::ReshuffleOnExhaustion;
            if ui
                .checkbox(&mut auto, "Reshuffle when a group runs out")
                .changed()
            {
                session.config.draw_policy = if auto {
                    DrawPolicy::ReshuffleOnExhaustion
                } else {
                    DrawPolicy::Manual
                };
                events.push(WidgetEvent::Persist);
            }
            ui.separator();
            if ui.button("Scoreboard").clicked() {
                panel.scoreboard_open = true;
                ui.close();
            }
            if ui.button("Pick a student").clicked() {
                panel.picker_open = true;
                ui.close();
            }
            ui.separator();
            if ui.button("Hide window").clicked() {
                events.push(WidgetEvent::Hide);
                ui.close();
            }
        });
    });
}

fn roll_call_body(
    ui: &mut Ui,
    session: &mut RollCallSession,
    panel: &mut PanelState,
    events: &mut Vec<WidgetEvent>,
) {
    let (id_text, name_text) = match session.current_student() {
        Some(student) => (student.id.to_string(), student.name.clone()),
        None => ("\u{2014}".to_string(), "Ready".to_string()),
    };
    let config = &session.config;

    ui.vertical_centered(|ui| {
        if config.show_id {
            ui.label(
                RichText::new(id_text)
                    .size(config.id_font_size as f32)
                    .strong(),
            );
        }
        if config.show_name {
            ui.label(RichText::new(name_text).size(config.name_font_size as f32));
        }
        ui.add_space(ITEM_SPACING);
        ui.label(
            RichText::new(format!(
                "{} of {} remaining, {} called",
                session.remaining_in_current(),
                session.population_of_current(),
                session.called_in_current()
            ))
            .weak(),
        );
        if session.current_student().is_none() {
            if let Some(last) = session.last_called() {
                ui.label(RichText::new(format!("Last called: {}", last.name)).weak());
            }
        }
        if session.all_exhausted() {
            ui.label(RichText::new("Everyone has been called.").weak());
        }
    });

    ui.add_space(SECTION_SPACING);
    ui.horizontal(|ui| {
        let draw_button = egui::Button::new(RichText::new("Draw").size(22.0))
            .min_size(egui::vec2(120.0, 40.0));
        if ui
            .add_enabled(!session.is_roster_empty(), draw_button)
            .clicked()
        {
            let feedback = session.draw_next();
            if let Some(message) = feedback.message() {
                panel.show_status(message);
            }
            if let DrawFeedback::Drawn(_) = feedback {
                panel.status = None;
            }
            events.push(WidgetEvent::Persist);
        }
        if ui.button("Reset").clicked() {
            if session.reset_current() {
                events.push(WidgetEvent::ClearHistory);
            }
            panel.show_status(format!("Group '{}' reshuffled.", session.current_group()));
            events.push(WidgetEvent::Persist);
        }
        if ui
            .add_enabled(session.current_student().is_some(), egui::Button::new("+1"))
            .on_hover_text("Add a point for the student on screen")
            .clicked()
        {
            if let Some(score) = session.increment_score() {
                panel.show_status(format!("Score is now {score}."));
                events.push(WidgetEvent::PersistScores);
            }
        }
    });
}

fn timer_body(
    ui: &mut Ui,
    session: &RollCallSession,
    timer: &mut TimerState,
    panel: &mut PanelState,
    events: &mut Vec<WidgetEvent>,
) {
    let flashing = panel
        .flash_until
        .is_some_and(|until| Instant::now() < until);
    ui.vertical_centered(|ui| {
        let mut reading =
            RichText::new(timer.display()).size(session.config.timer_font_size as f32);
        if flashing {
            reading = reading.color(FLASH_COLOR).strong();
        }
        ui.label(reading);
        ui.label(RichText::new(mode_name(timer)).weak());
    });

    ui.add_space(SECTION_SPACING);
    ui.horizontal(|ui| {
        let start_label = if timer.running { "Pause" } else { "Start" };
        if ui
            .add(egui::Button::new(RichText::new(start_label).size(18.0)).min_size(egui::vec2(90.0, 34.0)))
            .clicked()
        {
            timer.start_pause();
            events.push(WidgetEvent::Persist);
        }
        if ui.button("Reset").clicked() {
            timer.reset();
            panel.flash_until = None;
            events.push(WidgetEvent::Persist);
        }
        if ui.button(mode_toggle_label(timer)).clicked() {
            timer.toggle_mode();
            panel.flash_until = None;
            events.push(WidgetEvent::Persist);
        }
    });

    ui.add_space(ITEM_SPACING);
    ui.horizontal(|ui| {
        ui.label("Countdown");
        ui.add(egui::DragValue::new(&mut timer.countdown_minutes).range(0..=99).suffix(" min"));
        ui.add(egui::DragValue::new(&mut timer.countdown_seconds).range(0..=59).suffix(" s"));
        if ui.button("Apply").clicked() {
            timer.set_countdown(timer.countdown_minutes, timer.countdown_seconds);
            panel.flash_until = None;
            events.push(WidgetEvent::Persist);
        }
    });
}

fn mode_name(timer: &TimerState) -> &'static str {
    match timer.mode {
        crate::timer::TimerMode::Countdown => "Countdown",
        crate::timer::TimerMode::Stopwatch => "Stopwatch",
    }
}

fn mode_toggle_label(timer: &TimerState) -> &'static str {
    match timer.mode {
        crate::timer::TimerMode::Countdown => "Use stopwatch",
        crate::timer::TimerMode::Stopwatch => "Use countdown",
    }
}

fn status_line(ui: &mut Ui, panel: &mut PanelState) {
    let Some((message, until)) = panel.status.clone() else {
        return;
    };
    if Instant::now() < until {
        ui.add_space(ITEM_SPACING);
        ui.colored_label(STATUS_INFO, message);
    } else {
        panel.status = None;
    }
}

fn scoreboard_window(
    ui: &Ui,
    session: &mut RollCallSession,
    panel: &mut PanelState,
    events: &mut Vec<WidgetEvent>,
) {
    if !panel.scoreboard_open {
        return;
    }
    let mut open = true;
    let mut order = session.config.scoreboard_order;
    let rows: Vec<(StudentId, String, i64)> = session
        .scoreboard(order)
        .into_iter()
        .map(|student| (student.id, student.name.clone(), student.score))
        .collect();

    egui::Window::new("Scoreboard")
        .open(&mut open)
        .resizable(true)
        .show(ui.ctx(), |ui| {
            ui.horizontal(|ui| {
                if ui
                    .selectable_label(order == ScoreOrder::Rank, "By rank")
                    .clicked()
                {
                    order = ScoreOrder::Rank;
                }
                if ui.selectable_label(order == ScoreOrder::Id, "By id").clicked() {
                    order = ScoreOrder::Id;
                }
            });
            ui.separator();
            egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                egui::Grid::new("scoreboard_grid").striped(true).show(ui, |ui| {
                    ui.label(RichText::new("#").strong());
                    ui.label(RichText::new("Id").strong());
                    ui.label(RichText::new("Name").strong());
                    ui.label(RichText::new("Score").strong());
                    ui.end_row();
                    for (position, (id, name, score)) in rows.iter().enumerate() {
                        ui.label((position + 1).to_string());
                        ui.label(id.to_string());
                        ui.label(name);
                        ui.label(score.to_string());
                        ui.end_row();
                    }
                });
            });
        });

    if order != session.config.scoreboard_order {
        session.config.scoreboard_order = order;
        events.push(WidgetEvent::Persist);
    }
    panel.scoreboard_open = open;
}

fn picker_window(
    ui: &Ui,
    session: &mut RollCallSession,
    panel: &mut PanelState,
    events: &mut Vec<WidgetEvent>,
) {
    if !panel.picker_open {
        return;
    }
    let mut open = true;
    let mut picked: Option<StudentId> = None;
    let rows: Vec<(StudentId, String, bool)> = session
        .students()
        .iter()
        .map(|student| (student.id, student.name.clone(), session.is_called(student.id)))
        .collect();

    egui::Window::new("Pick a student")
        .open(&mut open)
        .show(ui.ctx(), |ui| {
            if rows.is_empty() {
                ui.label("The roster is empty.");
                return;
            }
            egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                for (id, name, called) in &rows {
                    let marker = if *called { " \u{2713}" } else { "" };
                    if ui.button(format!("{id}  {name}{marker}")).clicked() {
                        picked = Some(*id);
                    }
                }
            });
        });

    if let Some(id) = picked {
        if session.set_current_student(id) {
            events.push(WidgetEvent::Persist);
        }
        open = false;
    }
    panel.picker_open = open;
}

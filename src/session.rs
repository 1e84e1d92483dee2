//! Roll-call session controller.
//!
//! Sits between the widget UI and the pool manager: it owns the loaded
//! roster, the current group selection, the student being displayed, and the
//! score counters. UI events arrive as plain method calls and results flow
//! back as [`DrawFeedback`] values the widget turns into labels or popups.
//! The pool manager itself never sees the UI or the settings file; this
//! module translates between its snapshot and the string key/value section
//! the settings store works with.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::pool::{ALL_GROUP, DrawOutcome, GroupPoolManager, PoolSnapshot};
use crate::roster::{Student, StudentId};
use crate::settings::{
    DrawPolicy, KEY_GLOBAL_DRAWN, KEY_GROUP_LAST, KEY_GROUP_REMAINING, RollCallConfig, ScoreOrder,
    Section,
};

/// What the widget should show after a draw attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawFeedback {
    Drawn(StudentId),
    EmptyGroup { group: String },
    GroupExhausted { group: String },
    AllExhausted,
}

impl DrawFeedback {
    /// User-facing message for the non-draw outcomes.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Drawn(_) => None,
            Self::EmptyGroup { group } => {
                Some(format!("Group '{group}' has no students to call."))
            }
            Self::GroupExhausted { group } => Some(format!(
                "Everyone in '{group}' has been called. Switch groups or press reset."
            )),
            Self::AllExhausted => {
                Some("Every student has been called. Press reset to start over.".to_string())
            }
        }
    }
}

pub struct RollCallSession {
    manager: GroupPoolManager,
    students: Vec<Student>,
    index: BTreeMap<StudentId, usize>,
    pub config: RollCallConfig,
    current: Option<StudentId>,
}

impl RollCallSession {
    pub fn new(students: Vec<Student>, config: RollCallConfig) -> Self {
        let manager = GroupPoolManager::new(&students);
        Self::assemble(manager, students, config)
    }

    /// Deterministic construction for tests.
    pub fn with_seed(students: Vec<Student>, config: RollCallConfig, seed: u64) -> Self {
        let manager = GroupPoolManager::with_seed(&students, seed);
        Self::assemble(manager, students, config)
    }

    fn assemble(
        manager: GroupPoolManager,
        students: Vec<Student>,
        mut config: RollCallConfig,
    ) -> Self {
        if !manager.contains_group(&config.current_group) {
            config.current_group = ALL_GROUP.to_string();
        }
        let index = students
            .iter()
            .enumerate()
            .map(|(position, student)| (student.id, position))
            .collect();
        Self {
            manager,
            students,
            index,
            config,
            current: None,
        }
    }

    pub fn groups(&self) -> Vec<String> {
        self.manager.groups()
    }

    pub fn current_group(&self) -> &str {
        &self.config.current_group
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn is_roster_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn current_student(&self) -> Option<&Student> {
        let id = self.current?;
        self.index.get(&id).map(|&position| &self.students[position])
    }

    /// Switches the active group, falling back to the aggregate when the
    /// requested label does not exist (the roster may have changed under a
    /// persisted selection). The displayed student is cleared either way.
    pub fn select_group(&mut self, name: &str) {
        self.config.current_group = if self.manager.contains_group(name) {
            name.to_string()
        } else {
            ALL_GROUP.to_string()
        };
        self.current = None;
    }

    /// Draws the next student from the active group.
    ///
    /// Under [`DrawPolicy::ReshuffleOnExhaustion`] a drained pool is reset
    /// on the spot and drawn from again, so the caller only ever sees the
    /// empty-group outcome or a student.
    pub fn draw_next(&mut self) -> DrawFeedback {
        let group = self.config.current_group.clone();
        let mut outcome = self.manager.draw(&group);
        if self.config.draw_policy == DrawPolicy::ReshuffleOnExhaustion {
            match outcome {
                DrawOutcome::GroupExhausted => {
                    self.manager.reset_group(&group);
                    outcome = self.manager.draw(&group);
                }
                DrawOutcome::AllExhausted => {
                    self.manager.reset_all();
                    outcome = self.manager.draw(&group);
                }
                _ => {}
            }
        }
        match outcome {
            DrawOutcome::Drawn(id) => {
                self.current = Some(id);
                DrawFeedback::Drawn(id)
            }
            DrawOutcome::EmptyGroup => {
                self.current = None;
                DrawFeedback::EmptyGroup { group }
            }
            DrawOutcome::GroupExhausted => DrawFeedback::GroupExhausted { group },
            DrawOutcome::AllExhausted => DrawFeedback::AllExhausted,
        }
    }

    /// Resets the active group; resetting the aggregate restarts the whole
    /// roster. Returns true in the whole-roster case so the caller can also
    /// drop the persisted history.
    pub fn reset_current(&mut self) -> bool {
        let whole_roster = self.config.current_group == ALL_GROUP;
        if whole_roster {
            self.manager.reset_all();
        } else {
            let group = self.config.current_group.clone();
            self.manager.reset_group(&group);
        }
        self.current = None;
        whole_roster
    }

    /// Shows a specific student without touching any pool, for the manual
    /// picker dialog.
    pub fn set_current_student(&mut self, id: StudentId) -> bool {
        if self.index.contains_key(&id) {
            self.current = Some(id);
            true
        } else {
            false
        }
    }

    /// Adds one point to the displayed student. Returns the new score.
    pub fn increment_score(&mut self) -> Option<i64> {
        let id = self.current?;
        let position = *self.index.get(&id)?;
        let student = &mut self.students[position];
        student.score = student.score.saturating_add(1);
        Some(student.score)
    }

    /// Students ordered for the scoreboard: by score descending (id breaks
    /// ties) or plainly by id.
    pub fn scoreboard(&self, order: ScoreOrder) -> Vec<&Student> {
        let mut entries: Vec<&Student> = self.students.iter().collect();
        match order {
            ScoreOrder::Rank => {
                entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
            }
            ScoreOrder::Id => entries.sort_by_key(|student| student.id),
        }
        entries
    }

    pub fn remaining_in_current(&self) -> usize {
        self.manager.remaining(&self.config.current_group).len()
    }

    pub fn population_of_current(&self) -> usize {
        self.manager.population(&self.config.current_group)
    }

    pub fn called_in_current(&self) -> usize {
        self.manager.drawn_count(&self.config.current_group)
    }

    pub fn all_exhausted(&self) -> bool {
        self.manager.all_exhausted()
    }

    /// Whether this student has been called anywhere since the last full
    /// reset.
    pub fn is_called(&self, id: StudentId) -> bool {
        self.manager.is_drawn(id)
    }

    /// The student most recently drawn from the active group, if any.
    pub fn last_called(&self) -> Option<&Student> {
        let id = self.manager.last_drawn(&self.config.current_group)?;
        self.index.get(&id).map(|&position| &self.students[position])
    }

    /// Overlays persisted pool state from the roll-call settings section.
    /// Each of the three keys decodes independently; a mangled value simply
    /// counts as no prior state for that key.
    pub fn restore_from(&mut self, section: &Section) {
        let snapshot = PoolSnapshot {
            remaining: decode_json(section, KEY_GROUP_REMAINING),
            last_drawn: decode_json(section, KEY_GROUP_LAST),
            global_drawn: decode_json(section, KEY_GLOBAL_DRAWN),
        };
        if !snapshot.is_empty() {
            self.manager.restore(&snapshot);
        }
    }

    /// Writes the widget config and the JSON-encoded pool snapshot into the
    /// roll-call settings section.
    pub fn write_state(&self, section: &mut Section) {
        self.config.apply(section);
        let snapshot = self.manager.snapshot();
        section.insert(
            KEY_GROUP_REMAINING.to_string(),
            encode_json(&snapshot.remaining, "{}"),
        );
        section.insert(
            KEY_GROUP_LAST.to_string(),
            encode_json(&snapshot.last_drawn, "{}"),
        );
        section.insert(
            KEY_GLOBAL_DRAWN.to_string(),
            encode_json(&snapshot.global_drawn, "[]"),
        );
    }
}

fn decode_json<T: DeserializeOwned + Default>(section: &Section, key: &str) -> T {
    let Some(raw) = section.get(key) else {
        return T::default();
    };
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(error) => {
            warn!(key = %key, error = %error, "discarding unreadable persisted value");
            T::default()
        }
    }
}

fn encode_json<T: serde::Serialize>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|error| {
        warn!(error = %error, "failed to encode persisted value");
        fallback.to_string()
    })
}

//! Student roster storage.
//!
//! The roster is a small CSV table (id, name, group, score) kept next to the
//! settings file. Loading is forgiving: rows without a usable id or name are
//! dropped, group labels are normalized, and a missing file is replaced with
//! a three-row template so a first launch has something to show.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::constants::config;

pub type StudentId = u32;

/// One roster row. Created when the roster loads, never mutated afterwards
/// except for the score counter, and discarded wholesale on reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    /// Explicit group label, normalized (whitespace stripped, uppercased).
    /// Every student additionally belongs to the aggregate group.
    pub group: Option<String>,
    pub score: i64,
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write roster file {path}: {source}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a roster load. `template_created` tells the UI to let the user
/// know a starter file was generated for them to edit.
#[derive(Debug, Clone)]
pub struct LoadedRoster {
    pub students: Vec<Student>,
    pub template_created: bool,
}

/// Wire format of one CSV row. Everything is read as text so a hand-edited
/// file with stray spaces or decimal ids still loads.
#[derive(Debug, Serialize, Deserialize)]
struct RosterRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    group: String,
    #[serde(default)]
    score: String,
}

pub struct RosterStore {
    path: PathBuf,
}

impl RosterStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location, sharing the settings directory.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::ROSTER_FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and validates the roster, creating a template file first if
    /// none exists. Rows with a missing or unparseable id or a blank name
    /// are excluded silently; a structurally broken file is an error and the
    /// caller proceeds with an empty roster.
    pub fn load(&self) -> Result<LoadedRoster, RosterError> {
        let template_created = if self.path.exists() {
            false
        } else {
            self.write_template()?;
            info!(path = %self.path.display(), "created roster template");
            true
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|source| RosterError::Unreadable {
                path: self.path.clone(),
                source,
            })?;

        let mut students = Vec::new();
        let mut seen_ids = BTreeSet::new();
        let mut dropped = 0usize;
        for record in reader.deserialize::<RosterRow>() {
            let row = record.map_err(|source| RosterError::Unreadable {
                path: self.path.clone(),
                source,
            })?;
            let Some(id) = parse_id(&row.id) else {
                dropped += 1;
                continue;
            };
            let name = strip_whitespace(&row.name);
            if name.is_empty() {
                dropped += 1;
                continue;
            }
            if !seen_ids.insert(id) {
                warn!(id, "duplicate student id in roster, keeping first row");
                dropped += 1;
                continue;
            }
            students.push(Student {
                id,
                name,
                group: normalize_group(&row.group),
                score: parse_score(&row.score),
            });
        }
        if dropped > 0 {
            warn!(dropped, "dropped invalid roster rows");
        }
        info!(count = students.len(), path = %self.path.display(), "loaded roster");
        Ok(LoadedRoster {
            students,
            template_created,
        })
    }

    /// Rewrites the roster with the current scores. Ids, names, and groups
    /// are written back as loaded; the replace is atomic so a crash cannot
    /// leave a half-written roster behind.
    pub fn save_scores(&self, students: &[Student]) -> Result<(), RosterError> {
        let unwritable = |source: std::io::Error| RosterError::Unwritable {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(unwritable)?;
        }
        let mut writer = csv::Writer::from_writer(Vec::new());
        for student in students {
            let row = RosterRow {
                id: student.id.to_string(),
                name: student.name.clone(),
                group: student.group.clone().unwrap_or_default(),
                score: student.score.to_string(),
            };
            writer.serialize(row).map_err(|source| RosterError::Unreadable {
                path: self.path.clone(),
                source,
            })?;
        }
        let data = writer
            .into_inner()
            .map_err(|source| unwritable(source.into_error()))?;
        let tmp = self.path.with_extension("csv.tmp");
        fs::write(&tmp, data).map_err(unwritable)?;
        fs::rename(&tmp, &self.path).map_err(unwritable)?;
        Ok(())
    }

    fn write_template(&self) -> Result<(), RosterError> {
        let template = [
            Student {
                id: 101,
                name: "Zhang San".to_string(),
                group: Some("A".to_string()),
                score: 0,
            },
            Student {
                id: 102,
                name: "Li Si".to_string(),
                group: Some("B".to_string()),
                score: 0,
            },
            Student {
                id: 103,
                name: "Wang Wu".to_string(),
                group: Some("A".to_string()),
                score: 0,
            },
        ];
        self.save_scores(&template)
    }
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Accepts plain integers plus spreadsheet-style decimals like "101.0".
/// Fractional ids are rejected rather than rounded.
fn parse_id(raw: &str) -> Option<StudentId> {
    let cleaned = strip_whitespace(raw);
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(id) = cleaned.parse::<StudentId>() {
        return Some(id);
    }
    let value = cleaned.parse::<f64>().ok()?;
    if value.fract() != 0.0 || value < 0.0 || value > StudentId::MAX as f64 {
        return None;
    }
    Some(value as StudentId)
}

fn parse_score(raw: &str) -> i64 {
    let cleaned = strip_whitespace(raw);
    if cleaned.is_empty() {
        return 0;
    }
    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().map(|v| v.round() as i64))
        .unwrap_or(0)
}

fn normalize_group(raw: &str) -> Option<String> {
    let cleaned = strip_whitespace(raw).to_uppercase();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

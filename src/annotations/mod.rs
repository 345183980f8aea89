//! Time-stamped label tables read from the corpus annotation files.

pub mod filter;
pub mod reader;
pub mod speakers;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PromError, Result};

pub use filter::{filter_labels, LabelInventory};
pub use reader::{read_annotation, read_annotation_as};
pub use speakers::{Gender, SpeakerInfo, SpeakerRegistry};

/// Gap added to the previous interval's end to estimate the next start.
pub const START_EPSILON_S: f64 = 0.001;
/// Gap used by older corpus exports.
pub const LEGACY_START_EPSILON_S: f64 = 0.010;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Phones,
    Words,
    Tones,
    Accents,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 4] = [Self::Phones, Self::Words, Self::Tones, Self::Accents];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Phones => "phones",
            Self::Words => "words",
            Self::Tones => "tones",
            Self::Accents => "accents",
        }
    }

    /// Phones and words span intervals; tones and accents are points.
    pub fn has_intervals(self) -> bool {
        matches!(self, Self::Phones | Self::Words)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| PromError::UnsupportedAnnotation(path.display().to_string()))?;
        extension.parse()
    }
}

impl FromStr for AnnotationKind {
    type Err = PromError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "phones" => Ok(Self::Phones),
            "words" => Ok(Self::Words),
            "tones" => Ok(Self::Tones),
            "accents" => Ok(Self::Accents),
            other => Err(PromError::UnsupportedAnnotation(other.to_string())),
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What to assign as the start of the first interval in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstStart {
    #[default]
    Zero,
    Undefined,
}

/// Start estimation for tables that only record interval ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartPolicy {
    pub epsilon_s: f64,
    pub first: FirstStart,
}

impl Default for StartPolicy {
    fn default() -> Self {
        Self {
            epsilon_s: START_EPSILON_S,
            first: FirstStart::Zero,
        }
    }
}

impl StartPolicy {
    pub fn legacy() -> Self {
        Self {
            epsilon_s: LEGACY_START_EPSILON_S,
            first: FirstStart::Undefined,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.epsilon_s.is_finite() || self.epsilon_s < 0.0 {
            return Err(PromError::config(format!(
                "start_policy.epsilon_s must be >= 0, got {}",
                self.epsilon_s
            )));
        }
        Ok(())
    }

    /// Estimated start of an interval following one that ended at `previous_end`.
    pub fn start_after(&self, previous_end: Option<f64>) -> Option<f64> {
        match previous_end {
            Some(end) => Some(end + self.epsilon_s),
            None => match self.first {
                FirstStart::Zero => Some(0.0),
                FirstStart::Undefined => None,
            },
        }
    }
}

/// A labelled span whose start is estimated from the preceding row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    pub start_est: Option<f64>,
    pub end: f64,
    pub label: String,
}

impl Interval {
    pub fn new(start_est: Option<f64>, end: f64, label: impl Into<String>) -> Self {
        Self {
            start_est,
            end,
            label: label.into(),
        }
    }

    /// Closed containment; an undefined start never contains anything.
    pub fn contains(&self, time: f64) -> bool {
        self.start_est.is_some_and(|start| start <= time) && time <= self.end
    }

    pub fn duration_est(&self) -> Option<f64> {
        self.start_est.map(|start| self.end - start)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointEvent {
    pub time: f64,
    pub label: String,
}

impl PointEvent {
    pub fn new(time: f64, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
        }
    }
}

/// Intervals of one kind, ordered by end time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalTable {
    kind: AnnotationKind,
    rows: Vec<Interval>,
    #[serde(skip)]
    sorted_by_end: bool,
}

impl IntervalTable {
    pub fn new(kind: AnnotationKind, rows: Vec<Interval>) -> Self {
        let sorted_by_end = rows.windows(2).all(|pair| pair[0].end <= pair[1].end);
        Self {
            kind,
            rows,
            sorted_by_end,
        }
    }

    /// Builds intervals from `(end, label)` rows, estimating each start.
    pub fn from_ends(
        kind: AnnotationKind,
        ends: impl IntoIterator<Item = (f64, String)>,
        policy: &StartPolicy,
    ) -> Self {
        let mut previous_end = None;
        let rows = ends
            .into_iter()
            .map(|(end, label)| {
                let start_est = policy.start_after(previous_end);
                previous_end = Some(end);
                Interval {
                    start_est,
                    end,
                    label,
                }
            })
            .collect();
        Self::new(kind, rows)
    }

    /// Intonation phrases closed by each boundary tone.
    pub fn from_boundaries(tones: &PointTable, policy: &StartPolicy) -> Self {
        Self::from_ends(
            AnnotationKind::Tones,
            tones.rows().iter().map(|p| (p.time, p.label.clone())),
            policy,
        )
    }

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    pub fn rows(&self) -> &[Interval] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.label.as_str())
    }

    /// Copy holding only the rows `keep` accepts.
    pub fn retain_copy(&self, keep: impl Fn(&Interval) -> bool) -> Self {
        Self::new(
            self.kind,
            self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        )
    }

    /// Intervals containing `time`, in table order.
    pub fn containing(&self, time: f64) -> impl Iterator<Item = &Interval> {
        // rows ending before `time` cannot contain it; needs ends in order
        let first = if self.sorted_by_end {
            self.rows.partition_point(|row| row.end < time)
        } else {
            0
        };
        self.rows[first..]
            .iter()
            .filter(move |row| row.contains(time))
    }

    pub fn find_containing(&self, time: f64) -> Option<&Interval> {
        self.containing(time).next()
    }
}

/// Point events of one kind, ordered by time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointTable {
    kind: AnnotationKind,
    rows: Vec<PointEvent>,
}

impl PointTable {
    /// Sorts `rows` by time; events at equal times keep their file order.
    pub fn new(kind: AnnotationKind, mut rows: Vec<PointEvent>) -> Self {
        rows.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { kind, rows }
    }

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    pub fn rows(&self) -> &[PointEvent] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Latest event in the closed window `[from, to]`.
    pub fn latest_in(&self, from: f64, to: f64) -> Option<&PointEvent> {
        let end = self.rows.partition_point(|row| row.time <= to);
        self.rows[..end].last().filter(|row| row.time >= from)
    }
}

/// A parsed annotation file in its natural layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnnotationTable {
    Intervals(IntervalTable),
    Points(PointTable),
}

impl AnnotationTable {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Self::Intervals(table) => table.kind(),
            Self::Points(table) => table.kind(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Intervals(table) => table.len(),
            Self::Points(table) => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_intervals(self) -> Result<IntervalTable> {
        match self {
            Self::Intervals(table) => Ok(table),
            Self::Points(table) => Err(PromError::schema(format!(
                "{} table has (time, label) rows, expected (start_est, end, label)",
                table.kind()
            ))),
        }
    }

    pub fn into_points(self) -> Result<PointTable> {
        match self {
            Self::Points(table) => Ok(table),
            Self::Intervals(table) => Err(PromError::schema(format!(
                "{} table has (start_est, end, label) rows, expected (time, label)",
                table.kind()
            ))),
        }
    }
}

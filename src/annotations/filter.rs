use serde::{Deserialize, Serialize};

use super::{AnnotationKind, IntervalTable};
use crate::error::{PromError, Result};

/// SAMPA vowels (German inventory) that can carry a syllable nucleus.
pub const SAMPA_VOWELS: [&str; 23] = [
    "a:", "e:", "i:", "o:", "u:", "E:", "2:", "y:", "a", "E", "I", "O", "U", "Y", "9", "@", "6",
    "OY", "aI", "aU", "_6", "_9", "_2:",
];
/// Nasals and liquids that may optionally count as nuclei.
pub const SONORANTS: [&str; 4] = ["m", "n", "l", "N"];
/// Breathing and other extralinguistic word labels.
pub const EXTRALINGUISTIC: [&str; 6] = ["[@]", "[t]", "[n]", "[f]", "[h]", "<P>"];

/// Label sets used to filter phones and words before alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelInventory {
    pub vowels: Vec<String>,
    pub include_sonorants: bool,
    pub extralinguistic: Vec<String>,
}

impl Default for LabelInventory {
    fn default() -> Self {
        Self {
            vowels: SAMPA_VOWELS.iter().map(|s| s.to_string()).collect(),
            include_sonorants: false,
            extralinguistic: EXTRALINGUISTIC.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LabelInventory {
    pub fn is_nucleus_phone(&self, label: &str) -> bool {
        self.vowels.iter().any(|v| v == label)
            || (self.include_sonorants && SONORANTS.contains(&label))
    }

    pub fn is_extralinguistic(&self, label: &str) -> bool {
        self.extralinguistic.iter().any(|e| e == label)
    }

    /// Copy of `table` restricted to the rows alignment should see.
    ///
    /// Phones keep vowel (and optionally sonorant) labels; words drop
    /// extralinguistic labels. Other kinds are not filterable.
    pub fn filter(&self, table: &IntervalTable) -> Result<IntervalTable> {
        match table.kind() {
            AnnotationKind::Phones => Ok(table.retain_copy(|row| self.is_nucleus_phone(&row.label))),
            AnnotationKind::Words => Ok(table.retain_copy(|row| !self.is_extralinguistic(&row.label))),
            other => Err(PromError::UnsupportedAnnotation(format!(
                "{other} (only phones and words can be filtered)"
            ))),
        }
    }
}

/// Filters `table` with the default label inventory.
pub fn filter_labels(table: &IntervalTable) -> Result<IntervalTable> {
    LabelInventory::default().filter(table)
}

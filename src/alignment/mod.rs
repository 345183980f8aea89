//! Joins nucleus times with the enclosing annotation intervals.

use serde::Serialize;
use tracing::debug;

use crate::annotations::{
    AnnotationKind, Interval, IntervalTable, LabelInventory, PointTable, StartPolicy,
};
use crate::error::{PromError, Result};

/// One nucleus with whatever annotation encloses it.
///
/// `None` marks a nucleus outside every interval of that layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AlignedNucleus {
    pub time: f64,
    pub phone: Option<String>,
    pub start_est: Option<f64>,
    pub end: Option<f64>,
    pub duration_est: Option<f64>,
    pub word: Option<String>,
    pub word_start: Option<f64>,
    pub word_end: Option<f64>,
    pub ip_tone: Option<String>,
    pub ip_start: Option<f64>,
    pub ip_end: Option<f64>,
    pub accent: Option<String>,
    pub accent_time: Option<f64>,
}

/// Filtered annotation layers ready for lookup.
#[derive(Debug, Clone, Default)]
pub struct IntervalAligner {
    inventory: LabelInventory,
    phones: Option<IntervalTable>,
    words: Option<IntervalTable>,
    phrases: Option<IntervalTable>,
    accents: Option<PointTable>,
}

impl IntervalAligner {
    pub fn new(inventory: LabelInventory) -> Self {
        Self {
            inventory,
            ..Self::default()
        }
    }

    /// Adds the phone layer, keeping nucleus-bearing labels only.
    pub fn with_phones(mut self, phones: &IntervalTable) -> Result<Self> {
        expect_kind(phones.kind(), AnnotationKind::Phones)?;
        self.phones = Some(self.inventory.filter(phones)?);
        Ok(self)
    }

    /// Adds the word layer without extralinguistic labels.
    pub fn with_words(mut self, words: &IntervalTable) -> Result<Self> {
        expect_kind(words.kind(), AnnotationKind::Words)?;
        self.words = Some(self.inventory.filter(words)?);
        Ok(self)
    }

    /// Adds intonation phrases closed by the given boundary tones.
    pub fn with_tones(mut self, tones: &PointTable, policy: &StartPolicy) -> Result<Self> {
        expect_kind(tones.kind(), AnnotationKind::Tones)?;
        self.phrases = Some(IntervalTable::from_boundaries(tones, policy));
        Ok(self)
    }

    pub fn with_accents(mut self, accents: PointTable) -> Result<Self> {
        expect_kind(accents.kind(), AnnotationKind::Accents)?;
        self.accents = Some(accents);
        Ok(self)
    }

    pub fn align(&self, times: &[f64]) -> Vec<AlignedNucleus> {
        times.iter().map(|&time| self.align_one(time)).collect()
    }

    fn align_one(&self, time: f64) -> AlignedNucleus {
        let mut nucleus = AlignedNucleus {
            time,
            ..AlignedNucleus::default()
        };

        if let Some(phone) = lookup(self.phones.as_ref(), time) {
            nucleus.phone = Some(phone.label.clone());
            nucleus.start_est = phone.start_est;
            nucleus.end = Some(phone.end);
            nucleus.duration_est = phone.duration_est();
            // accents anticipate or coincide with the nucleus
            if let (Some(accents), Some(start)) = (&self.accents, phone.start_est) {
                if let Some(accent) = accents.latest_in(start, time) {
                    nucleus.accent = Some(accent.label.clone());
                    nucleus.accent_time = Some(accent.time);
                }
            }
        }
        if let Some(word) = lookup(self.words.as_ref(), time) {
            nucleus.word = Some(word.label.clone());
            nucleus.word_start = word.start_est;
            nucleus.word_end = Some(word.end);
        }
        if let Some(phrase) = lookup(self.phrases.as_ref(), time) {
            nucleus.ip_tone = Some(phrase.label.clone());
            nucleus.ip_start = phrase.start_est;
            nucleus.ip_end = Some(phrase.end);
        }
        nucleus
    }
}

fn lookup(table: Option<&IntervalTable>, time: f64) -> Option<&Interval> {
    let table = table?;
    let mut matches = table.containing(time);
    let first = matches.next()?;
    if matches.next().is_some() {
        debug!(time, kind = %table.kind(), "overlapping intervals, using the first");
    }
    Some(first)
}

fn expect_kind(actual: AnnotationKind, expected: AnnotationKind) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(PromError::schema(format!(
            "expected a {expected} table, got {actual}"
        )))
    }
}

use super::FeatureValue;
use crate::alignment::AlignedNucleus;
use crate::error::{PromError, Result};

/// Aligned nuclei plus computed feature columns, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    nuclei: Vec<AlignedNucleus>,
    columns: Vec<(String, Vec<FeatureValue>)>,
}

impl FeatureTable {
    pub fn new(nuclei: Vec<AlignedNucleus>) -> Self {
        Self {
            nuclei,
            columns: Vec::new(),
        }
    }

    pub fn nuclei(&self) -> &[AlignedNucleus] {
        &self.nuclei
    }

    pub fn len(&self) -> usize {
        self.nuclei.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nuclei.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[FeatureValue]> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Like [`column`](Self::column), but a missing column is a schema error.
    pub fn require(&self, name: &str) -> Result<&[FeatureValue]> {
        self.column(name)
            .ok_or_else(|| PromError::schema(format!("feature table lacks column '{name}'")))
    }

    /// Copy of this table with `values` added (or replaced) as column `name`.
    pub fn with_column(&self, name: impl Into<String>, values: Vec<FeatureValue>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.nuclei.len() {
            return Err(PromError::schema(format!(
                "column '{name}' has {} values for {} nuclei",
                values.len(),
                self.nuclei.len()
            )));
        }
        let mut next = self.clone();
        match next.columns.iter_mut().find(|(column, _)| *column == name) {
            Some((_, existing)) => *existing = values,
            None => next.columns.push((name, values)),
        }
        Ok(next)
    }
}

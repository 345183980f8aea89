use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{PromError, Result};

static SPEAKER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9 ]+SP([0-9]?)[fm]").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Self::Female => "f",
            Self::Male => "m",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakerInfo {
    pub speaker_id: String,
    pub gender: Gender,
}

/// Speaker metadata, one recording per line.
#[derive(Debug, Clone, Default)]
pub struct SpeakerRegistry {
    lines: Vec<String>,
}

impl SpeakerRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| PromError::io("reading speaker metadata", path, err))?;
        Ok(Self::from_text(&text))
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Speaker of the lines mentioning `recording_id`.
    ///
    /// The gender comes from the first such line and the speaker id from the
    /// last. The first line's lowercase letters must spell exactly the gender
    /// code.
    pub fn lookup(&self, recording_id: &str) -> Result<SpeakerInfo> {
        let mut matching = self.lines.iter().filter(|line| line.contains(recording_id));
        let first = matching
            .next()
            .ok_or_else(|| PromError::input(format!("no speaker entry for recording '{recording_id}'")))?;
        let last = matching.last().unwrap_or(first);

        let speaker_id = SPEAKER_ID
            .captures(last)
            .and_then(|caps| caps.get(1))
            .map(|id| id.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PromError::input(format!("no speaker id in entry '{last}'")))?;

        let letters: String = first.chars().filter(|c| c.is_ascii_lowercase()).collect();
        let gender = match letters.as_str() {
            "f" => Gender::Female,
            "m" => Gender::Male,
            other => {
                return Err(PromError::input(format!(
                    "speaker entry '{first}' has gender '{other}', expected 'm' or 'f'"
                )))
            }
        };

        Ok(SpeakerInfo {
            speaker_id: speaker_id.to_string(),
            gender,
        })
    }
}

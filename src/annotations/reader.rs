use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{AnnotationKind, AnnotationTable, IntervalTable, PointEvent, PointTable, StartPolicy};
use crate::error::{PromError, Result};

static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid regex"));

/// Escaped umlauts used by the word transcriptions.
const UMLAUTS: [(&str, &str); 8] = [
    ("\"u", "ü"),
    ("\"U", "Ü"),
    ("\"a", "ä"),
    ("\"A", "Ä"),
    ("\"o", "ö"),
    ("\"O", "Ö"),
    ("\"s", "ß"),
    ("\"S", "ß"),
];

/// Reads an annotation file, taking its kind from the extension.
pub fn read_annotation(path: &Path, policy: &StartPolicy) -> Result<AnnotationTable> {
    let kind = AnnotationKind::from_path(path)?;
    read_annotation_as(path, kind, policy)
}

pub fn read_annotation_as(
    path: &Path,
    kind: AnnotationKind,
    policy: &StartPolicy,
) -> Result<AnnotationTable> {
    let bytes = std::fs::read(path).map_err(|err| PromError::io("reading annotation file", path, err))?;
    let text = decode_latin1(&bytes);
    let block = data_block(&text)
        .ok_or_else(|| PromError::input(format!("{}: no '#' line ends the header", path.display())))?;
    let rows = parse_rows(&clean_text(block, kind))
        .map_err(|message| PromError::input(format!("{}: {message}", path.display())))?;
    debug!(path = %path.display(), %kind, rows = rows.len(), "read annotation file");

    Ok(if kind.has_intervals() {
        AnnotationTable::Intervals(IntervalTable::from_ends(kind, rows, policy))
    } else {
        let points = rows
            .into_iter()
            .map(|(time, label)| PointEvent { time, label })
            .collect();
        AnnotationTable::Points(PointTable::new(kind, points))
    })
}

/// ISO-8859-1 maps every byte to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Everything after the first line consisting of a lone `#`.
pub fn data_block(text: &str) -> Option<&str> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end_matches(['\n', '\r']) == "#" {
            return Some(&text[offset..]);
        }
    }
    None
}

/// Collapses space runs and, for word tables, decodes escaped umlauts.
pub fn clean_text(text: &str, kind: AnnotationKind) -> String {
    let collapsed = SPACE_RUNS.replace_all(text, " ");
    if kind != AnnotationKind::Words {
        return collapsed.into_owned();
    }
    UMLAUTS
        .iter()
        .fold(collapsed.into_owned(), |acc, (escaped, plain)| acc.replace(escaped, plain))
}

/// `value xwaves label` rows; blank lines are skipped.
fn parse_rows(text: &str) -> std::result::Result<Vec<(f64, String)>, String> {
    let mut rows = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, char::is_whitespace);
        let value = fields.next().unwrap_or_default();
        let value: f64 = value
            .parse()
            .map_err(|_| format!("data line {}: '{value}' is not a time", number + 1))?;
        let _xwaves = fields
            .next()
            .ok_or_else(|| format!("data line {}: missing colour column", number + 1))?;
        let label = fields
            .next()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .ok_or_else(|| format!("data line {}: missing label", number + 1))?;
        rows.push((value, label.to_string()));
    }
    Ok(rows)
}

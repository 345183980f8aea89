use std::path::Path;

use serde_json::{json, Map, Value};

use crate::alignment::AlignedNucleus;
use crate::config::OutputFormat;
use crate::error::{PromError, Result};
use crate::features::FeatureTable;

const BASE_COLUMNS: [&str; 13] = [
    "time",
    "phone",
    "start_est",
    "end",
    "duration_est",
    "word",
    "word_start",
    "word_end",
    "ip_tone",
    "ip_start",
    "ip_end",
    "accent",
    "accent_time",
];

pub fn write_table(table: &FeatureTable, format: OutputFormat, path: &Path) -> Result<()> {
    let contents = match format {
        OutputFormat::Csv => to_csv(table),
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(&to_json(table))
                .map_err(|err| PromError::engine("serialising feature table", err))?;
            text.push('\n');
            text
        }
    };
    std::fs::write(path, contents).map_err(|err| PromError::io("writing feature table", path, err))
}

/// One row per nucleus; missing values are empty cells.
pub fn to_csv(table: &FeatureTable) -> String {
    let feature_columns: Vec<&str> = table.column_names().collect();
    let mut out = String::new();
    let header: Vec<&str> = BASE_COLUMNS.iter().copied().chain(feature_columns.iter().copied()).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for (row, nucleus) in table.nuclei().iter().enumerate() {
        let mut cells = base_cells(nucleus);
        for name in &feature_columns {
            let cell = table
                .column(name)
                .and_then(|values| values.get(row))
                .and_then(|value| value.ok())
                .map(|v| v.to_string())
                .unwrap_or_default();
            cells.push(cell);
        }
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Array of row objects; missing values are `null`.
pub fn to_json(table: &FeatureTable) -> Value {
    let feature_columns: Vec<&str> = table.column_names().collect();
    let rows = table
        .nuclei()
        .iter()
        .enumerate()
        .map(|(row, nucleus)| {
            let mut object = match serde_json::to_value(nucleus) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            };
            for name in &feature_columns {
                let value = table
                    .column(name)
                    .and_then(|values| values.get(row))
                    .and_then(|value| value.ok());
                object.insert(name.to_string(), json!(value));
            }
            Value::Object(object)
        })
        .collect();
    Value::Array(rows)
}

fn base_cells(n: &AlignedNucleus) -> Vec<String> {
    vec![
        n.time.to_string(),
        text(&n.phone),
        number(n.start_est),
        number(n.end),
        number(n.duration_est),
        text(&n.word),
        number(n.word_start),
        number(n.word_end),
        text(&n.ip_tone),
        number(n.ip_start),
        number(n.ip_end),
        text(&n.accent),
        number(n.accent_time),
    ]
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn text(value: &Option<String>) -> String {
    match value {
        Some(label) if label.contains([',', '"', '\n']) => {
            format!("\"{}\"", label.replace('"', "\"\""))
        }
        Some(label) => label.clone(),
        None => String::new(),
    }
}

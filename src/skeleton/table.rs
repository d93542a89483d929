use std::collections::BTreeSet;
use std::fmt;

use log::debug;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::blocks;
use crate::error::{Result, SkeletonError};

// ---------------------------------------------------------------------------
// AttributeValue – a single cell of an attribute table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, typed by inference from its text.
/// Kept `Ord` so values can live in `BTreeSet`s for selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

// -- Manual Eq/Ord so we can put AttributeValue in BTreeSet --

impl Eq for AttributeValue {}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttributeValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use AttributeValue::*;
        fn discriminant(v: &AttributeValue) -> u8 {
            match v {
                Bool(_) => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Text(_) => 3,
            }
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for AttributeValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AttributeValue::Text(s) => s.hash(state),
            AttributeValue::Integer(i) => i.hash(state),
            AttributeValue::Float(f) => f.to_bits().hash(state),
            AttributeValue::Bool(b) => b.hash(state),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Integer(i) => write!(f, "{i}"),
            // keep a decimal point so the text reads back as a float
            AttributeValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl AttributeValue {
    /// Infer the type of a single token: integer, then float, then bool, else
    /// text. Table columns are typed as a whole by the table reader.
    pub fn guess(s: &str) -> Self {
        if let Ok(i) = s.parse::<i64>() {
            return AttributeValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return AttributeValue::Float(f);
        }
        if s == "true" || s == "false" {
            return AttributeValue::Bool(s == "true");
        }
        AttributeValue::Text(s.to_string())
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AttributeTable – named columns, one row per entity
// ---------------------------------------------------------------------------

/// Per-entity attribute columns. Row `i` describes entity `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeTable {
    names: Vec<String>,
    /// `columns[c][row]`
    columns: Vec<Vec<AttributeValue>>,
}

impl AttributeTable {
    /// Build a table from a header and row-major values.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<AttributeValue>>) -> Result<Self> {
        let mut columns = vec![Vec::with_capacity(rows.len()); names.len()];
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(SkeletonError::mismatch(
                    format!("columns in attribute row {i}"),
                    names.len(),
                    row.len(),
                ));
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }
        Ok(AttributeTable { names, columns })
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[AttributeValue]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Numeric view of a column; `None` if missing or any cell is non-numeric.
    pub fn column_f64(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name)?.iter().map(AttributeValue::as_f64).collect()
    }

    /// Cells of row `i` in column order.
    pub fn row(&self, i: usize) -> Option<Vec<&AttributeValue>> {
        (i < self.n_rows()).then(|| self.columns.iter().map(|col| &col[i]).collect())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    /// Sorted set of distinct values in a column.
    pub fn unique_values(&self, name: &str) -> Option<BTreeSet<AttributeValue>> {
        self.column(name).map(|col| col.iter().cloned().collect())
    }

    /// Header line followed by one line per row, fields separated by a space.
    pub fn to_text(&self) -> String {
        let mut out = self.names.join(" ");
        out.push('\n');
        for i in 0..self.n_rows() {
            let line: Vec<String> = self.columns.iter().map(|col| col[i].to_string()).collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }

    /// Parse a header line plus whitespace-delimited rows.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(true)
            .from_reader(text.as_bytes());

        let names: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|err| {
                if let csv::ErrorKind::UnequalLengths {
                    pos,
                    expected_len,
                    len,
                } = err.kind()
                {
                    let row = pos.as_ref().map_or(0, |p| p.record());
                    return SkeletonError::mismatch(
                        format!("columns in attribute row {row}"),
                        *expected_len as usize,
                        *len as usize,
                    );
                }
                SkeletonError::Table(err)
            })?;
            rows.push(record);
        }

        let columns = (0..names.len())
            .map(|c| {
                let raw: Vec<&str> = rows.iter().map(|r| r.get(c).unwrap_or("")).collect();
                guess_column(&raw)
            })
            .collect();
        Ok(AttributeTable { names, columns })
    }
}

/// Type a whole column at once: integer if every cell is an integer, else
/// float if every cell is numeric, else bool, else text. A float column
/// written with `%g` may hold `3` next to `2.5`; both become `Float`.
fn guess_column(raw: &[&str]) -> Vec<AttributeValue> {
    let ints: Option<Vec<i64>> = raw.iter().map(|s| s.parse().ok()).collect();
    if let Some(ints) = ints {
        return ints.into_iter().map(AttributeValue::Integer).collect();
    }
    let floats: Option<Vec<f64>> = raw.iter().map(|s| s.parse().ok()).collect();
    if let Some(floats) = floats {
        return floats.into_iter().map(AttributeValue::Float).collect();
    }
    if raw.iter().all(|s| *s == "true" || *s == "false") {
        return raw.iter().map(|s| AttributeValue::Bool(*s == "true")).collect();
    }
    raw.iter().map(|s| AttributeValue::Text(s.to_string())).collect()
}

/// Serialized as `{ column_name: [values...] }` in column order.
impl Serialize for AttributeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, col) in self.names.iter().zip(&self.columns) {
            map.serialize_entry(name, col)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// "DATA" section parser
// ---------------------------------------------------------------------------

/// Parse a `[... DATA]` section.
///
/// Layout: marker, column count `M`, `M` name lines, then data rows. The name
/// lines and rows are not contiguous with a header, so a synthetic header line
/// is assembled in memory and handed to the table reader together with the
/// normalised rows.
pub fn parse_attribute_section(section: &[&str], first_line: usize) -> Result<AttributeTable> {
    if section.len() < 2 {
        return Err(SkeletonError::invalid_line(
            first_line + 1,
            "attribute section has no column count",
        ));
    }
    let n_columns = blocks::parse_count(section[1], first_line + 2)?;

    let body = &section[2..];
    if body.len() < n_columns {
        return Err(SkeletonError::mismatch(
            format!("column names in section at line {}", first_line + 1),
            n_columns,
            body.len(),
        ));
    }
    let (name_lines, data_lines) = body.split_at(n_columns);

    let names = name_lines
        .iter()
        .enumerate()
        .map(|(i, line)| column_name(line, first_line + 3 + i))
        .collect::<Result<Vec<_>>>()?;

    let mut text = names.join(" ");
    text.push('\n');
    for line in data_lines.iter().filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        text.push_str(&fields.join(" "));
        text.push('\n');
    }

    let table = AttributeTable::from_text(&text)?;
    if table.n_columns() != n_columns {
        return Err(SkeletonError::mismatch(
            format!("columns in section at line {}", first_line + 1),
            n_columns,
            table.n_columns(),
        ));
    }
    debug!(
        "attribute section at line {}: {} columns, {} rows",
        first_line + 1,
        table.n_columns(),
        table.n_rows()
    );
    Ok(table)
}

/// A name line is either `<name>` or `<tag> <name>`.
fn column_name(line: &str, line_no: usize) -> Result<String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [name] | [_, name, ..] => Ok(name.to_string()),
        [] => Err(SkeletonError::invalid_line(line_no, "blank column name")),
    }
}

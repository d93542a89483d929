use std::ops::Range;
use std::str::FromStr;

use log::debug;

use crate::error::{Result, SkeletonError};

/// Tag on the first line of every NDskl ASCII file.
pub const MAGIC: &str = "ANDSKEL";

pub const BBOX_MARKER: &str = "BBOX";
pub const CRITICAL_POINTS_MARKER: &str = "[CRITICAL POINTS]";
pub const FILAMENTS_MARKER: &str = "[FILAMENTS]";
pub const CRITICAL_POINTS_DATA_MARKER: &str = "[CRITICAL POINTS DATA]";
pub const FILAMENTS_DATA_MARKER: &str = "[FILAMENTS DATA]";

/// Section markers in file order.
pub const MARKERS: [&str; 5] = [
    BBOX_MARKER,
    CRITICAL_POINTS_MARKER,
    FILAMENTS_MARKER,
    CRITICAL_POINTS_DATA_MARKER,
    FILAMENTS_DATA_MARKER,
];

// ---------------------------------------------------------------------------
// Block locator
// ---------------------------------------------------------------------------

/// Half-open line ranges of the five sections. Each range starts at its
/// marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRanges {
    pub bbox: Range<usize>,
    pub critical_points: Range<usize>,
    pub filaments: Range<usize>,
    pub critical_points_data: Range<usize>,
    pub filaments_data: Range<usize>,
}

/// Index of the first line containing each marker as a substring.
///
/// Every marker is searched from the top of the input independently of the
/// others. A marker that never appears is a fatal format error.
pub fn locate_markers(lines: &[&str], markers: &[&'static str]) -> Result<Vec<usize>> {
    markers
        .iter()
        .map(|&marker| {
            let pos = lines
                .iter()
                .position(|line| line.contains(marker))
                .ok_or(SkeletonError::MissingMarker { marker })?;
            debug!("found marker '{marker}' on line {}", pos + 1);
            Ok(pos)
        })
        .collect()
}

/// Split the file into its five sections. The last one runs to end of input.
pub fn section_ranges(lines: &[&str]) -> Result<SectionRanges> {
    let starts = locate_markers(lines, &MARKERS)?;

    let mut ranges = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(lines.len());
        if end < start {
            return Err(SkeletonError::invalid_line(
                end + 1,
                format!("section '{}' appears before '{}'", MARKERS[i + 1], MARKERS[i]),
            ));
        }
        ranges.push(start..end);
    }

    let mut it = ranges.into_iter();
    let mut next = || it.next().unwrap_or_default();
    Ok(SectionRanges {
        bbox: next(),
        critical_points: next(),
        filaments: next(),
        critical_points_data: next(),
        filaments_data: next(),
    })
}

// ---------------------------------------------------------------------------
// Row tokenizer
// ---------------------------------------------------------------------------

/// One non-blank line split into whitespace-delimited fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<'a> {
    /// 1-based line number in the source file.
    pub line: usize,
    /// `true` when the line starts a new record (no leading whitespace).
    pub header: bool,
    pub fields: Vec<&'a str>,
}

impl<'a> Row<'a> {
    /// Parse field `idx` as `T`.
    pub fn parse<T: FromStr>(&self, idx: usize) -> Result<T> {
        let token = self.fields.get(idx).ok_or_else(|| {
            SkeletonError::invalid_line(
                self.line,
                format!("expected at least {} fields, found {}", idx + 1, self.fields.len()),
            )
        })?;
        parse_token(token, self.line)
    }

    /// Parse the field `back` positions from the end (`0` is the last field).
    pub fn parse_from_end<T: FromStr>(&self, back: usize) -> Result<T> {
        match self.fields.len().checked_sub(back + 1) {
            Some(idx) => self.parse(idx),
            None => Err(SkeletonError::invalid_line(
                self.line,
                format!("expected at least {} fields, found {}", back + 1, self.fields.len()),
            )),
        }
    }

    /// Parse every field in `range` as `f64`.
    pub fn parse_floats(&self, range: Range<usize>) -> Result<Vec<f64>> {
        self.fields[range]
            .iter()
            .map(|tok| parse_token(tok, self.line))
            .collect()
    }
}

/// Tag each non-blank line as a record header or a continuation line.
///
/// `first_line` is the 0-based file index of `lines[0]`. Leading whitespace
/// is the only thing that distinguishes a continuation line.
pub fn tokenize<'a>(lines: &[&'a str], first_line: usize) -> Vec<Row<'a>> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| Row {
            line: first_line + i + 1,
            header: !line.starts_with(char::is_whitespace),
            fields: line.split_whitespace().collect(),
        })
        .collect()
}

pub(crate) fn parse_token<T: FromStr>(token: &str, line: usize) -> Result<T> {
    token.parse::<T>().map_err(|_| SkeletonError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

/// Parse the declared count on a single-value line such as `<N>`.
pub(crate) fn parse_count(line: &str, line_no: usize) -> Result<usize> {
    let token = line
        .split_whitespace()
        .next()
        .ok_or_else(|| {
            SkeletonError::invalid_line(line_no, "expected a count, found a blank line")
        })?;
    parse_token(token, line_no)
}

/// Parse bracketed or parenthesised numeric literals, e.g.
/// `[0.0, 0.0, 0.0] (1.5,2,3)`. A trailing comma inside a group is allowed.
pub(crate) fn parse_tuple_literals(text: &str, line: usize) -> Result<Vec<Vec<f64>>> {
    let mut groups = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(|c: char| c == '[' || c == '(') {
        let close_char = if rest[open..].starts_with('[') { ']' } else { ')' };
        let close = rest[open..]
            .find(close_char)
            .map(|c| open + c)
            .ok_or_else(|| {
                SkeletonError::invalid_line(line, format!("unterminated '{}'", &rest[open..]))
            })?;

        let values = rest[open + 1..close]
            .split(',')
            .map(str::trim)
            .filter(|tok| !tok.is_empty())
            .map(|tok| parse_token(tok, line))
            .collect::<Result<Vec<f64>>>()?;
        groups.push(values);
        rest = &rest[close + 1..];
    }

    Ok(groups)
}

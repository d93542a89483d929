use log::debug;

use super::blocks::{self, Row};
use super::model::{Connection, CriticalPoint, CriticalPointId, Filament, FilamentId};
use crate::error::{Result, SkeletonError};

// ---------------------------------------------------------------------------
// Record-list segmenter
// ---------------------------------------------------------------------------

/// Parse a `[CRITICAL POINTS]` or `[FILAMENTS]` section.
///
/// `section[0]` is the marker, `section[1]` the declared record count. The
/// remaining lines are cut into records at every non-indented line and each
/// record is handed to `parse`. `first_line` is the 0-based file index of the
/// marker line.
pub fn parse_record_list<'a, T>(
    section: &[&'a str],
    first_line: usize,
    what: &str,
    parse: impl Fn(&[Row<'a>]) -> Result<T>,
) -> Result<Vec<T>> {
    if section.len() < 2 {
        return Err(SkeletonError::invalid_line(
            first_line + 1,
            format!("{what} section has no record count"),
        ));
    }
    let declared = blocks::parse_count(section[1], first_line + 2)?;
    let rows = blocks::tokenize(&section[2..], first_line + 2);

    if let Some(orphan) = rows.first().filter(|r| !r.header) {
        return Err(SkeletonError::invalid_line(
            orphan.line,
            format!("continuation line before the first {what} record"),
        ));
    }

    let starts: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.header)
        .map(|(i, _)| i)
        .collect();

    if starts.len() != declared {
        return Err(SkeletonError::mismatch(
            format!("number of {what} records"),
            declared,
            starts.len(),
        ));
    }
    debug!("{what}: {declared} records over {} rows", rows.len());

    starts
        .iter()
        .enumerate()
        .map(|(k, &start)| {
            let end = starts.get(k + 1).copied().unwrap_or(rows.len());
            parse(&rows[start..end])
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Critical point record
// ---------------------------------------------------------------------------

/// Parse one critical point record:
///
/// ```text
/// <type> <pos...> <value> <pairId> <boundary>
///  <nfil>
///  <destId> <filId>        × nfil
/// ```
///
/// Indented lines may carry an extra leading tag field; counts and ids are
/// read from the end of the line. The position length is inferred from the
/// header and must match `ndim`.
pub fn parse_critical_point(rows: &[Row<'_>], ndim: usize) -> Result<CriticalPoint> {
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| SkeletonError::invalid_line(0, "empty critical point record"))?;
    let n_fields = header.fields.len();
    if n_fields < 5 {
        return Err(SkeletonError::invalid_line(
            header.line,
            format!("critical point header needs at least 5 fields, found {n_fields}"),
        ));
    }
    let dims = n_fields - 4;
    if dims != ndim {
        return Err(SkeletonError::mismatch(
            format!("dimensionality of critical point at line {}", header.line),
            ndim,
            dims,
        ));
    }

    let point_type: i32 = header.parse(0)?;
    let position = header.parse_floats(1..1 + dims)?;
    let value: f64 = header.parse(1 + dims)?;
    let pair = CriticalPointId(header.parse(2 + dims)?);
    let boundary: i32 = header.parse(3 + dims)?;

    let (count_row, connection_rows) = body.split_first().ok_or_else(|| {
        SkeletonError::invalid_line(header.line, "critical point has no connection count line")
    })?;
    check_width(count_row, 1, "connection count line")?;
    let nfil: usize = count_row.parse_from_end(0)?;

    let connections = connection_rows
        .iter()
        .map(|row| {
            check_width(row, 2, "connection line")?;
            Ok(Connection {
                destination: CriticalPointId(row.parse_from_end(1)?),
                filament: FilamentId(row.parse_from_end(0)?),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if connections.len() != nfil {
        return Err(SkeletonError::mismatch(
            format!("connections of critical point at line {}", header.line),
            nfil,
            connections.len(),
        ));
    }

    Ok(CriticalPoint {
        point_type,
        position,
        value,
        pair,
        boundary,
        connections,
    })
}

/// A continuation line holds `fields` values, optionally after one tag.
fn check_width(row: &Row<'_>, fields: usize, what: &str) -> Result<()> {
    let n = row.fields.len();
    if n == fields || n == fields + 1 {
        Ok(())
    } else {
        Err(SkeletonError::invalid_line(
            row.line,
            format!("{what} needs {fields} fields after an optional tag, found {n}"),
        ))
    }
}

// ---------------------------------------------------------------------------
// Filament record
// ---------------------------------------------------------------------------

/// Parse one filament record:
///
/// ```text
/// <cp1> <cp2> <nsamp>
///  <coord...>              × nsamp
/// ```
///
/// The width of the first sample line fixes the layout for the whole record:
/// `ndim` fields are coordinates, `ndim + 1` fields carry a leading tag that
/// is skipped.
pub fn parse_filament(rows: &[Row<'_>], ndim: usize) -> Result<Filament> {
    let (header, sample_rows) = rows
        .split_first()
        .ok_or_else(|| SkeletonError::invalid_line(0, "empty filament record"))?;
    let endpoint_a = CriticalPointId(header.parse(0)?);
    let endpoint_b = CriticalPointId(header.parse(1)?);
    let nsamp: usize = header.parse(2)?;

    let width = sample_rows.first().map_or(ndim, |r| r.fields.len());
    let skip = match width.checked_sub(ndim) {
        Some(skip @ (0 | 1)) => skip,
        _ => {
            return Err(SkeletonError::mismatch(
                format!("coordinates per sample of filament at line {}", header.line),
                ndim,
                width,
            ))
        }
    };

    let samples = sample_rows
        .iter()
        .map(|row| {
            if row.fields.len() != width {
                return Err(SkeletonError::mismatch(
                    format!("fields on sample line {}", row.line),
                    width,
                    row.fields.len(),
                ));
            }
            row.parse_floats(skip..width)
        })
        .collect::<Result<Vec<_>>>()?;

    if samples.len() != nsamp {
        return Err(SkeletonError::mismatch(
            format!("samples of filament at line {}", header.line),
            nsamp,
            samples.len(),
        ));
    }

    Ok(Filament {
        endpoint_a,
        endpoint_b,
        samples,
    })
}

pub fn parse_critical_points(
    section: &[&str],
    first_line: usize,
    ndim: usize,
) -> Result<Vec<CriticalPoint>> {
    parse_record_list(section, first_line, "critical point", |rows| {
        parse_critical_point(rows, ndim)
    })
}

pub fn parse_filaments(section: &[&str], first_line: usize, ndim: usize) -> Result<Vec<Filament>> {
    parse_record_list(section, first_line, "filament", |rows| parse_filament(rows, ndim))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows<'a>(lines: &[&'a str]) -> Vec<Row<'a>> {
        blocks::tokenize(lines, 0)
    }

    #[test]
    fn critical_point_with_connections() {
        let r = rows(&["3 0.5 1.5 2.5 10.0 4 0", " 2", " 1 7", " 2 8"]);
        let cp = parse_critical_point(&r, 3).unwrap();
        assert_eq!(cp.point_type, 3);
        assert_eq!(cp.position, vec![0.5, 1.5, 2.5]);
        assert_eq!(cp.value, 10.0);
        assert_eq!(cp.pair, CriticalPointId(4));
        assert!(!cp.is_boundary());
        assert_eq!(
            cp.connections,
            vec![
                Connection { destination: CriticalPointId(1), filament: FilamentId(7) },
                Connection { destination: CriticalPointId(2), filament: FilamentId(8) },
            ]
        );
    }

    #[test]
    fn tagged_continuation_lines() {
        let r = rows(&["0 0 0 1 0 1", " c 1", " c 5 9"]);
        let cp = parse_critical_point(&r, 2).unwrap();
        assert_eq!(cp.connections.len(), 1);
        assert_eq!(cp.connections[0].destination, CriticalPointId(5));
        assert!(cp.is_boundary());
    }

    #[test]
    fn connection_count_mismatch() {
        let r = rows(&["0 0 0 0 1 0 0", " 2", " 1 7"]);
        let err = parse_critical_point(&r, 3).unwrap_err();
        assert!(matches!(
            err,
            SkeletonError::StructuralMismatch { declared: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn count_line_with_extra_fields_is_rejected() {
        let r = rows(&["0 0 0 0 1 0 0", " c 9 1", " c 0 4"]);
        assert!(matches!(
            parse_critical_point(&r, 3).unwrap_err(),
            SkeletonError::InvalidLine { line: 2, .. }
        ));
    }

    #[test]
    fn connection_line_with_extra_fields_is_rejected() {
        let r = rows(&["0 0 0 0 1 0 0", " c 1", " c 0 4 0 0"]);
        assert!(matches!(
            parse_critical_point(&r, 3).unwrap_err(),
            SkeletonError::InvalidLine { line: 3, .. }
        ));
    }

    #[test]
    fn connection_line_with_one_field_is_rejected() {
        let r = rows(&["0 0 0 0 1 0 0", " 1", " 4"]);
        assert!(matches!(
            parse_critical_point(&r, 3).unwrap_err(),
            SkeletonError::InvalidLine { line: 3, .. }
        ));
    }

    #[test]
    fn critical_point_dimensionality_must_match() {
        let r = rows(&["0 0 0 1 0 0", " 0"]);
        assert!(parse_critical_point(&r, 3).is_err());
    }

    #[test]
    fn missing_count_line() {
        let r = rows(&["0 0 0 0 1 0 0"]);
        assert!(matches!(
            parse_critical_point(&r, 3).unwrap_err(),
            SkeletonError::InvalidLine { .. }
        ));
    }

    #[test]
    fn filament_samples_plain_and_tagged() {
        let plain = rows(&["0 1 2", " 0 0", " 1 1"]);
        let fil = parse_filament(&plain, 2).unwrap();
        assert_eq!(fil.samples, vec![vec![0.0, 0.0], vec![1.0, 1.0]]);

        let tagged = rows(&["0 1 2", " s 0 0", " s 1 1"]);
        assert_eq!(parse_filament(&tagged, 2).unwrap().samples, fil.samples);
    }

    #[test]
    fn filament_sample_count_mismatch() {
        let r = rows(&["0 1 3", " 0 0", " 1 1"]);
        let err = parse_filament(&r, 2).unwrap_err();
        assert!(matches!(
            err,
            SkeletonError::StructuralMismatch { declared: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn filament_ragged_samples() {
        let r = rows(&["0 1 2", " 0 0", " 1 1 1"]);
        assert!(parse_filament(&r, 2).is_err());
    }

    #[test]
    fn segmenter_splits_on_unindented_lines() {
        let section = [
            "[FILAMENTS]",
            "2",
            "0 1 1",
            " 0 0",
            "1 2 2",
            " 1 1",
            " 2 2",
        ];
        let fils = parse_filaments(&section, 40, 2).unwrap();
        assert_eq!(fils.len(), 2);
        assert_eq!(fils[1].endpoint_b, CriticalPointId(2));
        assert_eq!(fils[1].samples.len(), 2);
    }

    #[test]
    fn segmenter_record_count_mismatch() {
        let section = ["[FILAMENTS]", "3", "0 1 1", " 0 0"];
        let err = parse_filaments(&section, 0, 2).unwrap_err();
        assert!(matches!(
            err,
            SkeletonError::StructuralMismatch { declared: 3, actual: 1, .. }
        ));
    }

    #[test]
    fn segmenter_rejects_leading_continuation() {
        let section = ["[FILAMENTS]", "1", " 0 0", "0 1 1", " 0 0"];
        assert!(matches!(
            parse_filaments(&section, 0, 2).unwrap_err(),
            SkeletonError::InvalidLine { line: 3, .. }
        ));
    }

    #[test]
    fn empty_section() {
        let section = ["[CRITICAL POINTS]", "0"];
        assert!(parse_critical_points(&section, 0, 3).unwrap().is_empty());
        assert!(parse_critical_points(&section[..1], 0, 3).is_err());
    }
}

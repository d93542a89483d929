use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use super::blocks::{self, MAGIC};
use super::filter::{self, SelectionState};
use super::model::{BoundingBox, Connection, CriticalPoint, CriticalPointId, Filament, FilamentId};
use super::records;
use super::table::{self, AttributeTable};
use crate::error::{Result, SkeletonError};

// ---------------------------------------------------------------------------
// Skeleton – the fully parsed content of one NDskl file
// ---------------------------------------------------------------------------

/// Critical points, filaments and their attribute tables.
///
/// Entities reference each other by index ([`CriticalPointId`],
/// [`FilamentId`]); the skeleton owns everything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skeleton {
    pub header: String,
    pub ndim: usize,
    /// Free-form lines between the dimensionality and the BBOX line.
    pub comments: Vec<String>,
    pub bbox: BoundingBox,
    pub critical_points: Vec<CriticalPoint>,
    pub filaments: Vec<Filament>,
    pub critical_point_data: AttributeTable,
    pub filament_data: AttributeTable,
}

impl Skeleton {
    /// Parse the full text of an NDskl ASCII file.
    pub fn parse_str(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        Self::parse_lines(&lines)
    }

    pub fn parse_lines(lines: &[&str]) -> Result<Self> {
        // 1. header
        let first = lines.first().copied().unwrap_or("");
        if first.trim_end() != MAGIC {
            return Err(SkeletonError::MagicMismatch {
                found: first.to_string(),
            });
        }

        // 2. ndim
        let ndim_line = lines
            .get(1)
            .ok_or_else(|| SkeletonError::invalid_line(2, "missing dimensionality"))?;
        let ndim = blocks::parse_count(ndim_line, 2)?;
        if ndim == 0 {
            return Err(SkeletonError::invalid_line(2, "dimensionality must be positive"));
        }

        let sections = blocks::section_ranges(lines)?;
        debug!("sections: {sections:?}");

        // 3. comments
        let comments = lines[2.min(sections.bbox.start)..sections.bbox.start]
            .iter()
            .map(|s| s.to_string())
            .collect();

        // 4. bbox (single line)
        let bbox = parse_bbox(lines[sections.bbox.start], sections.bbox.start + 1, ndim)?;

        // 5. critical points
        let critical_points = records::parse_critical_points(
            &lines[sections.critical_points.clone()],
            sections.critical_points.start,
            ndim,
        )?;

        // 6. filaments
        let filaments = records::parse_filaments(
            &lines[sections.filaments.clone()],
            sections.filaments.start,
            ndim,
        )?;

        // 7. + 8. attribute tables
        let critical_point_data = table::parse_attribute_section(
            &lines[sections.critical_points_data.clone()],
            sections.critical_points_data.start,
        )?;
        let filament_data = table::parse_attribute_section(
            &lines[sections.filaments_data.clone()],
            sections.filaments_data.start,
        )?;

        let skeleton = Skeleton {
            header: first.trim_end().to_string(),
            ndim,
            comments,
            bbox,
            critical_points,
            filaments,
            critical_point_data,
            filament_data,
        };
        skeleton.validate_references()?;
        Ok(skeleton)
    }

    /// Check that every stored index resolves and that each table has one
    /// row per entity.
    pub fn validate_references(&self) -> Result<()> {
        let n_cp = self.critical_points.len();
        let n_fil = self.filaments.len();

        for (i, cp) in self.critical_points.iter().enumerate() {
            check_index(cp.pair.0, n_cp, || format!("pair of critical point {i}"))?;
            for conn in &cp.connections {
                check_index(conn.destination.0, n_cp, || {
                    format!("connection destination of critical point {i}")
                })?;
                check_index(conn.filament.0, n_fil, || {
                    format!("connection filament of critical point {i}")
                })?;
            }
        }
        for (i, fil) in self.filaments.iter().enumerate() {
            for end in fil.endpoints() {
                check_index(end.0, n_cp, || format!("endpoint of filament {i}"))?;
            }
        }

        if self.critical_point_data.n_rows() != n_cp {
            return Err(SkeletonError::mismatch(
                "rows in critical point data",
                n_cp,
                self.critical_point_data.n_rows(),
            ));
        }
        if self.filament_data.n_rows() != n_fil {
            return Err(SkeletonError::mismatch(
                "rows in filament data",
                n_fil,
                self.filament_data.n_rows(),
            ));
        }
        Ok(())
    }

    pub fn critical_point(&self, id: CriticalPointId) -> Option<&CriticalPoint> {
        self.critical_points.get(id.0)
    }

    pub fn filament(&self, id: FilamentId) -> Option<&Filament> {
        self.filaments.get(id.0)
    }

    /// Connections leaving `id`; empty for an unknown id.
    pub fn neighbors(&self, id: CriticalPointId) -> impl Iterator<Item = Connection> + '_ {
        self.critical_point(id)
            .into_iter()
            .flat_map(|cp| cp.connections.iter().copied())
    }

    /// Critical points passing an attribute selection.
    pub fn critical_points_where(&self, selection: &SelectionState) -> Vec<CriticalPointId> {
        filter::selected_indices(&self.critical_point_data, selection)
            .into_iter()
            .map(CriticalPointId)
            .collect()
    }

    /// Filaments passing an attribute selection.
    pub fn filaments_where(&self, selection: &SelectionState) -> Vec<FilamentId> {
        filter::selected_indices(&self.filament_data, selection)
            .into_iter()
            .map(FilamentId)
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn check_index(idx: usize, len: usize, what: impl FnOnce() -> String) -> Result<()> {
    if idx < len {
        Ok(())
    } else {
        Err(SkeletonError::DanglingReference {
            what: what(),
            index: idx,
            len,
        })
    }
}

/// `BBOX <origin> <extent>` with two tuple literals of length `ndim`.
fn parse_bbox(line: &str, line_no: usize, ndim: usize) -> Result<BoundingBox> {
    let rest = line
        .split_once(blocks::BBOX_MARKER)
        .map_or(line, |(_, rest)| rest);
    let mut groups = blocks::parse_tuple_literals(rest, line_no)?;
    if groups.len() != 2 {
        return Err(SkeletonError::mismatch(
            format!("vectors on BBOX line {line_no}"),
            2,
            groups.len(),
        ));
    }
    for g in &groups {
        if g.len() != ndim {
            return Err(SkeletonError::mismatch(
                format!("BBOX vector length on line {line_no}"),
                ndim,
                g.len(),
            ));
        }
    }
    let extent = groups.pop().unwrap_or_default();
    let origin = groups.pop().unwrap_or_default();
    Ok(BoundingBox { origin, extent })
}

// ---------------------------------------------------------------------------
// SkeletonDocument – a file on disk and its load state
// ---------------------------------------------------------------------------

/// Where a document is in its life: `Empty → Loaded` or `Empty → Failed`.
/// Loading is a single blocking call, so there is no observable in-between.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Empty,
    Loaded(Box<Skeleton>),
    /// The last load failed; nothing from it is kept.
    Failed,
}

/// A skeleton file path plus the result of loading it.
#[derive(Debug, Clone, Default)]
pub struct SkeletonDocument {
    path: Option<PathBuf>,
    state: LoadState,
}

impl SkeletonDocument {
    /// A document with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        SkeletonDocument {
            path: Some(path.into()),
            state: LoadState::Empty,
        }
    }

    /// Convenience: read and parse `path` in one go.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut doc = Self::with_path(path);
        doc.load_data()?;
        Ok(doc)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    /// The parsed content, only after a successful load.
    pub fn skeleton(&self) -> Option<&Skeleton> {
        match &self.state {
            LoadState::Loaded(skel) => Some(skel),
            _ => None,
        }
    }

    /// Read the backing file and parse it.
    ///
    /// On any error the document moves to [`LoadState::Failed`] and keeps
    /// no partial content.
    pub fn load_data(&mut self) -> Result<()> {
        let skel = self
            .read_and_parse()
            .inspect_err(|_| self.state = LoadState::Failed)?;
        info!(
            "loaded skeleton: {}D, {} critical points, {} filaments",
            skel.ndim,
            skel.critical_points.len(),
            skel.filaments.len()
        );
        self.state = LoadState::Loaded(Box::new(skel));
        Ok(())
    }

    fn read_and_parse(&self) -> Result<Skeleton> {
        let path = self.path.as_deref().ok_or_else(|| SkeletonError::FileNotFound {
            path: PathBuf::new(),
        })?;
        if !path.is_file() {
            return Err(SkeletonError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Skeleton::parse_str(&text)
    }
}

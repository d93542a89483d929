//! Builders for synthetic NDskl text.

#![allow(dead_code)]

use std::path::PathBuf;

/// Path of a file under `tests/data`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Assembles an NDskl file section by section.
pub struct SkeletonText {
    pub ndim: usize,
    pub comments: Vec<String>,
    pub bbox: String,
    pub cp_count: Option<usize>,
    pub critical_points: Vec<String>,
    pub fil_count: Option<usize>,
    pub filaments: Vec<String>,
    pub cp_data: Vec<String>,
    pub fil_data: Vec<String>,
}

impl SkeletonText {
    /// One 3-D critical point without connections, one filament with two
    /// samples, and one-column data tables for both.
    pub fn minimal() -> Self {
        SkeletonText {
            ndim: 3,
            comments: vec!["#a comment".into()],
            bbox: "BBOX [0,0,0] [1,1,1]".into(),
            cp_count: None,
            critical_points: vec!["3 0.5 0.5 0.5 1.0 0 0".into(), " 0".into()],
            fil_count: None,
            filaments: vec![
                "0 0 2".into(),
                " 0.5 0.5 0.5".into(),
                " 0.6 0.6 0.6".into(),
            ],
            cp_data: vec!["1".into(), "field_value".into(), "1.0".into()],
            fil_data: vec!["1".into(), "length".into(), "0.17".into()],
        }
    }

    fn count_records(lines: &[String]) -> usize {
        lines.iter().filter(|l| !l.starts_with(' ')).count()
    }

    pub fn render(&self) -> String {
        let mut lines: Vec<String> = vec!["ANDSKEL".into(), self.ndim.to_string()];
        lines.extend(self.comments.iter().cloned());
        lines.push(self.bbox.clone());

        lines.push("[CRITICAL POINTS]".into());
        let n_cp = self
            .cp_count
            .unwrap_or_else(|| Self::count_records(&self.critical_points));
        lines.push(n_cp.to_string());
        lines.extend(self.critical_points.iter().cloned());

        lines.push("[FILAMENTS]".into());
        let n_fil = self
            .fil_count
            .unwrap_or_else(|| Self::count_records(&self.filaments));
        lines.push(n_fil.to_string());
        lines.extend(self.filaments.iter().cloned());

        lines.push("[CRITICAL POINTS DATA]".into());
        lines.extend(self.cp_data.iter().cloned());
        lines.push("[FILAMENTS DATA]".into());
        lines.extend(self.fil_data.iter().cloned());

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Parameters for a correlation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsParams {
    /// Pixels strictly above this value are active.
    pub threshold: f64,
    /// First radius bin edge.
    pub rmin: f64,
    /// Bins start below this radius.
    pub rmax: f64,
    /// Bin width.
    pub dr: f64,
}

impl Default for StatsParams {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            rmin: 0.0,
            rmax: 10.0,
            dr: 1.0,
        }
    }
}

impl StatsParams {
    pub fn from_json_str(text: &str) -> Result<Self, StatsError> {
        let params: StatsParams =
            serde_json::from_str(text).map_err(|e| StatsError::Config(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, StatsError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), StatsError> {
        if !(self.dr.is_finite() && self.dr > 0.0) {
            return Err(StatsError::Config(format!("dr must be positive, got {}", self.dr)));
        }
        if !(self.rmin.is_finite() && self.rmin >= 0.0) {
            return Err(StatsError::Config(format!("rmin must be non-negative, got {}", self.rmin)));
        }
        if !(self.rmax.is_finite() && self.rmax > self.rmin) {
            return Err(StatsError::Config(format!(
                "rmax ({}) must exceed rmin ({})",
                self.rmax, self.rmin
            )));
        }
        Ok(())
    }

    /// Lower bin edges `rmin, rmin + dr, ...` strictly below `rmax`.
    pub fn radii(&self) -> Vec<f64> {
        let n = ((self.rmax - self.rmin) / self.dr).ceil().max(0.0) as usize;
        (0..n).map(|k| self.rmin + k as f64 * self.dr).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let p = StatsParams::from_json_str(r#"{ "threshold": 0.5, "rmax": 4 }"#).unwrap();
        assert_eq!(p.threshold, 0.5);
        assert_eq!(p.rmin, 0.0);
        assert_eq!(p.dr, 1.0);
        assert_eq!(p.radii(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn rejects_bad_bins() {
        assert!(StatsParams::from_json_str(r#"{ "dr": 0 }"#).is_err());
        assert!(StatsParams::from_json_str(r#"{ "rmin": 5, "rmax": 2 }"#).is_err());
        assert!(StatsParams::from_json_str("not json").is_err());
    }

    #[test]
    fn radii_stop_below_rmax() {
        let p = StatsParams {
            rmin: 1.0,
            rmax: 2.0,
            dr: 0.5,
            ..Default::default()
        };
        assert_eq!(p.radii(), vec![1.0, 1.5]);
    }
}

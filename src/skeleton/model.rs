use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Index handles
// ---------------------------------------------------------------------------

/// Position of a critical point in [`Skeleton::critical_points`](super::document::Skeleton).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CriticalPointId(pub usize);

/// Position of a filament in [`Skeleton::filaments`](super::document::Skeleton).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FilamentId(pub usize);

impl fmt::Display for CriticalPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cp#{}", self.0)
    }
}

impl fmt::Display for FilamentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fil#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Bounding box
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Lower corner.
    pub origin: Vec<f64>,
    /// Size along each axis.
    pub extent: Vec<f64>,
}

impl BoundingBox {
    /// Upper corner (`origin + extent`).
    pub fn upper(&self) -> Vec<f64> {
        self.origin
            .iter()
            .zip(&self.extent)
            .map(|(o, d)| o + d)
            .collect()
    }

    /// Whether `position` lies inside the box (edges included).
    pub fn contains(&self, position: &[f64]) -> bool {
        position.len() == self.origin.len()
            && position
                .iter()
                .zip(self.origin.iter().zip(&self.extent))
                .all(|(p, (o, d))| *p >= *o && *p <= o + d)
    }
}

// ---------------------------------------------------------------------------
// CriticalPoint
// ---------------------------------------------------------------------------

/// "This critical point reaches `destination` through `filament`."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub destination: CriticalPointId,
    pub filament: FilamentId,
}

/// A point where the field gradient vanishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPoint {
    /// Topological type; the Morse index (0 = minimum, ndim = maximum).
    pub point_type: i32,
    pub position: Vec<f64>,
    /// Field value at `position`.
    pub value: f64,
    /// Persistence pair. Unpaired points reference themselves.
    pub pair: CriticalPointId,
    /// Non-zero when the point sits on the domain boundary.
    pub boundary: i32,
    pub connections: Vec<Connection>,
}

impl CriticalPoint {
    pub fn is_boundary(&self) -> bool {
        self.boundary != 0
    }

    pub fn ndim(&self) -> usize {
        self.position.len()
    }
}

// ---------------------------------------------------------------------------
// Filament
// ---------------------------------------------------------------------------

/// A ridge path between two critical points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filament {
    pub endpoint_a: CriticalPointId,
    pub endpoint_b: CriticalPointId,
    /// Sample positions from `endpoint_a` towards `endpoint_b`.
    pub samples: Vec<Vec<f64>>,
}

impl Filament {
    pub fn endpoints(&self) -> [CriticalPointId; 2] {
        [self.endpoint_a, self.endpoint_b]
    }

    /// Polyline length through the samples.
    pub fn length(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|w| {
                w[0].iter()
                    .zip(&w[1])
                    .map(|(a, b)| (b - a) * (b - a))
                    .sum::<f64>()
                    .sqrt()
            })
            .sum()
    }
}

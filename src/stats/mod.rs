//! Two- and three-point statistics of a thresholded 2-D field.
//!
//! The pixels above a noise threshold are indexed once in an R-tree. All
//! pair and triplet queries are built from one primitive, "every index within
//! radius `r`" (strictly less than `r`), so an annulus `[r, r + dr)` is the
//! difference of two such queries.

pub mod config;
pub mod geometry;
pub mod profile;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use ndarray::ArrayView2;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use self::config::StatsParams;
use self::geometry::{pairwise_angle, Segment, Vec2};
use crate::error::StatsError;

/// An active pixel position tagged with its index into the session arrays.
type IndexedPixel = GeomWithData<Vec2, usize>;

/// Unordered index pair, stored with the smaller index first.
pub type Pair = (usize, usize);

/// `[center, a, b]`: a center and two of its ring neighbours.
pub type Triplet = [usize; 3];

// ---------------------------------------------------------------------------
// BinKey – f64 map key with exact-match semantics
// ---------------------------------------------------------------------------

/// A float used as a map key. Equality is bitwise-exact (via `total_cmp`),
/// so two angles land in the same group only if they are the same `f64`.
#[derive(Debug, Clone, Copy)]
pub struct BinKey(pub f64);

impl PartialEq for BinKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BinKey {}

impl PartialOrd for BinKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BinKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

// ---------------------------------------------------------------------------
// ImageStatistics – one field snapshot and its cached results
// ---------------------------------------------------------------------------

/// Active pixels of one field snapshot plus every statistic computed so far.
pub struct ImageStatistics {
    threshold: f64,
    /// `(row, col)` of every active pixel, row-major order.
    coords: Vec<[usize; 2]>,
    values: Vec<f64>,
    mean: f64,
    tree: RTree<IndexedPixel>,
    pair_bins: BTreeMap<BinKey, BTreeSet<Pair>>,
    two_point: BTreeMap<BinKey, Option<f64>>,
    triplet_groups: BTreeMap<BinKey, Vec<Triplet>>,
}

impl ImageStatistics {
    /// Select the pixels strictly above `threshold` and index them.
    pub fn build_index(field: ArrayView2<'_, f64>, threshold: f64) -> Result<Self, StatsError> {
        if field.is_empty() {
            return Err(StatsError::EmptyField);
        }

        let mut coords = Vec::new();
        let mut values = Vec::new();
        for ((i, j), &v) in field.indexed_iter() {
            if v > threshold {
                coords.push([i, j]);
                values.push(v);
            }
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        let tree = RTree::bulk_load(
            coords
                .iter()
                .enumerate()
                .map(|(k, &[i, j])| GeomWithData::new([i as f64, j as f64], k))
                .collect(),
        );
        debug!(
            "indexed {} of {} pixels above {threshold} (mean {mean})",
            coords.len(),
            field.len()
        );

        Ok(ImageStatistics {
            threshold,
            coords,
            values,
            mean,
            tree,
            pair_bins: BTreeMap::new(),
            two_point: BTreeMap::new(),
            triplet_groups: BTreeMap::new(),
        })
    }

    /// Build the index and bin all pairs for the radii in `params`.
    pub fn from_params(
        field: ArrayView2<'_, f64>,
        params: &StatsParams,
    ) -> Result<Self, StatsError> {
        params.validate()?;
        let mut stats = Self::build_index(field, params.threshold)?;
        stats.all_pairs_annulus(params.rmin, params.rmax, params.dr)?;
        Ok(stats)
    }

    /// Number of active pixels.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Mean of the active pixel values; NaN when nothing is active.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn coords(&self) -> &[[usize; 2]] {
        &self.coords
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn pair_bins(&self) -> &BTreeMap<BinKey, BTreeSet<Pair>> {
        &self.pair_bins
    }

    pub fn triplet_groups(&self) -> &BTreeMap<BinKey, Vec<Triplet>> {
        &self.triplet_groups
    }

    fn position(&self, k: usize) -> Vec2 {
        let [i, j] = self.coords[k];
        [i as f64, j as f64]
    }

    /// Indices strictly closer than `r` to `center`.
    fn ball(&self, center: Vec2, r: f64) -> BTreeSet<usize> {
        let r2 = r * r;
        self.tree
            .locate_within_distance(center, r2)
            .filter(|p| {
                let [x, y] = *p.geom();
                let (dx, dy) = (x - center[0], y - center[1]);
                dx * dx + dy * dy < r2
            })
            .map(|p| p.data)
            .collect()
    }

    /// Every pair closer than `r`.
    fn pairs_within(&self, r: f64) -> BTreeSet<Pair> {
        let mut pairs = BTreeSet::new();
        for k in 0..self.len() {
            for j in self.ball(self.position(k), r) {
                if j > k {
                    pairs.insert((k, j));
                }
            }
        }
        pairs
    }

    /// Pairs whose separation lies in `[r, r + dr)`.
    pub fn pairs_in_annulus(&self, r: f64, dr: f64) -> Result<BTreeSet<Pair>, StatsError> {
        check_bracket(r, dr)?;
        let lower = self.pairs_within(r);
        let upper = self.pairs_within(r + dr);
        Ok(upper.difference(&lower).copied().collect())
    }

    /// Fill the pair bins for `r = rmin, rmin + dr, ...` below `rmax`.
    pub fn all_pairs_annulus(
        &mut self,
        rmin: f64,
        rmax: f64,
        dr: f64,
    ) -> Result<&BTreeMap<BinKey, BTreeSet<Pair>>, StatsError> {
        let params = StatsParams {
            threshold: self.threshold,
            rmin,
            rmax,
            dr,
        };
        params.validate()?;
        for r in params.radii() {
            let pairs = self.pairs_in_annulus(r, dr)?;
            debug!("annulus [{r}, {}): {} pairs", r + dr, pairs.len());
            self.pair_bins.insert(BinKey(r), pairs);
        }
        Ok(&self.pair_bins)
    }

    /// Mean of `(v_i / mean - 1) * (v_j / mean - 1)` over the pairs of every
    /// binned radius. Bins without pairs get `None`.
    pub fn two_point_correlation(&mut self) -> &BTreeMap<BinKey, Option<f64>> {
        let estimates: BTreeMap<BinKey, Option<f64>> = self
            .pair_bins
            .iter()
            .map(|(&r, pairs)| {
                let estimate = (!pairs.is_empty()).then(|| {
                    let delta = |k: usize| self.values[k] / self.mean - 1.0;
                    let sum: f64 = pairs.iter().map(|&(i, j)| delta(i) * delta(j)).sum();
                    sum / pairs.len() as f64
                });
                (r, estimate)
            })
            .collect();
        self.two_point = estimates;
        &self.two_point
    }

    /// Group `[center, a, b]` triplets by the angle at the center.
    ///
    /// For every active pixel the ring neighbours in `[r, r + dr)` are found
    /// with two ball queries; every unordered pair of ring neighbours forms a
    /// triplet with the center, and the angle is taken between the legs
    /// `a - center` and `b - center`. Centers with fewer than two ring
    /// neighbours contribute nothing. Groups are keyed by the exact angle.
    ///
    /// The angle is measured at the center pixel, not at one of the ring points.
    pub fn three_point_equal_radius(
        &mut self,
        r: f64,
        dr: f64,
    ) -> Result<&BTreeMap<BinKey, Vec<Triplet>>, StatsError> {
        check_bracket(r, dr)?;

        let mut groups: BTreeMap<BinKey, Vec<Triplet>> = BTreeMap::new();
        for c in 0..self.len() {
            let center = self.position(c);
            let lower = self.ball(center, r);
            let mut ring: Vec<usize> = self
                .ball(center, r + dr)
                .difference(&lower)
                .copied()
                .collect();
            ring.retain(|&k| k != c);
            if ring.len() < 2 {
                continue;
            }

            let mut triplets = Vec::new();
            let mut legs: Vec<(Segment, Segment)> = Vec::new();
            for (n, &a) in ring.iter().enumerate() {
                for &b in &ring[n + 1..] {
                    triplets.push([c, a, b]);
                    legs.push(([center, self.position(a)], [center, self.position(b)]));
                }
            }
            for (triplet, angle) in triplets.into_iter().zip(pairwise_angle(&legs)) {
                groups.entry(BinKey(angle)).or_default().push(triplet);
            }
        }

        debug!(
            "three-point r = {r}, dr = {dr}: {} triplets in {} angle groups",
            groups.values().map(Vec::len).sum::<usize>(),
            groups.len()
        );
        self.triplet_groups = groups;
        Ok(&self.triplet_groups)
    }
}

fn check_bracket(r: f64, dr: f64) -> Result<(), StatsError> {
    if r.is_finite() && r >= 0.0 && dr.is_finite() && dr > 0.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidRadius { r, dr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn single_active_pixel() {
        let mut field = Array2::<f64>::zeros((5, 5));
        field[[2, 3]] = 4.0;
        let mut stats = ImageStatistics::build_index(field.view(), 1.0).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.coords(), [[2, 3]]);
        assert_eq!(stats.mean(), 4.0);

        for r in [0.0, 0.5, 1.0, 3.0] {
            assert!(stats.pairs_in_annulus(r, 1.0).unwrap().is_empty());
        }
        stats.all_pairs_annulus(0.0, 5.0, 1.0).unwrap();
        let twopt = stats.two_point_correlation();
        assert_eq!(twopt.len(), 5);
        assert!(twopt.values().all(Option::is_none));
    }

    #[test]
    fn annulus_is_half_open() {
        let field = array![[1.0, 1.0, 0.0, 1.0]];
        let stats = ImageStatistics::build_index(field.view(), 0.5).unwrap();
        // pixels at columns 0, 1, 3 -> indices 0, 1, 2
        assert_eq!(stats.pairs_in_annulus(1.0, 1.0).unwrap(), BTreeSet::from([(0, 1)]));
        assert_eq!(stats.pairs_in_annulus(2.0, 1.0).unwrap(), BTreeSet::from([(1, 2)]));
        assert_eq!(stats.pairs_in_annulus(0.0, 1.0).unwrap(), BTreeSet::new());
    }

    #[test]
    fn bad_bracket() {
        let field = array![[1.0]];
        let stats = ImageStatistics::build_index(field.view(), 0.0).unwrap();
        assert!(stats.pairs_in_annulus(-1.0, 1.0).is_err());
        assert!(stats.pairs_in_annulus(1.0, 0.0).is_err());
    }

    #[test]
    fn empty_field() {
        let field = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            ImageStatistics::build_index(field.view(), 0.0),
            Err(StatsError::EmptyField)
        ));
    }

    #[test]
    fn two_point_of_two_pixels() {
        // mean = 2, deviations -0.5 and +0.5
        let field = array![[1.0, 3.0]];
        let mut stats = ImageStatistics::build_index(field.view(), 0.0).unwrap();
        stats.all_pairs_annulus(0.5, 2.5, 1.0).unwrap();
        let twopt = stats.two_point_correlation();
        assert_eq!(twopt[&BinKey(0.5)], Some(-0.25));
        assert_eq!(twopt[&BinKey(1.5)], None);
    }

    #[test]
    fn right_angle_triplet() {
        let field = array![[1.0, 1.0], [1.0, 0.0]];
        let mut stats = ImageStatistics::build_index(field.view(), 0.5).unwrap();
        let groups = stats.three_point_equal_radius(0.9, 0.2).unwrap();
        assert_eq!(groups.len(), 1);
        let (angle, triplets) = groups.iter().next().unwrap();
        assert!((angle.0 - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(triplets, &vec![[0, 1, 2]]);
    }

    #[test]
    fn bin_key_exact_match() {
        assert_eq!(BinKey(0.1 + 0.2), BinKey(0.1 + 0.2));
        assert_ne!(BinKey(0.1 + 0.2), BinKey(0.3));
    }
}

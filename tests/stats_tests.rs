use std::collections::BTreeSet;
use std::f64::consts::{FRAC_PI_2, PI};

use ndarray::{array, Array2};
use ndskel::stats::profile::nfw_rho_profile;
use ndskel::{ImageStatistics, Pair, StatsParams};

/// Deterministic bumpy field with roughly half the pixels above 1.0.
fn bumpy_field(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(i, j)| {
        let (x, y) = (i as f64, j as f64);
        1.0 + (0.7 * x).sin() * (0.4 * y + 0.3).cos() + 0.01 * (i * n + j) as f64 / (n * n) as f64
    })
}

#[test]
fn one_active_pixel_has_no_statistics() {
    let mut field = Array2::<f64>::zeros((5, 5));
    field[[1, 1]] = 2.0;
    let params = StatsParams {
        threshold: 0.5,
        rmin: 0.0,
        rmax: 6.0,
        dr: 0.5,
    };
    let mut stats = ImageStatistics::from_params(field.view(), &params).unwrap();
    assert_eq!(stats.len(), 1);
    assert!(stats.pair_bins().values().all(BTreeSet::is_empty));
    assert!(stats.two_point_correlation().values().all(Option::is_none));
    assert!(stats.three_point_equal_radius(0.0, 5.0).unwrap().is_empty());
}

#[test]
fn annuli_partition_all_pairs() {
    let field = bumpy_field(9);
    let stats = ImageStatistics::build_index(field.view(), 1.0).unwrap();
    assert!(stats.len() > 5);

    let rmax = 6.0;
    let dr = 0.75;
    let mut union: BTreeSet<Pair> = BTreeSet::new();
    let mut total = 0;
    let mut r = 0.0;
    while r < rmax {
        let ring = stats.pairs_in_annulus(r, dr).unwrap();
        assert!(ring.is_disjoint(&union), "annulus at r = {r} overlaps an earlier one");
        total += ring.len();
        union.extend(ring);
        r += dr;
    }
    let all = stats.pairs_in_annulus(0.0, rmax).unwrap();
    assert_eq!(union, all);
    assert_eq!(total, all.len());
    assert!(all.iter().all(|&(i, j)| i < j));
}

#[test]
fn annulus_respects_distance_bracket() {
    let field = bumpy_field(8);
    let stats = ImageStatistics::build_index(field.view(), 1.0).unwrap();
    let (r, dr) = (2.0, 1.5);
    for (i, j) in stats.pairs_in_annulus(r, dr).unwrap() {
        let [ai, aj] = stats.coords()[i];
        let [bi, bj] = stats.coords()[j];
        let d = ((ai as f64 - bi as f64).powi(2) + (aj as f64 - bj as f64).powi(2)).sqrt();
        assert!(d >= r && d < r + dr, "pair ({i}, {j}) at distance {d}");
    }
}

#[test]
fn two_point_estimate_of_uniform_field_is_zero() {
    let field = Array2::<f64>::from_elem((4, 4), 3.0);
    let params = StatsParams {
        threshold: 1.0,
        rmin: 1.0,
        rmax: 3.0,
        dr: 1.0,
    };
    let mut stats = ImageStatistics::from_params(field.view(), &params).unwrap();
    assert_eq!(stats.mean(), 3.0);
    let twopt = stats.two_point_correlation();
    assert_eq!(twopt.len(), 2);
    assert!(twopt.values().all(|v| *v == Some(0.0)));
}

#[test]
fn right_triangle_gives_one_right_angle() {
    let field = array![[0.0, 0.0, 0.0], [0.0, 5.0, 5.0], [0.0, 5.0, 0.0]];
    let mut stats = ImageStatistics::build_index(field.view(), 1.0).unwrap();
    assert_eq!(stats.len(), 3);

    let groups = stats.three_point_equal_radius(0.95, 0.1).unwrap();
    let triplets: Vec<_> = groups.values().flatten().collect();
    assert_eq!(triplets.len(), 1);
    let (angle, _) = groups.iter().next().unwrap();
    assert!((angle.0 - FRAC_PI_2).abs() < 1e-12);
}

#[test]
fn triplets_are_distinct_and_angles_bounded() {
    let field = bumpy_field(10);
    let mut stats = ImageStatistics::build_index(field.view(), 1.0).unwrap();
    let groups = stats.three_point_equal_radius(1.0, 1.5).unwrap();
    assert!(!groups.is_empty());

    for (angle, triplets) in groups {
        assert!(angle.0 >= 0.0 && angle.0 <= PI, "angle {} out of range", angle.0);
        for t in triplets {
            assert!(t[0] != t[1] && t[1] != t[2] && t[0] != t[2], "degenerate triplet {t:?}");
        }
    }
    let cached: usize = stats.triplet_groups().values().map(Vec::len).sum();
    assert!(cached > 0);
}

#[test]
fn params_from_json_drive_a_run() {
    let params =
        StatsParams::from_json_str(r#"{"threshold": 1.0, "rmin": 1.0, "rmax": 4.0, "dr": 1.0}"#)
            .unwrap();
    let field = bumpy_field(7);
    let stats = ImageStatistics::from_params(field.view(), &params).unwrap();
    assert_eq!(stats.pair_bins().len(), 3);
}

#[test]
fn nfw_profile_matches_closed_form() {
    let (rhos, ct, rvir) = (3.0, 4.0, 20.0);
    for r in [0.5, 5.0, 15.0] {
        let x: f64 = ct * r / rvir;
        let expected = rhos / (x * (1.0 + x).powi(2));
        assert!((nfw_rho_profile(r, rhos, ct, rvir, 1.0) - expected).abs() < 1e-12 * expected);
    }
}

//! Small 2-D vector helpers used by the three-point statistics.

pub type Vec2 = [f64; 2];

/// A segment `[start, end]`.
pub type Segment = [Vec2; 2];

pub fn sub(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

pub fn dot(a: Vec2, b: Vec2) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

pub fn vec_length(v: Vec2) -> f64 {
    dot(v, v).sqrt()
}

pub fn unit_vector(v: Vec2) -> Vec2 {
    let len = vec_length(v);
    [v[0] / len, v[1] / len]
}

/// Angle in `[0, π]` between two vectors. The cosine is clamped to `[-1, 1]`
/// before `acos`; a zero-length input yields NaN.
pub fn angle_between(v1: Vec2, v2: Vec2) -> f64 {
    dot(unit_vector(v1), unit_vector(v2)).clamp(-1.0, 1.0).acos()
}

/// Angle between the direction vectors of each pair of segments.
pub fn pairwise_angle(pairs: &[(Segment, Segment)]) -> Vec<f64> {
    pairs
        .iter()
        .map(|([a0, a1], [b0, b1])| angle_between(sub(*a1, *a0), sub(*b1, *b0)))
        .collect()
}

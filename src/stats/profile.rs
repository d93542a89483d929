/// Generalised NFW density profile
/// `rho(r) = rhos / ((c r / rvir)^alpha * (1 + c r / rvir)^(3 - alpha))`.
///
/// `alpha = 1` gives the classic NFW shape.
pub fn nfw_rho_profile(r: f64, rhos: f64, ct: f64, rvir: f64, alpha: f64) -> f64 {
    let x = ct * r / rvir;
    rhos / (x.powf(alpha) * (1.0 + x).powf(3.0 - alpha))
}

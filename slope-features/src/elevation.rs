/// Temperature lost per 100 m of elevation gain, °C.
pub const GRADIENT_RATE: f64 = 0.6;

/// Temperature correction from `reference_elev_m` up to `target_elev_m`.
///
/// Negative when the target lies below the reference (warming downhill).
pub fn correction(reference_elev_m: f64, target_elev_m: f64) -> f64 {
    (target_elev_m - reference_elev_m) / 100.0 * GRADIENT_RATE
}

/// Estimate the temperature at the target elevation.
pub fn adjusted_temp(raw_c: f64, delta_c: f64) -> f64 {
    raw_c - delta_c
}

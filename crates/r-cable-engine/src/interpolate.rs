//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Piecewise-linear and stepped table lookups."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---

/// Linear interpolation over a curve sorted by ascending `x`.
///
/// Inputs outside the curve clamp to the first or last point. An empty curve is
/// neutral and yields `1.0`; a non-finite `x` clamps to the nearest end.
pub fn piecewise_linear(curve: &[(f64, f64)], x: f64) -> f64 {
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return 1.0;
    };
    if x.is_nan() || x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    for pair in curve.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            if (x1 - x0).abs() < f64::EPSILON {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    last.1
}

/// Exact or nearest-key lookup for tables keyed by a count.
///
/// Ties between two equally near keys resolve to the larger key.
pub fn nearest_step(table: &[(u32, f64)], key: u32) -> f64 {
    table
        .iter()
        .min_by_key(|(k, _)| (k.abs_diff(key), std::cmp::Reverse(*k)))
        .map(|(_, value)| *value)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVE: &[(f64, f64)] = &[(10.0, 1.2), (20.0, 1.0), (40.0, 0.6)];

    #[test]
    fn interpolates_between_points() {
        assert!((piecewise_linear(CURVE, 15.0) - 1.1).abs() < 1e-12);
        assert!((piecewise_linear(CURVE, 30.0) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn exact_points_return_table_value() {
        assert_eq!(piecewise_linear(CURVE, 20.0), 1.0);
        assert_eq!(piecewise_linear(CURVE, 40.0), 0.6);
    }

    #[test]
    fn clamps_outside_range() {
        assert_eq!(piecewise_linear(CURVE, -5.0), 1.2);
        assert_eq!(piecewise_linear(CURVE, 95.0), 0.6);
        assert_eq!(piecewise_linear(CURVE, f64::NAN), 1.2);
        assert_eq!(piecewise_linear(&[], 12.0), 1.0);
    }

    #[test]
    fn nearest_step_prefers_exact_then_closest() {
        let table = &[(1, 1.0), (2, 0.8), (9, 0.5), (12, 0.45)];
        assert_eq!(nearest_step(table, 2), 0.8);
        assert_eq!(nearest_step(table, 10), 0.5);
        assert_eq!(nearest_step(table, 11), 0.45);
        assert_eq!(nearest_step(table, 40), 0.45);
        assert_eq!(nearest_step(table, 0), 1.0);
    }

    #[test]
    fn nearest_step_ties_pick_larger_key() {
        let table = &[(4, 0.65), (6, 0.57)];
        assert_eq!(nearest_step(table, 5), 0.57);
    }
}

//! Combining already-downsampled exceedance curves when the raw samples are
//! gone.
//!
//! Scenario losses are treated as independent: the combined survival
//! probability at a loss level is the product of the per-curve survival
//! probabilities. Scenarios that share risk drivers violate this, and the
//! combined tail is then understated. Prefer summing raw samples through the
//! portfolio sampler whenever they are available.

use crate::analytics::exceedance::{interp, ExceedanceCurve};

/// Points on the shared logarithmic loss axis.
pub const AXIS_POINTS: usize = 1_000;

/// Combined points at or above this exceedance probability are dropped.
pub const DEGENERATE_EXCEEDANCE: f64 = 0.999;

pub fn sum_curves(curves: &[ExceedanceCurve]) -> ExceedanceCurve {
    sum_curves_with(curves, AXIS_POINTS)
}

pub fn sum_curves_with(curves: &[ExceedanceCurve], axis_points: usize) -> ExceedanceCurve {
    match curves {
        [] => return ExceedanceCurve::default(),
        [single] => return single.clone(),
        _ => {}
    }

    let positive = curves
        .iter()
        .flat_map(|c| c.loss_values.iter().copied())
        .filter(|&l| l > 0.0 && l.is_finite());
    let (min_loss, max_loss) = positive.fold((f64::INFINITY, 0.0_f64), |(lo, hi), l| {
        (lo.min(l), hi.max(l))
    });
    if !min_loss.is_finite() {
        return ExceedanceCurve::default();
    }

    let axis = log_axis(min_loss, max_loss, axis_points.max(2));
    let mut loss_values = Vec::with_capacity(axis.len());
    let mut exceedance_probabilities = Vec::with_capacity(axis.len());

    for &loss in &axis {
        let survival: f64 = curves
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| {
                1.0 - interp(
                    loss,
                    &c.loss_values,
                    &c.exceedance_probabilities,
                    1.0,
                    0.0,
                )
            })
            .product();
        let exceedance = (1.0 - survival).clamp(0.0, 1.0);
        if exceedance < DEGENERATE_EXCEEDANCE {
            loss_values.push(loss);
            exceedance_probabilities.push(exceedance);
        }
    }

    ExceedanceCurve {
        loss_values,
        exceedance_probabilities,
    }
}

fn log_axis(min: f64, max: f64, points: usize) -> Vec<f64> {
    if max <= min {
        return vec![min];
    }
    let (ln_min, ln_max) = (min.ln(), max.ln());
    let step = (ln_max - ln_min) / (points - 1) as f64;
    (0..points)
        .map(|i| {
            if i == points - 1 {
                max
            } else {
                (ln_min + step * i as f64).exp()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn curve(losses: &[f64]) -> ExceedanceCurve {
        ExceedanceCurve::build(losses)
    }

    #[test]
    fn test_empty_input() {
        assert!(sum_curves(&[]).is_empty());
    }

    #[test]
    fn test_single_curve_passes_through() {
        let c = curve(&[0.0, 10.0, 100.0, 1_000.0]);
        assert_eq!(sum_curves(std::slice::from_ref(&c)), c);
    }

    #[test]
    fn test_all_zero_curves() {
        let c = curve(&[0.0, 0.0]);
        assert!(sum_curves(&[c.clone(), c]).is_empty());
    }

    #[test]
    fn test_axis_is_log_spaced_and_bounded() {
        let axis = log_axis(10.0, 1_000.0, 3);
        assert_eq!(axis.len(), 3);
        assert!((axis[0] - 10.0).abs() < 1e-9);
        assert!((axis[1] - 100.0).abs() < 1e-9);
        assert_eq!(axis[2], 1_000.0);
    }

    #[test]
    fn test_combined_is_monotone_and_bounded() {
        let a: Vec<f64> = (0..500).map(|i| if i < 400 { 0.0 } else { i as f64 * 10.0 }).collect();
        let b: Vec<f64> = (0..500).map(|i| if i < 300 { 0.0 } else { i as f64 * 3.0 }).collect();
        let combined = sum_curves(&[curve(&a), curve(&b)]);
        assert!(!combined.is_empty());
        assert!(combined.loss_values.windows(2).all(|w| w[0] <= w[1]));
        assert!(combined
            .exceedance_probabilities
            .windows(2)
            .all(|w| w[0] >= w[1] - 1e-12));
        assert!(combined
            .exceedance_probabilities
            .iter()
            .all(|p| (0.0..DEGENERATE_EXCEEDANCE).contains(p)));
    }

    #[test]
    fn test_independence_product() {
        // Both curves exceed loss 10 with probability 0.5, so the combined
        // curve exceeds it with 1 - 0.5 * 0.5.
        let c = curve(&[0.0, 10.0]);
        let combined = sum_curves_with(&[c.clone(), c], 2);
        assert_eq!(combined.loss_values, vec![10.0]);
        assert!((combined.exceedance_probabilities[0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_combined_dominates_each_input() {
        let a = curve(&[0.0, 0.0, 100.0, 1_000.0]);
        let b = curve(&[0.0, 50.0, 500.0, 5_000.0]);
        let combined = sum_curves(&[a.clone(), b.clone()]);
        for (loss, p) in combined
            .loss_values
            .iter()
            .zip(&combined.exceedance_probabilities)
        {
            for c in [&a, &b] {
                let single = interp(*loss, &c.loss_values, &c.exceedance_probabilities, 1.0, 0.0);
                assert!(*p >= single - 1e-12, "loss={loss}: {p} < {single}");
            }
        }
    }
}

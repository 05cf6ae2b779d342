//! Elliptical vowel matching. A sample scores against the active target's
//! ellipse after both center and widths are rescaled by the vocal profile
//! factor; the hit margin is deliberately forgiving for live feedback.

use crate::practice::FormantSample;
use crate::words::VowelTarget;

/// Hit iff the normalized distance is at or below this, a 40% margin past
/// the nominal unit ellipse.
pub const HIT_THRESHOLD: f64 = 1.4;

const DEFAULT_WIDTH_F1: f64 = 300.0;
const DEFAULT_WIDTH_F2: f64 = 400.0;

/// Normalized elliptical distance: 0 at the scaled center, 1 on the nominal
/// ellipse boundary. Targets without usable widths fall back to defaults.
pub fn ellipse_distance(sample: FormantSample, target: &VowelTarget, scale: f64) -> f64 {
    let half_width_f2 = effective_width(target.width_f2, DEFAULT_WIDTH_F2) * scale / 2.0;
    let half_width_f1 = effective_width(target.width_f1, DEFAULT_WIDTH_F1) * scale / 2.0;
    let delta_f2 = sample.f2 - target.f2 * scale;
    let delta_f1 = sample.f1 - target.f1 * scale;
    (delta_f2 / half_width_f2).powi(2) + (delta_f1 / half_width_f1).powi(2)
}

fn effective_width(width: Option<f64>, default: f64) -> f64 {
    width.filter(|w| *w > 0.0).unwrap_or(default)
}

/// Verdict for the current tick. False without computation when the mic is
/// disabled, the session is paused, no target is active, or the sample is
/// the silent sentinel.
pub fn is_hit(
    sample: FormantSample,
    target: Option<&VowelTarget>,
    scale: f64,
    mic_enabled: bool,
    running: bool,
) -> bool {
    if !mic_enabled || !running || sample.is_silent() {
        return false;
    }
    match target {
        Some(target) => ellipse_distance(sample, target, scale) <= HIT_THRESHOLD,
        None => false,
    }
}

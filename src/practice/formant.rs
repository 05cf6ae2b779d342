//! Spectral peak detection and per-frame formant estimation. Works on the
//! byte-magnitude frames produced by [`crate::audio::analyzer`]: find the
//! strongest strict local maximum inside a band, reject it below the noise
//! floor, then refine the frequency with a magnitude-weighted centroid.

use crate::audio::analyzer::SpectrumFrame;
use crate::practice::FormantSample;

const NOISE_FLOOR: u8 = 80;
const CENTROID_RADIUS: usize = 2;

const F1_BAND_LOW: f64 = 200.0;
const F1_BAND_HIGH: f64 = 1000.0;
const F2_FLOOR: f64 = 600.0;
const F2_MIN_ABOVE_F1: f64 = 300.0;
const F2_CEILING: f64 = 3000.0;
const F2_SEPARATION: f64 = 200.0;

/// Search band in Hz. Bins are scanned from `floor(low / hzPerBin)` up to
/// but not including `floor(high / hzPerBin)`.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

/// Skip rule for a follow-up search: ignore every bin whose frequency lies
/// below `previous_hz + min_separation_hz`, so the second formant cannot
/// land on a harmonic of the first.
#[derive(Debug, Clone, Copy)]
pub struct Exclusion {
    pub previous_hz: f64,
    pub min_separation_hz: f64,
}

/// Weighted-centroid frequency of the strongest local-maximum peak within
/// `band`, or `None` when no peak clears the noise floor. Pure and
/// stateless; called twice per frame with different bands.
pub fn strongest_peak(
    bins: &[u8],
    hz_per_bin: f64,
    band: Band,
    exclusion: Option<Exclusion>,
) -> Option<f64> {
    let start = (band.low / hz_per_bin).floor() as usize;
    let end = ((band.high / hz_per_bin).floor() as usize).min(bins.len());
    let mut best: Option<(usize, u8)> = None;
    for index in start..end {
        if let Some(rule) = exclusion {
            if (index as f64) * hz_per_bin < rule.previous_hz + rule.min_separation_hz {
                continue;
            }
        }
        // Strict local maximum needs both neighbors.
        if index == 0 || index + 1 >= bins.len() {
            continue;
        }
        let magnitude = bins[index];
        let stronger = best.map_or(true, |(_, held)| magnitude > held);
        if stronger && magnitude > bins[index - 1] && magnitude > bins[index + 1] {
            best = Some((index, magnitude));
        }
    }
    let (peak_index, peak_magnitude) = best?;
    if peak_magnitude < NOISE_FLOOR {
        return None;
    }
    Some(weighted_centroid(bins, hz_per_bin, peak_index))
}

/// Centroid over the bins around the peak, weighted by magnitude to the
/// 4th power.
fn weighted_centroid(bins: &[u8], hz_per_bin: f64, peak_index: usize) -> f64 {
    let low = peak_index.saturating_sub(CENTROID_RADIUS);
    let high = (peak_index + CENTROID_RADIUS).min(bins.len() - 1);
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for index in low..=high {
        let weight = (bins[index] as f64).powi(4);
        weighted_sum += index as f64 * hz_per_bin * weight;
        total_weight += weight;
    }
    weighted_sum / total_weight
}

/// One detection cycle: F1 in its scaled band, then F2 in a band pushed
/// above the found F1. Either formant missing yields the silent sentinel,
/// never an error.
pub fn estimate_formants(frame: &SpectrumFrame, scale: f64) -> FormantSample {
    let f1_band = Band {
        low: F1_BAND_LOW * scale,
        high: F1_BAND_HIGH * scale,
    };
    let f1 = match strongest_peak(&frame.bins, frame.hz_per_bin, f1_band, None) {
        Some(f1) => f1,
        None => return FormantSample::silent(),
    };
    let f2_band = Band {
        low: (F2_FLOOR * scale).max(f1 + F2_MIN_ABOVE_F1 * scale),
        high: F2_CEILING * scale,
    };
    let exclusion = Exclusion {
        previous_hz: f1,
        min_separation_hz: F2_SEPARATION * scale,
    };
    match strongest_peak(&frame.bins, frame.hz_per_bin, f2_band, Some(exclusion)) {
        Some(f2) => FormantSample::new(f1, f2),
        None => FormantSample::silent(),
    }
}

//! Sliding-window spectrum frames for formant detection. Mirrors the
//! byte-magnitude analyser contract the detector was tuned against: a
//! 2048-sample Hann-windowed FFT over the most recent audio, per-bin
//! magnitudes smoothed over time, then mapped from the [-100, -30] dB range
//! onto 0..=255.

use std::collections::VecDeque;

use aus::spectrum;
use aus::WindowType;

pub const FFT_SIZE: usize = 2048;
pub const BIN_COUNT: usize = FFT_SIZE / 2;
const SMOOTHING: f64 = 0.15;
const MIN_DECIBELS: f64 = -100.0;
const MAX_DECIBELS: f64 = -30.0;

/// One analysed frame: byte magnitudes per frequency bin.
#[derive(Debug, Clone)]
pub struct SpectrumFrame {
    pub bins: Vec<u8>,
    pub hz_per_bin: f64,
}

/// Accumulates capture audio and produces smoothed byte-magnitude frames
/// on demand. One instance per capture activation; smoothing state starts
/// cold.
pub struct SpectrumAnalyzer {
    window: VecDeque<f32>,
    smoothed: Vec<f64>,
    hz_per_bin: f64,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            window: VecDeque::with_capacity(FFT_SIZE),
            smoothed: vec![0.0; BIN_COUNT],
            hz_per_bin: sample_rate as f64 / FFT_SIZE as f64,
        }
    }

    pub fn hz_per_bin(&self) -> f64 {
        self.hz_per_bin
    }

    /// Appends capture samples, keeping only the newest window.
    pub fn push(&mut self, samples: &[f32]) {
        self.window.extend(samples.iter().copied());
        let excess = self.window.len().saturating_sub(FFT_SIZE);
        if excess > 0 {
            self.window.drain(..excess);
        }
    }

    /// Analyses the current window. `None` until a full window has been
    /// captured or when the transform yields no frame.
    pub fn frame(&mut self) -> Option<SpectrumFrame> {
        if self.window.len() < FFT_SIZE {
            return None;
        }
        let samples: Vec<f64> = self.window.iter().map(|&s| s as f64).collect();
        let stft = spectrum::rstft(&samples, FFT_SIZE, FFT_SIZE, WindowType::Hanning);
        let (magnitudes, _) = spectrum::complex_to_polar_rstft(&stft);
        let spectrum_bins = magnitudes.first()?;
        let scale = 2.0 / FFT_SIZE as f64;
        let mut bytes = Vec::with_capacity(BIN_COUNT);
        for (index, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = spectrum_bins.get(index).copied().unwrap_or(0.0) * scale;
            *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;
            bytes.push(byte_magnitude(*smoothed));
        }
        Some(SpectrumFrame {
            bins: bytes,
            hz_per_bin: self.hz_per_bin,
        })
    }
}

fn byte_magnitude(linear: f64) -> u8 {
    if linear <= 0.0 {
        return 0;
    }
    let db = 20.0 * linear.log10();
    let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS) * 255.0;
    scaled.clamp(0.0, 255.0) as u8
}

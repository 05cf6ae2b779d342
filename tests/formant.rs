use phonodrill::audio::analyzer::{SpectrumAnalyzer, SpectrumFrame, BIN_COUNT, FFT_SIZE};
use phonodrill::audio::ANALYSIS_SAMPLE_RATE;
use phonodrill::practice::formant::{estimate_formants, strongest_peak, Band, Exclusion};

const HZ_PER_BIN: f64 = ANALYSIS_SAMPLE_RATE as f64 / FFT_SIZE as f64;

/// Frame with symmetric triangular peaks at the given frequencies, so the
/// weighted centroid lands back on the peak bin.
fn frame_with_peaks(peaks: &[(f64, u8)]) -> SpectrumFrame {
    let mut bins = vec![10u8; BIN_COUNT];
    for &(hz, magnitude) in peaks {
        let center = (hz / HZ_PER_BIN).round() as usize;
        let shoulder = magnitude.saturating_sub(40);
        bins[center - 1] = bins[center - 1].max(shoulder);
        bins[center] = bins[center].max(magnitude);
        bins[center + 1] = bins[center + 1].max(shoulder);
    }
    SpectrumFrame {
        bins,
        hz_per_bin: HZ_PER_BIN,
    }
}

fn bin_hz(bin: usize) -> f64 {
    bin as f64 * HZ_PER_BIN
}

#[test]
fn centroid_of_a_symmetric_peak_is_its_center() {
    let center = 64;
    let frame = frame_with_peaks(&[(bin_hz(center), 200)]);
    let found = strongest_peak(
        &frame.bins,
        frame.hz_per_bin,
        Band {
            low: 200.0,
            high: 1000.0,
        },
        None,
    )
    .expect("peak should be found");
    assert!((found - bin_hz(center)).abs() < 1.0, "found {found}");
}

#[test]
fn sub_noise_floor_peaks_are_rejected() {
    let frame = frame_with_peaks(&[(500.0, 70)]);
    let found = strongest_peak(
        &frame.bins,
        frame.hz_per_bin,
        Band {
            low: 200.0,
            high: 1000.0,
        },
        None,
    );
    assert!(found.is_none());
}

#[test]
fn exclusion_skips_bins_near_the_previous_peak() {
    // Stronger peak at 850 Hz sits inside the 700+200 exclusion zone, so
    // the search must settle on the 1200 Hz peak instead.
    let frame = frame_with_peaks(&[(850.0, 230), (1200.0, 180)]);
    let band = Band {
        low: 600.0,
        high: 3000.0,
    };
    let unconstrained = strongest_peak(&frame.bins, frame.hz_per_bin, band, None).unwrap();
    assert!((unconstrained - 850.0).abs() < HZ_PER_BIN);

    let excluded = strongest_peak(
        &frame.bins,
        frame.hz_per_bin,
        band,
        Some(Exclusion {
            previous_hz: 700.0,
            min_separation_hz: 200.0,
        }),
    )
    .unwrap();
    assert!((excluded - 1200.0).abs() < HZ_PER_BIN);
}

#[test]
fn two_peaks_yield_a_formant_pair() {
    let frame = frame_with_peaks(&[(300.0, 220), (1200.0, 180)]);
    let sample = estimate_formants(&frame, 1.0);
    assert!(!sample.is_silent());
    assert!((sample.f1 - 300.0).abs() < HZ_PER_BIN);
    assert!((sample.f2 - 1200.0).abs() < HZ_PER_BIN);
}

#[test]
fn missing_second_formant_publishes_the_silent_sentinel() {
    let frame = frame_with_peaks(&[(300.0, 220)]);
    let sample = estimate_formants(&frame, 1.0);
    assert!(sample.is_silent());
    assert_eq!(sample.f1, 0.0);
    assert_eq!(sample.f2, 0.0);
}

#[test]
fn silence_publishes_the_silent_sentinel() {
    let frame = SpectrumFrame {
        bins: vec![0u8; BIN_COUNT],
        hz_per_bin: HZ_PER_BIN,
    };
    assert!(estimate_formants(&frame, 1.0).is_silent());
}

#[test]
fn analyser_peak_lands_on_the_sine_bin() {
    // Bin 60 exactly, so spectral leakage stays symmetric.
    let target_bin = 60usize;
    let hz = bin_hz(target_bin);
    let mut analyzer = SpectrumAnalyzer::new(ANALYSIS_SAMPLE_RATE);
    let samples: Vec<f32> = (0..FFT_SIZE)
        .map(|n| {
            let t = n as f64 / ANALYSIS_SAMPLE_RATE as f64;
            (0.02 * (2.0 * std::f64::consts::PI * hz * t).sin()) as f32
        })
        .collect();
    analyzer.push(&samples);
    let frame = analyzer.frame().expect("full window should analyse");

    let loudest = frame
        .bins
        .iter()
        .enumerate()
        .max_by_key(|(_, &magnitude)| magnitude)
        .map(|(bin, _)| bin)
        .unwrap();
    assert_eq!(loudest, target_bin);

    let found = strongest_peak(
        &frame.bins,
        frame.hz_per_bin,
        Band {
            low: 200.0,
            high: 1000.0,
        },
        None,
    )
    .expect("sine should clear the noise floor");
    assert!((found - hz).abs() < 5.0, "found {found}");
}

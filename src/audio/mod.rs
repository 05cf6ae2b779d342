pub mod analyzer;
pub mod capture;
pub mod resample;

/// All spectral analysis runs at this rate; capture streams at whatever the
/// device prefers and is resampled on the way in.
pub const ANALYSIS_SAMPLE_RATE: u32 = 16_000;

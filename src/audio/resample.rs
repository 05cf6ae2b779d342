use anyhow::{ensure, Result};

/// Linearly interpolates `samples` from `source_rate` to `target_rate`.
/// Quality is sufficient for formant-band work; capture devices commonly
/// run at 44.1 or 48 kHz while analysis runs at 16 kHz.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    ensure!(source_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let step = source_rate as f32 / target_rate as f32;
    let output_len = ((samples.len() as f32 / step).ceil() as usize).max(1);
    let last = samples.len() - 1;
    let mut output = Vec::with_capacity(output_len);
    for index in 0..output_len {
        let position = index as f32 * step;
        let lower = (position.floor() as usize).min(last);
        let upper = (lower + 1).min(last);
        let fraction = position - lower as f32;
        output.push(samples[lower] + (samples[upper] - samples[lower]) * fraction);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::linear_resample;

    #[test]
    fn constant_signal_survives_downsampling() {
        let input = vec![0.25; 960];
        let output = linear_resample(&input, 48_000, 16_000).unwrap();
        assert_eq!(output.len(), 320);
        assert!(output.iter().all(|&sample| (sample - 0.25).abs() < 1e-6));
    }

    #[test]
    fn ramp_midpoints_are_interpolated() {
        let input = vec![0.0, 1.0];
        let output = linear_resample(&input, 1, 2).unwrap();
        assert_eq!(output.len(), 4);
        assert!((output[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_rates_are_rejected() {
        assert!(linear_resample(&[0.0], 0, 16_000).is_err());
        assert!(linear_resample(&[0.0], 16_000, 0).is_err());
    }
}

use approx::assert_relative_eq;
use phonodrill::practice::matching::{ellipse_distance, is_hit, HIT_THRESHOLD};
use phonodrill::practice::FormantSample;
use phonodrill::words::{self, VowelTarget};

fn schwa_like() -> VowelTarget {
    VowelTarget {
        ipa: "ə".to_string(),
        example: "about".to_string(),
        f1: 520.0,
        f2: 1550.0,
        width_f1: Some(250.0),
        width_f2: Some(450.0),
        trajectory: None,
    }
}

#[test]
fn silent_sentinel_never_hits() {
    let silent = FormantSample::silent();
    for vowel in words::american_vowels() {
        for scale in [1.0, 1.15, 1.55, 1.15 * 1.55] {
            assert!(!is_hit(silent, Some(vowel), scale, true, true));
        }
    }
}

#[test]
fn center_is_distance_zero() {
    let target = schwa_like();
    let sample = FormantSample::new(target.f1, target.f2);
    assert_relative_eq!(ellipse_distance(sample, &target, 1.0), 0.0);
    assert!(is_hit(sample, Some(&target), 1.0, true, true));
}

#[test]
fn boundary_is_inclusive() {
    let target = schwa_like();
    let half_f2 = target.width_f2.unwrap() / 2.0;

    let just_inside =
        FormantSample::new(target.f1, target.f2 + half_f2 * (HIT_THRESHOLD - 1e-6).sqrt());
    assert!(is_hit(just_inside, Some(&target), 1.0, true, true));

    let outside = FormantSample::new(target.f1, target.f2 + half_f2 * 1.4001);
    assert!(ellipse_distance(outside, &target, 1.0) > HIT_THRESHOLD);
    assert!(!is_hit(outside, Some(&target), 1.0, true, true));
}

#[test]
fn scaled_center_hits_at_the_scaled_coordinates() {
    let target = schwa_like();
    let scale = 1.15 * 1.55;
    let scaled_center = FormantSample::new(target.f1 * scale, target.f2 * scale);
    assert!(is_hit(scaled_center, Some(&target), scale, true, true));
    // The unscaled center sits far outside the rescaled ellipse.
    let unscaled_center = FormantSample::new(target.f1, target.f2);
    assert!(!is_hit(unscaled_center, Some(&target), scale, true, true));
}

#[test]
fn missing_widths_fall_back_to_defaults() {
    let target = VowelTarget {
        width_f1: None,
        width_f2: None,
        ..schwa_like()
    };
    // Default full widths are 300 Hz (F1) / 400 Hz (F2), so a sample
    // 150 Hz off in F1 alone sits exactly on the unit ellipse.
    let sample = FormantSample::new(target.f1 + 150.0, target.f2);
    assert_relative_eq!(ellipse_distance(sample, &target, 1.0), 1.0);
    assert!(is_hit(sample, Some(&target), 1.0, true, true));
}

#[test]
fn gating_flags_short_circuit() {
    let target = schwa_like();
    let center = FormantSample::new(target.f1, target.f2);
    assert!(!is_hit(center, Some(&target), 1.0, false, true));
    assert!(!is_hit(center, Some(&target), 1.0, true, false));
    assert!(!is_hit(center, None, 1.0, true, true));
}

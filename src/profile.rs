//! Vocal profile scaling. Formant targets are calibrated for an adult male
//! vocal tract; shorter tracts resonate higher, so every frequency
//! comparison is rescaled by one shared factor derived from the profile.

use clap::ValueEnum;

const FEMALE_FACTOR: f64 = 1.15;
const CHILD_FACTOR: f64 = 1.55;

/// Reference range for an adult male speaker, in Hz.
pub const BASE_RANGE: FormantRange = FormantRange {
    min_f1: 150.0,
    max_f1: 950.0,
    min_f2: 600.0,
    max_f2: 2500.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AgeGroup {
    #[default]
    Adult,
    Child,
}

/// Speaker selection used to rescale detection bands and vowel ellipses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VocalProfile {
    pub gender: Gender,
    pub age: AgeGroup,
}

impl VocalProfile {
    pub fn new(gender: Gender, age: AgeGroup) -> Self {
        Self { gender, age }
    }

    /// Multiplicative frequency scale factor, always >= 1.0. Contributions
    /// combine independently, so a female child scales by both factors.
    pub fn scale_factor(&self) -> f64 {
        let mut factor = 1.0;
        if self.gender == Gender::Female {
            factor *= FEMALE_FACTOR;
        }
        if self.age == AgeGroup::Child {
            factor *= CHILD_FACTOR;
        }
        factor
    }

    /// Expected F1/F2 range for this speaker.
    pub fn user_range(&self) -> FormantRange {
        BASE_RANGE.scaled(self.scale_factor())
    }
}

/// Axis-aligned F1/F2 bounding box in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormantRange {
    pub min_f1: f64,
    pub max_f1: f64,
    pub min_f2: f64,
    pub max_f2: f64,
}

impl FormantRange {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            min_f1: self.min_f1 * factor,
            max_f1: self.max_f1 * factor,
            min_f2: self.min_f2 * factor,
            max_f2: self.max_f2 * factor,
        }
    }
}

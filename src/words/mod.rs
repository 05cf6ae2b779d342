//! Practice-word data model and the bundled American English vowel
//! inventory. Formant centers and ellipse widths are tuned for an adult
//! male reference speaker; the profile scale factor adjusts them at use.

pub mod generate;

use std::fmt;

use clap::ValueEnum;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Shared vowel inventory: 16 monophthongs and glides plus 5 diphthongs.
static AMERICAN_VOWELS: Lazy<Vec<VowelTarget>> = Lazy::new(build_inventory);

/// CEFR proficiency tier driving vocabulary selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Level {
    #[default]
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    /// Short label shown in logs and fed to the prompt builder.
    pub fn description(&self) -> &'static str {
        match self {
            Level::A1 => "Beginner: Basic everyday words",
            Level::A2 => "Elementary: Simple routine tasks",
            Level::B1 => "Intermediate: Familiar topics and experiences",
            Level::B2 => "Upper Intermediate: Complex ideas and technical discussion",
            Level::C1 => "Advanced: Wide range of demanding texts",
            Level::C2 => "Proficiency: Mastery of nuanced language",
        }
    }

    /// C1 and C2 sessions request advanced vocabulary from the generator.
    pub fn is_advanced(&self) -> bool {
        matches!(self, Level::C1 | Level::C2)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        };
        formatter.write_str(label)
    }
}

/// One point on a diphthong glide path, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VowelPoint {
    pub f1: f64,
    pub f2: f64,
}

/// Target vowel region: an ellipse centered at (f2, f1) with full widths
/// `width_f2`/`width_f1`. Widths may be absent on generated data, in which
/// case matching substitutes defaults. A trajectory marks a diphthong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VowelTarget {
    pub ipa: String,
    #[serde(default)]
    pub example: String,
    pub f1: f64,
    pub f2: f64,
    #[serde(rename = "widthF1", default, skip_serializing_if = "Option::is_none")]
    pub width_f1: Option<f64>,
    #[serde(rename = "widthF2", default, skip_serializing_if = "Option::is_none")]
    pub width_f2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<Vec<VowelPoint>>,
}

impl VowelTarget {
    pub fn is_diphthong(&self) -> bool {
        self.trajectory.is_some()
    }
}

/// A word on the practice timeline together with its pronunciation aids.
/// The first entry in `vowels` is the matching target while the word sits
/// under the marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeWord {
    pub text: String,
    #[serde(default)]
    pub phonetic: String,
    #[serde(rename = "whatsUp", default)]
    pub whats_up: String,
    #[serde(default)]
    pub intonation: String,
    #[serde(default)]
    pub vowels: Vec<VowelTarget>,
}

impl PracticeWord {
    /// The vowel used for hit detection, if the word carries any.
    pub fn primary_vowel(&self) -> Option<&VowelTarget> {
        self.vowels.first()
    }
}

/// The full bundled inventory, diphthongs included.
pub fn american_vowels() -> &'static [VowelTarget] {
    &AMERICAN_VOWELS
}

/// Pure-vowel subset offered as phoneme filters; diphthongs are data only.
pub fn monophthongs() -> impl Iterator<Item = &'static VowelTarget> {
    american_vowels().iter().filter(|v| !v.is_diphthong())
}

/// Looks up a vowel by IPA symbol.
pub fn vowel(ipa: &str) -> Option<&'static VowelTarget> {
    american_vowels().iter().find(|v| v.ipa == ipa)
}

/// Built-in practice set used whenever word generation is unavailable.
pub fn fallback_words() -> Vec<PracticeWord> {
    vec![
        PracticeWord {
            text: "About".to_string(),
            phonetic: "əbaʊt".to_string(),
            whats_up: "😑 b [😍😘] t".to_string(),
            intonation: "━ (BOUT) ━".to_string(),
            vowels: vec![target("ə", "about", 520.0, 1550.0, 250.0, 450.0)],
        },
        PracticeWord {
            text: "Bat".to_string(),
            phonetic: "bæt".to_string(),
            whats_up: "b [😀+🤒] t".to_string(),
            intonation: "━ (BAT) ━".to_string(),
            vowels: vec![target("æ", "bat", 750.0, 1850.0, 280.0, 550.0)],
        },
        PracticeWord {
            text: "Beet".to_string(),
            phonetic: "biːt".to_string(),
            whats_up: "b ii t".to_string(),
            intonation: "━ (BEE) ━".to_string(),
            vowels: vec![target("i", "beet", 300.0, 2400.0, 80.0, 350.0)],
        },
    ]
}

fn target(ipa: &str, example: &str, f1: f64, f2: f64, width_f1: f64, width_f2: f64) -> VowelTarget {
    VowelTarget {
        ipa: ipa.to_string(),
        example: example.to_string(),
        f1,
        f2,
        width_f1: Some(width_f1),
        width_f2: Some(width_f2),
        trajectory: None,
    }
}

fn diphthong(
    ipa: &str,
    example: &str,
    f1: f64,
    f2: f64,
    width_f1: f64,
    width_f2: f64,
    glide: [(f64, f64); 3],
) -> VowelTarget {
    VowelTarget {
        trajectory: Some(glide.iter().map(|&(f1, f2)| VowelPoint { f1, f2 }).collect()),
        ..target(ipa, example, f1, f2, width_f1, width_f2)
    }
}

fn build_inventory() -> Vec<VowelTarget> {
    vec![
        // high
        target("i", "beet", 300.0, 2400.0, 60.0, 300.0),
        target("u", "boot", 300.0, 700.0, 70.0, 200.0),
        target("j", "yes", 280.0, 2300.0, 50.0, 250.0),
        target("w", "win", 280.0, 750.0, 50.0, 200.0),
        // near-high
        target("ɪ", "bit", 380.0, 2050.0, 80.0, 250.0),
        target("ʊ", "foot", 400.0, 1050.0, 90.0, 220.0),
        // close-mid
        target("e", "say", 450.0, 2200.0, 100.0, 300.0),
        target("o", "go", 450.0, 750.0, 100.0, 200.0),
        // mid central
        target("ə", "sofa", 520.0, 1500.0, 180.0, 350.0),
        // open-mid
        target("ɛ", "bet", 580.0, 1950.0, 120.0, 280.0),
        target("ɜ", "bird", 550.0, 1350.0, 120.0, 300.0),
        target("ʌ", "but", 600.0, 1100.0, 140.0, 300.0),
        target("ɔ", "thought", 580.0, 750.0, 130.0, 250.0),
        // near-open
        target("æ", "bat", 750.0, 1850.0, 200.0, 400.0),
        // open
        target("a", "car", 850.0, 1450.0, 150.0, 350.0),
        target("ɑ", "hot", 850.0, 950.0, 150.0, 300.0),
        // diphthongs
        diphthong(
            "aɪ",
            "eye",
            800.0,
            1800.0,
            180.0,
            350.0,
            [(850.0, 1450.0), (650.0, 1800.0), (400.0, 2100.0)],
        ),
        diphthong(
            "aʊ",
            "cow",
            800.0,
            1100.0,
            180.0,
            350.0,
            [(850.0, 1450.0), (650.0, 1100.0), (420.0, 850.0)],
        ),
        diphthong(
            "ɔɪ",
            "boy",
            550.0,
            1400.0,
            150.0,
            400.0,
            [(580.0, 750.0), (500.0, 1400.0), (400.0, 2000.0)],
        ),
        diphthong(
            "eɪ",
            "bait",
            480.0,
            2100.0,
            150.0,
            400.0,
            [(500.0, 2000.0), (450.0, 2150.0), (350.0, 2300.0)],
        ),
        diphthong(
            "oʊ",
            "boat",
            500.0,
            900.0,
            130.0,
            300.0,
            [(550.0, 1000.0), (480.0, 900.0), (380.0, 800.0)],
        ),
    ]
}

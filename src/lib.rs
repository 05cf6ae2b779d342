//! Real-time vowel pronunciation trainer: live formant tracking matched
//! against scaled elliptical vowel targets on a scrolling word timeline.

pub mod audio;
pub mod config;
pub mod practice;
pub mod profile;
pub mod words;

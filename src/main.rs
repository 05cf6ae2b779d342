use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use phonodrill::practice::cli::{Cli, Command, SessionArgs, VowelsArgs};
use phonodrill::practice::session::SessionSnapshot;
use phonodrill::practice::{run_session, ScoreStatus};
use phonodrill::words;

const SNAPSHOT_POLL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Session(args) => handle_session(&args),
        Command::Vowels(args) => handle_vowels(&args),
    }
}

fn handle_session(args: &SessionArgs) -> Result<()> {
    let config = args.session_config()?;
    println!("phonodrill v0.1.0 - vowel pronunciation trainer");
    println!("Level:   {}", config.level);
    println!("Profile: scale x{:.2}", config.profile.scale_factor());
    println!("Speed:   {}", config.speed);

    let runtime = run_session(config).context("Failed to start practice session")?;
    let controller = runtime.controller();
    for phoneme in &args.phonemes {
        controller
            .toggle_phoneme(phoneme.clone())
            .context("Failed to apply phoneme filter")?;
    }
    if args.enable_mic {
        controller
            .enable_mic()
            .context("Failed to request microphone activation")?;
    }

    let deadline = Instant::now() + args.run_duration();
    let mut latest = SessionSnapshot::default();
    let mut reported = 0usize;
    while Instant::now() < deadline {
        let Some(snapshot) = runtime.recv_timeout(SNAPSHOT_POLL) else {
            continue;
        };
        print_new_scores(&snapshot, &mut reported);
        latest = snapshot;
    }
    controller
        .shutdown()
        .context("Failed to stop practice session")?;

    println!("\nSession summary");
    println!("  Words:  {}", latest.words.len());
    println!("  Hits:   {}", latest.hits);
    println!("  Misses: {}", latest.misses);
    Ok(())
}

/// History is newest-first; print entries that appeared since the last
/// snapshot, oldest of the new batch first.
fn print_new_scores(snapshot: &SessionSnapshot, reported: &mut usize) {
    let new = snapshot.history.len().saturating_sub(*reported);
    for entry in snapshot.history.iter().take(new).rev() {
        let mark = match entry.status {
            ScoreStatus::Hit => "✓",
            ScoreStatus::Miss => "✗",
        };
        println!("  {} {} ({})", mark, entry.word, entry.status);
    }
    *reported = snapshot.history.len();
}

fn handle_vowels(args: &VowelsArgs) -> Result<()> {
    let profile = args.profile.profile();
    let scale = profile.scale_factor();
    let range = profile.user_range();
    println!("Scale factor: x{scale:.2}");
    println!(
        "Range: F1 {:.0}-{:.0} Hz, F2 {:.0}-{:.0} Hz",
        range.min_f1, range.max_f1, range.min_f2, range.max_f2
    );
    for vowel in words::american_vowels() {
        if vowel.is_diphthong() && !args.diphthongs {
            continue;
        }
        println!(
            "  /{}/ ({}) F1 {:.0} Hz, F2 {:.0} Hz",
            vowel.ipa,
            vowel.example,
            vowel.f1 * scale,
            vowel.f2 * scale
        );
    }
    Ok(())
}

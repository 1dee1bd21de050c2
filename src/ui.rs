//! Console output helpers.
//!
//! Stages print two kinds of lines on stdout: structured event JSON (see
//! `events`) and these styled human-readable lines. The supervisor parses the
//! former and passes the latter through.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn step(msg: &str) {
    println!("{}", style(msg).cyan());
}

pub fn ok(msg: &str) {
    println!("{} {}", style("ok").green().bold(), msg);
}

pub fn warn(msg: &str) {
    println!("{} {}", style("warn").yellow().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("error").red().bold(), msg);
}

pub fn dim(msg: &str) {
    println!("{}", style(msg).dim());
}

/// Spinner shown while a single long-running item (a render, an upload) is in
/// flight. Finish with a message via `ProgressBar::finish_with_message`.
pub fn item_spinner(msg: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .expect("spinner template is a valid static string"),
    );
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

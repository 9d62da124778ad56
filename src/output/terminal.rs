// Colored terminal output for users, tweets and comparison results.
//
// This module handles all terminal-specific formatting: colors, tables,
// friendly error text. The main.rs command handlers delegate here.

use colored::Colorize;

use crate::db::models::{Tweet, User};
use crate::engine::Comparison;
use crate::error::CompareError;
use crate::ingest::IngestReport;

/// Display every stored user with their tweet counts.
pub fn display_users(users: &[User]) {
    if users.is_empty() {
        println!("No users yet. Run `twitoff add <username>` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Users ({}) ===", users.len()).bold()
    );
    println!();
    println!(
        "  {:<24} {:>7}  {:<20}  {}",
        "Username".dimmed(),
        "Tweets".dimmed(),
        "Newest tweet id".dimmed(),
        "Updated".dimmed(),
    );
    println!("  {}", "-".repeat(72).dimmed());

    for user in users {
        println!(
            "  @{:<23} {:>7}  {:<20}  {}",
            user.username,
            user.tweet_count,
            user.newest_tweet_id.as_deref().unwrap_or("-"),
            user.updated_at,
        );
    }
    println!();
}

/// Display a user's stored tweets, newest first.
pub fn display_tweets(username: &str, tweets: &[Tweet]) {
    if tweets.is_empty() {
        println!("No tweets stored for @{username}.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Tweets by @{} ({}) ===", username, tweets.len()).bold()
    );
    println!();

    for tweet in tweets {
        let when = tweet.created_at.as_deref().unwrap_or("unknown date");
        let marker = if tweet.vector.is_some() {
            " ".normal()
        } else {
            "*".yellow()
        };
        println!(
            " {} {}  {}",
            marker,
            when.dimmed(),
            super::truncate_chars(&tweet.text, 120)
        );
    }

    if tweets.iter().any(|t| t.vector.is_none()) {
        println!(
            "\n  {}",
            "* no cached vector; it will be vectorized at comparison time".dimmed()
        );
    }
    println!();
}

/// Display the outcome of a comparison.
pub fn display_comparison(comparison: &Comparison) {
    println!("\n{}", comparison.message.bold());
    println!(
        "  @{} {:.1}%  vs  @{} {:.1}%",
        comparison.chosen_username.green(),
        comparison.probability * 100.0,
        comparison.other_username.dimmed(),
        (1.0 - comparison.probability) * 100.0,
    );
    println!();
}

/// Display what an add/import/update did for one user.
pub fn display_ingest_report(report: &IngestReport) {
    println!(
        "  @{:<24} fetched {:>4}, new {:>4}",
        report.username, report.fetched, report.inserted,
    );
    if report.unvectorized > 0 {
        println!(
            "    {} {} tweets stored without a vector",
            "Warning:".yellow(),
            report.unvectorized
        );
    }
}

/// User-facing text for a failed comparison.
///
/// Domain errors get a friendly sentence with the next step; infrastructure
/// errors keep their full chain.
pub fn compare_error_message(error: &CompareError) -> String {
    match error {
        CompareError::SameUser(_) => "Cannot compare users to themselves!".to_string(),
        CompareError::UnknownUser(user) => {
            format!("No tweets stored for @{user}. Run `twitoff add {user}` first.")
        }
        CompareError::InsufficientData(user) => {
            format!("Not enough usable tweets for @{user} to train a model.")
        }
        CompareError::Vectorization(e) => format!("Could not process that text: {e}"),
        other => format!("Comparison failed: {other}"),
    }
}

/// Print a failed comparison to stderr.
pub fn display_compare_error(error: &CompareError) {
    eprintln!("{} {}", "Error:".red().bold(), compare_error_message(error));
}

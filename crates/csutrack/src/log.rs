// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `csutrack log` command implementation.
//!
//! Builds a daily log form and routes it through the form interceptor. When
//! online the form is submitted directly; if that submission cannot reach
//! the server the monitor is flipped offline and the form is captured.

use chrono::{Local, NaiveDate};
use tracing::warn;

use csutrack_core::{CsuError, FormFields, HttpMethod, PayloadEnvelope, SyncTransport};
use csutrack_sync::{Disposition, FormSubmission};

use crate::LogArgs;
use crate::app::{App, use_color};

pub async fn run_log(app: &App, args: &LogArgs, plain: bool) -> Result<(), CsuError> {
    app.service.init().await?;
    let result = submit(app, args, plain).await;
    app.service.shutdown().await?;
    result
}

async fn submit(app: &App, args: &LogArgs, plain: bool) -> Result<(), CsuError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let mut submission = build_submission(&app.config.forms.log_path_marker, date, args)?;
    submission.cookies = app.config.forms.cookie.clone();

    let disposition = match app.service.interceptor().handle(&submission, date).await? {
        Disposition::PassThrough => {
            let fields = FormFields::from_pairs(submission.fields.iter().cloned());
            match app
                .transport
                .submit(&submission.action, submission.method, &PayloadEnvelope::form(fields))
                .await
            {
                Ok(()) => Disposition::PassThrough,
                Err(e) if unreachable(&e) => {
                    warn!(error = %e, "server unreachable, saving offline");
                    app.service.monitor().report(false);
                    app.service.interceptor().handle(&submission, date).await?
                }
                Err(e) => return Err(e),
            }
        }
        other => other,
    };

    print_disposition(date, &disposition, use_color(plain));
    Ok(())
}

/// Timeouts and failures without any HTTP answer.
fn unreachable(e: &CsuError) -> bool {
    matches!(
        e,
        CsuError::Timeout { .. } | CsuError::Network { status: None, .. }
    )
}

pub fn build_submission(
    log_path_marker: &str,
    date: NaiveDate,
    args: &LogArgs,
) -> Result<FormSubmission, CsuError> {
    let day = date.format("%Y-%m-%d").to_string();
    let action = format!("{}/{day}/", log_path_marker.trim_end_matches('/'));

    let mut submission = FormSubmission::new(action, HttpMethod::Post)
        .field("date", day)
        .field("itch_score", args.itch.to_string())
        .field("hive_count_score", args.hives.to_string())
        .field("notes", args.notes.clone());
    if let Some(score) = args.score {
        submission = submission.field("score", score.to_string());
    }
    for trigger in &args.triggers {
        submission = submission.field("triggers", trigger.clone());
    }
    for answer in &args.qol {
        let (name, value) = answer.split_once('=').ok_or_else(|| {
            CsuError::Validation(format!("quality-of-life answer `{answer}` is not name=value"))
        })?;
        submission = submission.field(format!("qol_{}", name.trim()), value.trim());
    }
    Ok(submission)
}

fn print_disposition(date: NaiveDate, disposition: &Disposition, color: bool) {
    use colored::Colorize;

    match disposition {
        Disposition::PassThrough => {
            let mark = if color { "✓".green().to_string() } else { "[OK]".into() };
            println!("  {mark} {date} submitted to the server");
        }
        Disposition::Queued { id, entry } => {
            let mark = if color { "!".yellow().to_string() } else { "[QUEUED]".into() };
            println!("  {mark} {date} saved offline as queue item #{id}");
            if let Some(entry) = entry {
                println!("      score {} (itch {}, hives {})", entry.score, entry.itch_score, entry.hive_score);
            }
        }
        Disposition::NotIntercepted => println!("  {date} was not handled"),
    }
}

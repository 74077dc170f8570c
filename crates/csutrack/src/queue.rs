// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `csutrack queue` command implementation.

use csutrack_core::{CsuError, LocalStore, MutationBody, PayloadEnvelope};

use crate::app::{App, use_color};

pub async fn run_queue(app: &App, plain: bool) -> Result<(), CsuError> {
    use colored::Colorize;

    app.store.init().await?;
    let queue = app.store.get_sync_queue().await?;
    let dead = app.store.list_dead_letters().await?;
    app.store.close().await?;
    let color = use_color(plain);

    println!();
    println!("  pending ({})", queue.len());
    for item in &queue {
        let retries = if color && item.retries > 0 {
            format!("retries {}", item.retries).yellow().to_string()
        } else {
            format!("retries {}", item.retries)
        };
        println!(
            "    #{:<5} {:<6} {:<36} {:<8} {retries}  {}",
            item.id,
            item.method,
            item.endpoint,
            body_kind(&item.data),
            item.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("  dead letters ({})", dead.len());
    for item in &dead {
        let line = format!(
            "    #{:<5} {:<6} {:<36} {:<8} gave up after {} retries at {}",
            item.id,
            item.method,
            item.endpoint,
            body_kind(&item.data),
            item.retries,
            item.evicted_at.format("%Y-%m-%d %H:%M")
        );
        if color {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
    println!();
    Ok(())
}

fn body_kind(data: &[u8]) -> &'static str {
    match PayloadEnvelope::decode(data) {
        Ok(PayloadEnvelope {
            body: MutationBody::Form { .. },
            ..
        }) => "form",
        Ok(PayloadEnvelope {
            body: MutationBody::Json { .. },
            ..
        }) => "json",
        Err(_) => "invalid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csutrack_core::FormFields;

    #[test]
    fn body_kinds() {
        let form = PayloadEnvelope::form(FormFields::from_pairs([("a", "1")]))
            .encode()
            .unwrap();
        assert_eq!(body_kind(&form), "form");
        assert_eq!(body_kind(b"{}"), "invalid");
    }
}

//! Daily trigger: fires at midnight and runs the match/dispatch job.

use crate::db::Db;
use crate::dispatch;
use crate::gateway::Gateway;
use crate::matcher;
use birthday_types::DailyRunSummary;
use chrono::{Datelike, FixedOffset, NaiveDate, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Midnight every day, seconds field included.
pub const DAILY_MIDNIGHT: &str = "0 0 0 * * *";

/// `DD-MM-YYYY` key used by the dispatch log.
pub fn sent_on_key(date: NaiveDate) -> String {
    format!("{:02}-{:02}-{:04}", date.day(), date.month(), date.year())
}

/// Sleep-until-midnight loop. The timezone offset is fixed by configuration,
/// never inherited implicitly from the host.
pub async fn run_scheduler(
    db: Arc<Db>,
    gateway: Arc<dyn Gateway>,
    tz: FixedOffset,
    last_run: Arc<Mutex<Option<DailyRunSummary>>>,
) {
    let schedule = match Schedule::from_str(DAILY_MIDNIGHT) {
        Ok(s) => s,
        Err(e) => {
            log::error!("[BIRTHDAY_BOT] Invalid daily schedule: {}", e);
            return;
        }
    };

    log::info!(
        "[BIRTHDAY_BOT] Daily trigger scheduled ({}, offset {})",
        DAILY_MIDNIGHT,
        tz
    );

    loop {
        let now = Utc::now().with_timezone(&tz);
        let Some(next) = schedule.after(&now).next() else {
            log::error!("[BIRTHDAY_BOT] Daily schedule yielded no next fire");
            return;
        };

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let today = Utc::now().with_timezone(&tz).date_naive();
        let summary = run_daily_job(&db, gateway.clone(), today).await;
        log::info!(
            "[BIRTHDAY_BOT] Daily run {}: {} matched, {} sent, {} failed, {} skipped",
            summary.date_key,
            summary.matched,
            summary.sent,
            summary.failed,
            summary.skipped
        );
        *last_run.lock().await = Some(summary);
    }
}

/// One run of the daily job, with an injected "today" so tests can drive it
/// directly.
///
/// Reads the whole store once; a fetch failure logs and skips the entire run
/// with no retry before the next fire. Matches already greeted today (per the
/// dispatch log) are skipped, so re-running on the same day does not send
/// duplicates; everything else is dispatched concurrently and successful
/// sends are recorded.
pub async fn run_daily_job(db: &Db, gateway: Arc<dyn Gateway>, today: NaiveDate) -> DailyRunSummary {
    let date_key = matcher::day_month_key(today);
    let sent_on = sent_on_key(today);
    let mut summary = DailyRunSummary {
        ran_at: Utc::now().to_rfc3339(),
        date_key: date_key.clone(),
        matched: 0,
        sent: 0,
        failed: 0,
        skipped: 0,
    };

    let records = match db.list_birthdays() {
        Ok(records) => records,
        Err(e) => {
            log::error!(
                "[BIRTHDAY_BOT] Failed to fetch birthdays, skipping run: {}",
                e
            );
            return summary;
        }
    };

    let matches = matcher::todays_birthdays(&records, today);
    summary.matched = matches.len();

    let mut due = Vec::with_capacity(matches.len());
    for record in matches {
        match db.was_sent_on(record.id, &sent_on) {
            Ok(true) => summary.skipped += 1,
            Ok(false) => due.push(record),
            Err(e) => {
                // Treat a log lookup failure as not-yet-sent
                log::warn!("[BIRTHDAY_BOT] Dispatch log lookup failed: {}", e);
                due.push(record);
            }
        }
    }

    let outcomes = dispatch::dispatch_all(gateway, &due).await;

    for outcome in &outcomes {
        if outcome.delivered {
            summary.sent += 1;
            if let Err(e) = db.mark_sent(outcome.birthday_id, &sent_on) {
                log::warn!(
                    "[BIRTHDAY_BOT] Failed to record dispatch for {}: {}",
                    outcome.name,
                    e
                );
            }
        } else {
            summary.failed += 1;
        }
    }

    summary
}

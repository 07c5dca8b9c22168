// =============================================================================
// C7 — Pipeline engine (§4.7, §5).
// =============================================================================
// Single-threaded batch loop: read settings, pull the next batch in strict
// uuid order, run the configured check sequence per message with
// short-circuit, upsert the monitor row, accept on PASS, advance the
// cursor over the whole batch, sleep on empty, repeat. A failure while
// persisting a single message aborts the *rest of the batch* without
// advancing the cursor (§5 failure isolation) — already-committed messages
// in the same batch stay committed because the cursor only ever advances
// to the last uuid actually persisted.
// =============================================================================

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::watch;
use uuid::Uuid;

use crate::cache::MembershipCache;
use crate::checks::{dispatch, CheckContext, CheckOutcome};
use crate::config::POLL_INTERVAL;
use crate::models::{CheckName, CheckResultCode, EnrichedMessage, InputMessage, OverallStatus, ProcessedOutcome};
use crate::normalize::normalize;
use crate::outbound::OutboundEmitter;
use crate::settings::{SettingsSnapshot, SettingsStore};

pub struct Pipeline {
    pool: PgPool,
    cache: Arc<dyn MembershipCache>,
    emitter: OutboundEmitter,
}

impl Pipeline {
    pub fn new(pool: PgPool, cache: Arc<dyn MembershipCache>, emitter: OutboundEmitter) -> Self {
        Self { pool, cache, emitter }
    }

    /// Runs until `shutdown` reports true. Finishes whatever message is
    /// in flight, advances the cursor over the committed prefix, then
    /// returns (§5 Cancellation).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }

            match self.run_cycle(&mut shutdown).await {
                Ok(true) => {}
                Ok(false) => tokio::time::sleep(POLL_INTERVAL).await,
                Err(err) => {
                    tracing::error!(error = %err, "pipeline_cycle_failed");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }

    /// Drives exactly one batch cycle to completion, ignoring shutdown
    /// signals. Exposed for integration tests and tooling that wants to
    /// step the engine deterministically rather than run the sleeping loop.
    pub async fn run_once(&self) -> anyhow::Result<bool> {
        let (_tx, mut rx) = watch::channel(false);
        self.run_cycle(&mut rx).await
    }

    /// One batch cycle. Returns `Ok(true)` if the batch had any messages.
    #[tracing::instrument(skip_all)]
    async fn run_cycle(&self, shutdown: &mut watch::Receiver<bool>) -> anyhow::Result<bool> {
        let settings_store = SettingsStore::new(&self.pool);
        let settings = settings_store.snapshot().await?;

        let cursor: Uuid = settings
            .last_processed_uuid
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Uuid::nil());

        let batch: Vec<InputMessage> = sqlx::query_as(
            "SELECT uuid, sender_number, sms_message, received_timestamp
             FROM input_sms WHERE uuid > $1 ORDER BY uuid ASC LIMIT $2",
        )
        .bind(cursor)
        .bind(settings.batch_size as i64)
        .fetch_all(&self.pool)
        .await?;

        if batch.is_empty() {
            return Ok(false);
        }

        let batch_size = batch.len();

        let ctx = CheckContext {
            pool: &self.pool,
            cache: self.cache.as_ref(),
            settings: &settings,
        };

        let mut last_committed: Option<Uuid> = None;
        let mut accepted: usize = 0;
        let mut rejected: usize = 0;

        for input in batch {
            if *shutdown.borrow() {
                break;
            }

            let (country_code, local_mobile) = normalize(&input.sender_number, &settings.allowed_country_codes);
            let enriched = EnrichedMessage {
                input,
                country_code,
                local_mobile,
            };

            let outcome = evaluate(&enriched, &ctx, &settings).await;
            let uuid = outcome.uuid;

            persist_processed(&self.pool, &outcome).await?;

            if outcome.overall_status == OverallStatus::Valid {
                self.emitter.accept(&self.pool, self.cache.as_ref(), &enriched).await?;
                accepted += 1;
            } else {
                rejected += 1;
            }

            last_committed = Some(uuid);
        }

        if let Some(max_uuid) = last_committed {
            settings_store.advance_cursor(&max_uuid).await?;
        }

        tracing::info!(batch_size, accepted, rejected, "batch_complete");

        Ok(true)
    }
}

/// Runs `settings.check_sequence` against one message, short-circuiting on
/// the first FAIL (§4.7 step 5, I6).
async fn evaluate(
    msg: &EnrichedMessage,
    ctx: &CheckContext<'_>,
    settings: &SettingsSnapshot,
) -> ProcessedOutcome {
    let mut results: Vec<(CheckName, CheckResultCode)> =
        CheckName::ALL.iter().map(|c| (*c, CheckResultCode::NotRun)).collect();
    let mut failed_at_check: Option<String> = None;
    let mut overall_valid = true;

    for name_str in &settings.check_sequence {
        let Some(check_name) = CheckName::from_str(name_str) else {
            failed_at_check = Some(name_str.clone());
            overall_valid = false;
            break;
        };

        if !settings.is_enabled(check_name) {
            set_result(&mut results, check_name, CheckResultCode::Skipped);
            continue;
        }

        let outcome = dispatch(check_name, msg, ctx).await;
        let code = match outcome {
            CheckOutcome::Pass => CheckResultCode::Pass,
            CheckOutcome::Fail => CheckResultCode::Fail,
            CheckOutcome::Skipped => CheckResultCode::Skipped,
        };
        set_result(&mut results, check_name, code);

        if outcome == CheckOutcome::Fail {
            failed_at_check = Some(check_name.as_str().to_string());
            overall_valid = false;
            break;
        }
    }

    ProcessedOutcome {
        uuid: msg.input.uuid,
        overall_status: if overall_valid {
            OverallStatus::Valid
        } else {
            OverallStatus::Invalid
        },
        failed_at_check,
        results,
    }
}

fn set_result(results: &mut [(CheckName, CheckResultCode)], name: CheckName, code: CheckResultCode) {
    if let Some(entry) = results.iter_mut().find(|(n, _)| *n == name) {
        entry.1 = code;
    }
}

fn code_for(outcome: &ProcessedOutcome, name: CheckName) -> i16 {
    outcome
        .results
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| code.as_i16())
        .unwrap_or(CheckResultCode::NotRun.as_i16())
}

async fn persist_processed(pool: &PgPool, outcome: &ProcessedOutcome) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sms_monitor
            (uuid, overall_status, failed_at_check, processing_completed_at,
             blacklist, duplicate, foreign_number, header_hash, mobile, time_window)
         VALUES ($1, $2, $3, now(), $4, $5, $6, $7, $8, $9)
         ON CONFLICT (uuid) DO UPDATE SET
            overall_status = EXCLUDED.overall_status,
            failed_at_check = EXCLUDED.failed_at_check,
            processing_completed_at = EXCLUDED.processing_completed_at,
            blacklist = EXCLUDED.blacklist,
            duplicate = EXCLUDED.duplicate,
            foreign_number = EXCLUDED.foreign_number,
            header_hash = EXCLUDED.header_hash,
            mobile = EXCLUDED.mobile,
            time_window = EXCLUDED.time_window",
    )
    .bind(outcome.uuid)
    .bind(outcome.overall_status.as_str())
    .bind(&outcome.failed_at_check)
    .bind(code_for(outcome, CheckName::Blacklist))
    .bind(code_for(outcome, CheckName::Duplicate))
    .bind(code_for(outcome, CheckName::ForeignNumber))
    .bind(code_for(outcome, CheckName::HeaderHash))
    .bind(code_for(outcome, CheckName::Mobile))
    .bind(code_for(outcome, CheckName::TimeWindow))
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_for_reports_not_run_for_a_check_never_in_the_sequence() {
        let outcome = ProcessedOutcome {
            uuid: Uuid::nil(),
            overall_status: OverallStatus::Valid,
            failed_at_check: None,
            results: vec![(CheckName::Blacklist, CheckResultCode::Pass)],
        };
        assert_eq!(code_for(&outcome, CheckName::TimeWindow), CheckResultCode::NotRun.as_i16());
        assert_eq!(code_for(&outcome, CheckName::Blacklist), CheckResultCode::Pass.as_i16());
    }
}

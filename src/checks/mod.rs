// =============================================================================
// C6 — Individual checks + the name→check registry (§4.6, §9).
// =============================================================================
// Each check is pure given the message, a settings snapshot, and the
// persistent stores it reads/writes. `dispatch` is the only place that
// converts an internal error into `Fail` (§7 CheckInternalError) — the
// checks themselves return `anyhow::Result<CheckOutcome>` and are free to
// propagate store errors.
// =============================================================================

mod blacklist;
mod duplicate;
mod foreign_number;
mod header_hash;
mod mobile;
mod time_window;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::cache::MembershipCache;
use crate::models::{CheckName, EnrichedMessage};
use crate::settings::SettingsSnapshot;

pub(crate) use mobile::is_valid_local_mobile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail,
    Skipped,
}

pub struct CheckContext<'a> {
    pub pool: &'a PgPool,
    pub cache: &'a (dyn MembershipCache + 'a),
    pub settings: &'a SettingsSnapshot,
}

#[async_trait]
pub trait Check: Send + Sync {
    async fn run(&self, msg: &EnrichedMessage, ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome>;
}

pub fn registry_lookup(name: CheckName) -> &'static dyn Check {
    match name {
        CheckName::Blacklist => &blacklist::BlacklistCheck,
        CheckName::Duplicate => &duplicate::DuplicateCheck,
        CheckName::ForeignNumber => &foreign_number::ForeignNumberCheck,
        CheckName::HeaderHash => &header_hash::HeaderHashCheck,
        CheckName::Mobile => &mobile::MobileCheck,
        CheckName::TimeWindow => &time_window::TimeWindowCheck,
    }
}

/// Runs the named check and converts any internal error into `Fail`,
/// logging it at error level with the uuid and check name (§7, §9). This is
/// the sole boundary where a check's failure stops being an error and
/// becomes a decision.
pub async fn dispatch(
    name: CheckName,
    msg: &EnrichedMessage,
    ctx: &CheckContext<'_>,
) -> CheckOutcome {
    let check = registry_lookup(name);
    match check.run(msg, ctx).await {
        Ok(outcome) => {
            tracing::debug!(
                uuid = %msg.input.uuid,
                check = name.as_str(),
                outcome = ?outcome,
                "check_outcome"
            );
            outcome
        }
        Err(err) => {
            tracing::error!(
                uuid = %msg.input.uuid,
                check = name.as_str(),
                error = %err,
                "check_internal_error"
            );
            CheckOutcome::Fail
        }
    }
}

use async_trait::async_trait;

use super::{Check, CheckContext, CheckOutcome};
use crate::models::EnrichedMessage;

/// Read-only membership test against the accepted-number set. Never adds —
/// adds happen only on final acceptance (§4.6, §4.8).
pub struct DuplicateCheck;

#[async_trait]
impl Check for DuplicateCheck {
    async fn run(&self, msg: &EnrichedMessage, ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
        if ctx.cache.contains(&msg.local_mobile).await? {
            Ok(CheckOutcome::Fail)
        } else {
            Ok(CheckOutcome::Pass)
        }
    }
}

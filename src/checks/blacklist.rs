use async_trait::async_trait;

use super::{Check, CheckContext, CheckOutcome};
use crate::counters::CounterStore;
use crate::models::EnrichedMessage;

/// Increments the sender's counter on every message, PASS or FAIL. Trips
/// FAIL (and an idempotent blacklist insert) once the post-increment count
/// exceeds `blacklist_threshold` (§4.6, I3, I4).
pub struct BlacklistCheck;

#[async_trait]
impl Check for BlacklistCheck {
    async fn run(&self, msg: &EnrichedMessage, ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
        let counters = CounterStore::new(ctx.pool);
        let count = counters
            .increment_and_fetch(
                &msg.input.sender_number,
                &msg.country_code,
                &msg.local_mobile,
            )
            .await?;

        if (count as i64) > ctx.settings.blacklist_threshold {
            counters
                .add_blacklist(&msg.input.sender_number, &msg.country_code, &msg.local_mobile)
                .await?;
            return Ok(CheckOutcome::Fail);
        }

        Ok(CheckOutcome::Pass)
    }
}

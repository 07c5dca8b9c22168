use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Check, CheckContext, CheckOutcome};
use crate::models::EnrichedMessage;
use crate::onboarding::OnboardingRegistry;

/// PASS iff `0 <= received - requested <= window_seconds` (§4.6).
fn decide(received: DateTime<Utc>, requested: DateTime<Utc>, window_seconds: i64) -> CheckOutcome {
    let delta = (received - requested).num_seconds();
    if (0..=window_seconds).contains(&delta) {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Fail
    }
}

pub struct TimeWindowCheck;

#[async_trait]
impl Check for TimeWindowCheck {
    async fn run(&self, msg: &EnrichedMessage, ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
        let registry = OnboardingRegistry::new(ctx.pool);
        let Some(record) = registry.find_active(&msg.local_mobile).await? else {
            return Ok(CheckOutcome::Fail);
        };

        Ok(decide(
            msg.input.received_timestamp,
            record.request_timestamp,
            ctx.settings.validation_time_window,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(offset_secs: i64) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH + Duration::seconds(offset_secs)
    }

    #[test]
    fn passes_at_zero_delta() {
        assert_eq!(decide(at(0), at(0), 300), CheckOutcome::Pass);
    }

    #[test]
    fn passes_at_exact_window_boundary() {
        assert_eq!(decide(at(300), at(0), 300), CheckOutcome::Pass);
    }

    #[test]
    fn fails_one_second_past_window() {
        assert_eq!(decide(at(301), at(0), 300), CheckOutcome::Fail);
    }

    #[test]
    fn fails_when_received_before_requested() {
        assert_eq!(decide(at(-1), at(0), 300), CheckOutcome::Fail);
    }
}

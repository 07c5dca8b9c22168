use async_trait::async_trait;

use super::{Check, CheckContext, CheckOutcome};
use crate::models::EnrichedMessage;
use crate::onboarding::OnboardingRegistry;

/// `local_mobile` must be 10-15 digits (§4.6). No regex crate in the teacher's
/// stack for this; digit-length counting reads just as clearly here.
pub(crate) fn is_valid_local_mobile(local_mobile: &str) -> bool {
    let len = local_mobile.len();
    (10..=15).contains(&len) && local_mobile.chars().all(|c| c.is_ascii_digit())
}

pub struct MobileCheck;

#[async_trait]
impl Check for MobileCheck {
    async fn run(&self, msg: &EnrichedMessage, ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
        if !is_valid_local_mobile(&msg.local_mobile) {
            return Ok(CheckOutcome::Fail);
        }

        let registry = OnboardingRegistry::new(ctx.pool);
        match registry.find_active(&msg.local_mobile).await? {
            Some(_) => Ok(CheckOutcome::Pass),
            None => Ok(CheckOutcome::Fail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_short() {
        assert!(!is_valid_local_mobile("123456789"));
    }

    #[test]
    fn accepts_ten_digits() {
        assert!(is_valid_local_mobile("9912345678"));
    }

    #[test]
    fn accepts_fifteen_digits() {
        assert!(is_valid_local_mobile("991234567890123"));
    }

    #[test]
    fn rejects_sixteen_digits() {
        assert!(!is_valid_local_mobile("9912345678901234"));
    }

    #[test]
    fn rejects_non_digit_characters() {
        assert!(!is_valid_local_mobile("99123456a8"));
    }
}

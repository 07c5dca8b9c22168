use async_trait::async_trait;

use super::{Check, CheckContext, CheckOutcome};
use crate::models::EnrichedMessage;
use crate::settings::SettingsSnapshot;

/// SKIPPED when `foreign_number_validation` is off. Otherwise FAILs unless
/// the sender's digits actually begin with one of the allow-listed country
/// codes (§4.6, §8 S2). This checks the allow-list directly rather than
/// reusing `normalize`'s lenient default-country fallback (§4.2 step 5),
/// which would otherwise make every unmatched number look like it belongs
/// to the default country and always pass.
pub struct ForeignNumberCheck;

fn clean_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn decide(sender_number: &str, settings: &SettingsSnapshot) -> CheckOutcome {
    if !settings.foreign_number_validation {
        return CheckOutcome::Skipped;
    }

    let digits = clean_digits(sender_number);
    let matches_allowed = settings
        .allowed_country_codes
        .iter()
        .any(|code| digits.starts_with(code.as_str()));

    if matches_allowed {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Fail
    }
}

#[async_trait]
impl Check for ForeignNumberCheck {
    async fn run(&self, msg: &EnrichedMessage, ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
        Ok(decide(&msg.input.sender_number, ctx.settings))
    }
}

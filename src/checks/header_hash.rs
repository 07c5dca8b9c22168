use async_trait::async_trait;

use super::{Check, CheckContext, CheckOutcome};
use crate::models::EnrichedMessage;
use crate::normalize::normalize;
use crate::onboarding::OnboardingRegistry;

/// Parses `sms_message` into `(header, hex64_body)`. Returns `None` if the
/// message has no colon, the body isn't exactly 64 hex characters, or the
/// header isn't one of `permitted_headers` / the legacy literal `ONBOARD`
/// (§4.6).
fn parse_header_hash<'a>(
    sms_message: &'a str,
    permitted_headers: &[String],
) -> Option<(&'a str, &'a str)> {
    let (header, body) = sms_message.split_once(':')?;

    if body.len() != 64 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let permitted = permitted_headers.iter().any(|h| h == header) || header == "ONBOARD";
    if !permitted {
        return None;
    }

    Some((header, body))
}

pub struct HeaderHashCheck;

#[async_trait]
impl Check for HeaderHashCheck {
    async fn run(&self, msg: &EnrichedMessage, ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
        let Some((_header, body)) =
            parse_header_hash(&msg.input.sms_message, &ctx.settings.permitted_headers)
        else {
            return Ok(CheckOutcome::Fail);
        };

        let (_cc, local_mobile) = normalize(&msg.input.sender_number, &ctx.settings.allowed_country_codes);
        let registry = OnboardingRegistry::new(ctx.pool);
        let Some(record) = registry.find_active(&local_mobile).await? else {
            return Ok(CheckOutcome::Fail);
        };

        if record.hash.eq_ignore_ascii_case(body) {
            Ok(CheckOutcome::Pass)
        } else {
            Ok(CheckOutcome::Fail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(parse_header_hash("NOCOLONHERE", &headers(&["ONBOARD"])).is_none());
    }

    #[test]
    fn rejects_unpermitted_header() {
        let hex64 = "a".repeat(64);
        assert!(parse_header_hash(&format!("NOTALLOWED:{hex64}"), &headers(&["ONBOARD"])).is_none());
    }

    #[test]
    fn rejects_non_hex_body() {
        let body = "z".repeat(64);
        assert!(parse_header_hash(&format!("ONBOARD:{body}"), &headers(&["ONBOARD"])).is_none());
    }

    #[test]
    fn rejects_63_char_body() {
        let body = "a".repeat(63);
        assert!(parse_header_hash(&format!("ONBOARD:{body}"), &headers(&["ONBOARD"])).is_none());
    }

    #[test]
    fn rejects_65_char_body() {
        let body = "a".repeat(65);
        assert!(parse_header_hash(&format!("ONBOARD:{body}"), &headers(&["ONBOARD"])).is_none());
    }

    #[test]
    fn accepts_mixed_case_64_char_hex_with_permitted_header() {
        let body = "aAbBcCdD".repeat(8);
        assert_eq!(body.len(), 64);
        let (header, parsed_body) =
            parse_header_hash(&format!("ONBOARD:{body}"), &headers(&["ONBOARD"])).unwrap();
        assert_eq!(header, "ONBOARD");
        assert_eq!(parsed_body, body);
    }

    #[test]
    fn legacy_onboard_header_accepted_even_when_not_in_permitted_list() {
        let hex64 = "f".repeat(64);
        assert!(parse_header_hash(&format!("ONBOARD:{hex64}"), &headers(&["SMSVALIDATE"])).is_some());
    }
}

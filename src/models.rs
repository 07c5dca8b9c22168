// =============================================================================
// Domain entities (§3). Physical mapping lives in migrations/; these are the
// in-process shapes the pipeline, checks, and HTTP layer pass around.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw inbound message as written by ingress. Immutable once created.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InputMessage {
    pub uuid: Uuid,
    pub sender_number: String,
    pub sms_message: String,
    pub received_timestamp: DateTime<Utc>,
}

/// `InputMessage` plus the sender split into country code / local mobile,
/// computed once per batch cycle (§4.7 step 4) and threaded through every
/// check so none of them re-normalizes.
#[derive(Debug, Clone)]
pub struct EnrichedMessage {
    pub input: InputMessage,
    pub country_code: String,
    pub local_mobile: String,
}

/// The closed set of checks the pipeline knows how to run (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    Blacklist,
    Duplicate,
    ForeignNumber,
    HeaderHash,
    Mobile,
    TimeWindow,
}

impl CheckName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::Blacklist => "blacklist",
            CheckName::Duplicate => "duplicate",
            CheckName::ForeignNumber => "foreign_number",
            CheckName::HeaderHash => "header_hash",
            CheckName::Mobile => "mobile",
            CheckName::TimeWindow => "time_window",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "blacklist" => Some(CheckName::Blacklist),
            "duplicate" => Some(CheckName::Duplicate),
            "foreign_number" => Some(CheckName::ForeignNumber),
            "header_hash" => Some(CheckName::HeaderHash),
            "mobile" => Some(CheckName::Mobile),
            "time_window" => Some(CheckName::TimeWindow),
            _ => None,
        }
    }

    pub const ALL: [CheckName; 6] = [
        CheckName::Blacklist,
        CheckName::Duplicate,
        CheckName::ForeignNumber,
        CheckName::HeaderHash,
        CheckName::Mobile,
        CheckName::TimeWindow,
    ];
}

/// Per-check result recorded in the monitor row (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum CheckResultCode {
    NotRun = 0,
    Pass = 1,
    Fail = 2,
    Skipped = 3,
}

impl CheckResultCode {
    pub fn as_i16(&self) -> i16 {
        *self as i16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    Valid,
    Invalid,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Valid => "valid",
            OverallStatus::Invalid => "invalid",
        }
    }
}

/// Full per-message outcome the pipeline assembles during one batch cycle
/// and then upserts in one go (§4.7 step 5.d, invariant I6).
#[derive(Debug, Clone)]
pub struct ProcessedOutcome {
    pub uuid: Uuid,
    pub overall_status: OverallStatus,
    pub failed_at_check: Option<String>,
    pub results: Vec<(CheckName, CheckResultCode)>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AcceptedMessage {
    pub uuid: Uuid,
    pub sender_number: String,
    pub sms_message: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CounterRecord {
    pub sender_number: String,
    pub message_count: i32,
    pub country_code: String,
    pub local_mobile: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OnboardingRecord {
    pub mobile_number: String,
    pub salt: String,
    pub hash: String,
    pub request_timestamp: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingStatus {
    pub mobile_number: String,
    pub request_timestamp: DateTime<Utc>,
    pub is_active: bool,
    pub sms_validated: bool,
}

//! Identifier and timestamp checks applied before anything is written

use time::OffsetDateTime;
use uuid::Uuid;

/// Accepts only the canonical hyphenated form of a version 1-5, RFC 4122 variant UUID,
/// in either case. Braced, URN and unhyphenated forms are rejected even though
/// `Uuid::parse_str` would take them.
pub fn is_valid_user_id(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 36 {
        return false;
    }

    for (i, b) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if *b != b'-' {
                    return false;
                }
            }
            14 => {
                if !(b'1'..=b'5').contains(b) {
                    return false;
                }
            }
            19 => {
                if !matches!(b.to_ascii_lowercase(), b'8' | b'9' | b'a' | b'b') {
                    return false;
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }

    true
}

/// Validate a user id and turn it into a store key
pub fn parse_user_id(value: &str) -> Option<Uuid> {
    if !is_valid_user_id(value) {
        return None;
    }
    Uuid::parse_str(value).ok()
}

/// Stripe subscription ids are `sub_` followed by an alphanumeric suffix. Anything
/// else cannot be fetched and is treated like a missing reference.
pub fn is_subscription_id(value: &str) -> bool {
    value
        .strip_prefix("sub_")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric()))
}

/// Convert a provider period timestamp. Absent, zero, negative or out-of-range values
/// yield `None`.
pub fn period_timestamp(seconds: Option<i64>) -> Option<OffsetDateTime> {
    let seconds = seconds.filter(|s| *s > 0)?;
    OffsetDateTime::from_unix_timestamp(seconds).ok()
}

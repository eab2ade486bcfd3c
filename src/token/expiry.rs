//! Expiry window check.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::token::parser::Expiry;
use crate::validator::outcome::{Rejection, Stage};

/// Current unix time in seconds. A clock before the epoch reads as 0.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Reject tokens more than `timeout` seconds away from `now`, in either
/// direction. An undecodable timestamp is always rejected.
pub fn check_expiry(expiry: &Expiry, now: u64, timeout: u64) -> Result<(), Rejection> {
    let Some(timestamp) = expiry.timestamp else {
        return Err(Rejection::expired(
            Stage::ExpiryChecking,
            format!("undecodable expiry {:?}", expiry.hex),
        ));
    };

    let age = now.abs_diff(timestamp);
    if age > timeout {
        return Err(Rejection::expired(
            Stage::ExpiryChecking,
            format!("timestamp {timestamp} is {age}s from now {now}, window is {timeout}s"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::outcome::RejectKind;

    const NOW: u64 = 1_700_000_000;

    fn at(timestamp: u64) -> Expiry {
        Expiry::parse(&format!("{timestamp:x}"))
    }

    #[test]
    fn inside_window_passes() {
        assert!(check_expiry(&at(NOW), NOW, 60).is_ok());
        assert!(check_expiry(&at(NOW - 60), NOW, 60).is_ok());
        assert!(check_expiry(&at(NOW + 60), NOW, 60).is_ok());
    }

    #[test]
    fn past_and_future_beyond_window_expire() {
        let err = check_expiry(&at(NOW - 61), NOW, 60).unwrap_err();
        assert_eq!(err.kind, RejectKind::Expired);
        assert!(check_expiry(&at(NOW + 61), NOW, 60).is_err());
        assert!(check_expiry(&at(0), NOW, 60).is_err());
        assert!(check_expiry(&at(u64::MAX), NOW, 60).is_err());
    }

    #[test]
    fn undecodable_expiry_fails_closed() {
        let err = check_expiry(&Expiry::parse("not-hex"), NOW, u64::MAX).unwrap_err();
        assert_eq!(err.kind, RejectKind::Expired);
    }
}

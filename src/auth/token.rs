//! The session token stored (encrypted) in the auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::user::UserId;

mod expiry_format {
    //! Serializes the expiry with two-digit hours.
    //!
    //! The default format writes midnight as "0:00:00.0", which the default
    //! parser then rejects.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// e.g. "2021-01-01 00:00:00.0 +00:00:00".
    const EXPIRY_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(expiry: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = expiry
            .format(EXPIRY_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&raw, EXPIRY_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Identifies the logged-in user and when their session ends.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Token {
    pub user_id: UserId,

    #[serde(with = "expiry_format")]
    pub expires_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::{UtcOffset, macros::datetime};

    use crate::{auth::Token, user::UserId};

    #[test]
    fn serializes_expiry_with_offset() {
        let token = Token {
            user_id: UserId::new(3),
            expires_at: datetime!(2025-12-21 03:54:00).assume_offset(UtcOffset::UTC),
        };

        let got = serde_json::to_string(&token).unwrap();

        assert_eq!(
            got,
            r#"{"user_id":3,"expires_at":"2025-12-21 03:54:00.0 +00:00:00"}"#
        );
    }

    #[test]
    fn parses_midnight_expiry() {
        let want = Token {
            user_id: UserId::new(3),
            expires_at: datetime!(2025-12-21 00:00:00).assume_offset(UtcOffset::UTC),
        };

        let got: Token = serde_json::from_str(
            r#"{"user_id":3,"expires_at":"2025-12-21 00:00:00.0 +00:00:00"}"#,
        )
        .unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn keeps_non_utc_offset() {
        let offset = UtcOffset::from_hms(13, 0, 0).unwrap();
        let want = Token {
            user_id: UserId::new(3),
            expires_at: datetime!(2025-06-01 08:30:15.25).assume_offset(offset),
        };

        let json = serde_json::to_string(&want).unwrap();
        let got: Token = serde_json::from_str(&json).unwrap();

        assert_eq!(got, want);
        assert_eq!(got.expires_at.offset(), offset);
    }
}

//! Small shared utilities: timestamps, id generation, business dates.

use chrono::Utc;
use chrono_tz::Tz;
use rand::Rng;

/// Custom epoch for snowflake ids: 2024-01-01 00:00:00 UTC.
const SNOWFLAKE_EPOCH_MS: i64 = 1_704_067_200_000;

/// Current time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a roughly time-ordered i64 id.
///
/// Layout: 41 bits of milliseconds since the custom epoch, followed by
/// 12 random bits. Collisions within the same millisecond are possible
/// but acceptable for catalog-scale entity counts.
pub fn snowflake_id() -> i64 {
    let elapsed = (now_millis() - SNOWFLAKE_EPOCH_MS).max(0);
    let random: i64 = rand::thread_rng().gen_range(0..4096);
    (elapsed << 12) | random
}

/// Generate a UUID v4 string, used for order/event/command/payment ids.
pub fn uuid_v4() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The business date (YYYYMMDD) for "now" in the given timezone.
///
/// Order numbers reset per business date, so this must follow the
/// tenant's local calendar rather than UTC.
pub fn business_date(tz: Tz) -> String {
    Utc::now().with_timezone(&tz).format("%Y%m%d").to_string()
}

//! Entity id generation.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generate a prefixed entity id, e.g. `tx1717171717171x4Fq2Zb`.
///
/// Millisecond timestamp plus a random alphanumeric suffix: ids stay
/// roughly sortable by creation time while two entities created in the
/// same millisecond cannot collide.
pub fn next_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("{}{}{}", prefix, Utc::now().timestamp_millis(), suffix)
}

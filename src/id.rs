use std::sync::Mutex;

use lazy_static::lazy_static;
use time::OffsetDateTime;
use uuid::Uuid;

const SUFFIX_LENGTH: usize = 6;

lazy_static! {
    static ref LAST_MILLIS: Mutex<i128> = Mutex::new(0);
}

/// Generates a record ID: the creation time in base-36 milliseconds,
/// bumped so it strictly increases within this process, followed by a
/// random base-36 suffix.
pub fn generate(now: OffsetDateTime) -> String {
    let millis = next_millis(now.unix_timestamp_nanos() / 1_000_000);

    let random = u128::from_le_bytes(*Uuid::new_v4().as_bytes());
    let suffix = to_base36(random);
    let suffix = &suffix[suffix.len().saturating_sub(SUFFIX_LENGTH)..];

    format!("{}{:0>width$}", to_base36(millis as u128), suffix, width = SUFFIX_LENGTH)
}

fn next_millis(now: i128) -> i128 {
    let mut last = LAST_MILLIS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let next = if now > *last { now } else { *last + 1 };
    *last = next;

    next
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_owned();
    }

    let mut digits = Vec::new();

    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }

    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

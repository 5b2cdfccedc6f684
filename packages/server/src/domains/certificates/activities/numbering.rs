//! Certificate number formats.

use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

/// `{prefix}-{count:03}` for the next certificate of an event.
pub fn event_certificate_number(prefix: &str, current_count: i64) -> String {
    format!("{}-{:03}", prefix, current_count + 1)
}

/// `{prefix}-{nnn}` from the clock and a random 0-999 value.
///
/// Two standalone certificates can share a number.
pub fn standalone_certificate_number(prefix: &str, now: DateTime<Utc>) -> String {
    let random: i64 = rand::thread_rng().gen_range(0..1000);
    let suffix = (now.timestamp_millis() + random).rem_euclid(1000);
    format!("{}-{:03}", prefix, suffix)
}

/// `CERT-<8 hex of sha256(event_id:user_id)>-<yymmddHHMMSS>-<8 random hex>`, uppercase.
///
/// The random tail keeps reruns for the same participant within one second apart.
pub fn fallback_certificate_number(event_id: &str, user_id: &str, now: DateTime<Utc>) -> String {
    let digest = Sha256::digest(format!("{}:{}", event_id, user_id).as_bytes());
    let fingerprint = hex::encode(&digest[..4]);
    let nonce: u32 = rand::thread_rng().gen();
    format!(
        "CERT-{}-{}-{:08x}",
        fingerprint,
        now.format("%y%m%d%H%M%S"),
        nonce
    )
    .to_uppercase()
}

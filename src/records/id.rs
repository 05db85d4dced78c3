//! # Record ID Generation
//!
//! Tables that receive a record without a primary key assign it a ULID: a
//! 128-bit identifier built from a 48-bit unix-millisecond timestamp and 80
//! bits of entropy, rendered as 26 characters of Crockford base32. The text
//! form sorts lexicographically in generation order, so a plain table scan
//! returns auto-keyed records in insertion time order.
//!
//! Within one millisecond the entropy is incremented rather than re-drawn,
//! keeping same-millisecond IDs strictly ordered.

use std::time::{SystemTime, UNIX_EPOCH};

use eyre::{bail, Result, WrapErr};
use parking_lot::Mutex;
use rand::RngCore;

/// Length of the textual ULID form.
pub const ENCODED_LEN: usize = 26;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

struct Generator {
    last_ms: u64,
    entropy: [u8; 10],
}

static GENERATOR: Mutex<Generator> = Mutex::new(Generator {
    last_ms: 0,
    entropy: [0; 10],
});

/// Generates a fresh, monotonically increasing record ID.
pub fn generate() -> Result<[u8; ENCODED_LEN]> {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .wrap_err("system clock is before the unix epoch")?
        .as_millis() as u64;

    let mut gen = GENERATOR.lock();
    if now_ms > gen.last_ms {
        gen.last_ms = now_ms;
        rand::rng().fill_bytes(&mut gen.entropy);
    } else if !increment(&mut gen.entropy) {
        bail!("record id entropy overflow within one millisecond");
    }

    Ok(encode(gen.last_ms, &gen.entropy))
}

fn increment(entropy: &mut [u8; 10]) -> bool {
    for byte in entropy.iter_mut().rev() {
        let (v, carry) = byte.overflowing_add(1);
        *byte = v;
        if !carry {
            return true;
        }
    }
    false
}

fn encode(timestamp_ms: u64, entropy: &[u8; 10]) -> [u8; ENCODED_LEN] {
    let mut low = 0u128;
    for &b in entropy {
        low = (low << 8) | b as u128;
    }
    let value = ((timestamp_ms as u128 & 0xFFFF_FFFF_FFFF) << 80) | low;

    let mut out = [0u8; ENCODED_LEN];
    for (i, slot) in out.iter_mut().enumerate() {
        let shift = 125 - 5 * i;
        *slot = ALPHABET[((value >> shift) & 0x1F) as usize];
    }
    out
}

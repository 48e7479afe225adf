//! Key to shard mapping.

use tracing::warn;

use super::STORE_TARGET;

/// Character positions sampled from the key, most significant first.
const SAMPLED_POSITIONS: [usize; 2] = [2, 4];

/// Number of shards: one per value of the sampled hex digits.
pub(crate) const SHARD_COUNT: usize = 16 * 16;

/// Shortest key that yields a meaningful index.
const MIN_KEY_LEN: usize = SAMPLED_POSITIONS[1] + 1;

/// Returns the shard owning `key`.
///
/// Keys shorter than five bytes, or whose sampled characters are not hex
/// digits, map to shard zero.
pub(crate) fn shard_index(key: &str) -> usize {
    let bytes = key.as_bytes();
    if bytes.len() < MIN_KEY_LEN {
        return 0;
    }
    let mut index = 0_usize;
    for position in SAMPLED_POSITIONS {
        let Some(digit) = char::from(bytes[position]).to_digit(16) else {
            warn!(
                target: STORE_TARGET,
                key,
                position,
                "task key is not hex at sampled position, using shard 0"
            );
            return 0;
        };
        index = index * 16 + digit as usize;
    }
    index
}

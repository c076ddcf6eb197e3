//! Deterministic, non-cryptographic hashing.
//!
//! djb2 backs both `summary_id` derivation and exact-dedup grouping.
//! Collisions on `summary_id` are acceptable; collisions in dedup grouping
//! are defended by a full string-equality sub-grouping pass (see `dedup`).

const DJB2_SEED: u64 = 5381;

/// Classic djb2: `hash = hash * 33 + byte`, wrapping on overflow.
pub fn djb2(input: &str) -> u64 {
    let mut hash = DJB2_SEED;
    for byte in input.as_bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(*byte as u64);
    }
    hash
}

/// Encode a `u64` as lowercase base36, no leading zeros (except `"0"` itself).
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut buf = Vec::new();
    while value > 0 {
        let digit = (value % 36) as usize;
        buf.push(DIGITS[digit]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).expect("base36 alphabet is ASCII")
}

/// Derive the deterministic `summary_id` for a set of source message IDs.
///
/// Sorts the IDs, joins with NUL, djb2-hashes the result, and formats as
/// `uc_sum_<base36>`. Pure function of the (unordered) ID set.
pub fn summary_id(ids: &[String]) -> String {
    let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let joined = sorted.join("\0");
    format!("uc_sum_{}", to_base36(djb2(&joined)))
}

/// Hash used to bucket eligible messages for exact dedup: djb2 over
/// `"<len>:<content>"`.
pub fn exact_dedup_hash(content: &str) -> u64 {
    let keyed = format!("{}:{}", content.chars().count(), content);
    djb2(&keyed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn djb2_is_deterministic() {
        assert_eq!(djb2("hello"), djb2("hello"));
        assert_ne!(djb2("hello"), djb2("world"));
    }

    #[test]
    fn base36_round_trips_zero_and_small_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn summary_id_is_order_independent() {
        let a = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let b = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(summary_id(&a), summary_id(&b));
        assert!(summary_id(&a).starts_with("uc_sum_"));
    }

    #[test]
    fn summary_id_differs_for_different_sets() {
        let a = vec!["1".to_string()];
        let b = vec!["2".to_string()];
        assert_ne!(summary_id(&a), summary_id(&b));
    }
}

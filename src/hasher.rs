//! Anonymizing digest for query text.
//!
//! Popularity is tracked per digest, never per raw query. The digest is a
//! 32-bit polynomial rolling hash over UTF-16 code units, rendered as the
//! base-36 magnitude. Collisions are expected and acceptable; the goal is
//! bucketing, not identification.

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Returns the anonymized digest of `query`.
pub fn hash_query(query: &str) -> String {
    let mut hash: i32 = 0;
    for unit in query.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    to_base36(hash.unsigned_abs())
}

/// Returns the query length in UTF-16 code units.
pub fn query_length(query: &str) -> usize {
    query.encode_utf16().count()
}

fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

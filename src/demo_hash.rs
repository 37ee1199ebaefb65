//! Deterministic, non-cryptographic fingerprint for demo certificate text.

/// Hash `text` as `demo_<hex(|h|)>_<len>`.
///
/// `h` is the 32-bit wrapping polynomial `h = h * 31 + c` over UTF-16 code
/// units, and `len` is the number of UTF-16 code units. Both match what a
/// browser computes for the same string, so chains stay portable.
pub fn demo_hash(text: &str) -> String {
    let mut h: i32 = 0;
    let mut len: usize = 0;
    for unit in text.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(i32::from(unit));
        len += 1;
    }
    // i32::MIN has no i32 absolute value.
    let magnitude = i64::from(h).unsigned_abs();
    format!("demo_{magnitude:x}_{len}")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn known_values() {
        assert_eq!(demo_hash(""), "demo_0_0");
        assert_eq!(demo_hash("a"), "demo_61_1");
        assert_eq!(demo_hash("abc"), "demo_17862_3");
    }

    #[test]
    fn negative_hash_uses_magnitude() {
        // h wraps to -0x3369657c.
        assert_eq!(demo_hash("Hello World"), "demo_3369657c_11");
        assert_eq!(demo_hash("hello world"), "demo_6aefe2c4_11");
    }

    #[test]
    fn min_value_does_not_overflow() {
        // Hashes to exactly i32::MIN.
        assert_eq!(demo_hash("polygenelubricants"), "demo_80000000_18");
    }

    #[test]
    fn length_counts_utf16_units() {
        // U+1F600 is a surrogate pair.
        assert!(demo_hash("\u{1F600}").ends_with("_2"));
        assert!(demo_hash("é").ends_with("_1"));
    }

    proptest! {
        #[test]
        fn deterministic(s in "\\PC*") {
            prop_assert_eq!(demo_hash(&s), demo_hash(&s));
        }

        #[test]
        fn equal_after_normalization_means_equal_hash(words in proptest::collection::vec("[a-z]{1,6}", 1..6)) {
            let tight = words.join(" ");
            let loose = format!("  {}\t", words.join("   \n "));
            prop_assert_eq!(demo_hash(&normalize(tight.as_str())), demo_hash(&normalize(loose.as_str())));
        }
    }
}

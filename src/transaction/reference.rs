//! Human readable transaction references of the form `TRX-YYYYMMDD-XXXXXX`.

use rand::Rng;
use time::Date;

const PREFIX: &str = "TRX";
const SUFFIX_LENGTH: usize = 6;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a reference for a transaction created on `date`.
///
/// The suffix is six characters drawn uniformly from `A-Z0-9`, so collisions
/// are possible and the caller must check for uniqueness.
pub fn generate_reference(date: Date, rng: &mut impl Rng) -> String {
    let suffix: String = (0..SUFFIX_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    format!(
        "{PREFIX}-{:04}{:02}{:02}-{suffix}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Check that `reference` has the shape `TRX-<8 digits>-<6 of A-Z0-9>`.
pub fn is_valid_reference(reference: &str) -> bool {
    let mut parts = reference.split('-');

    let (Some(prefix), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == PREFIX
        && date.len() == 8
        && date.bytes().all(|byte| byte.is_ascii_digit())
        && suffix.len() == SUFFIX_LENGTH
        && suffix.bytes().all(|byte| CHARSET.contains(&byte))
}

#[cfg(test)]
mod reference_tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};
    use time::macros::date;

    use super::{generate_reference, is_valid_reference};

    #[test]
    fn generated_reference_has_expected_shape() {
        let mut rng = StdRng::seed_from_u64(42);

        let reference = generate_reference(date!(2025 - 03 - 07), &mut rng);

        assert!(reference.starts_with("TRX-20250307-"), "got {reference}");
        assert!(is_valid_reference(&reference), "got {reference}");
    }

    #[test]
    fn generated_references_are_distinct() {
        let mut rng = StdRng::seed_from_u64(42);

        let references: HashSet<String> = (0..1000)
            .map(|_| generate_reference(date!(2025 - 03 - 07), &mut rng))
            .collect();

        assert_eq!(references.len(), 1000);
    }

    #[test]
    fn rejects_malformed_references() {
        for reference in [
            "",
            "TRX-2025030-ABC123",
            "TRX-20250307-abc123",
            "TRX-20250307-ABC12",
            "TRX-20250307-ABC1234",
            "TXN-20250307-ABC123",
            "TRX-20250307-ABC123-X",
            "TRX-2025O307-ABC123",
        ] {
            assert!(!is_valid_reference(reference), "accepted {reference:?}");
        }
    }
}

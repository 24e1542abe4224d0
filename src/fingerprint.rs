use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::text::normalize;

/// Hex SHA-256 identity of a (heading, text) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Both halves are normalized first so cosmetic whitespace does not change
/// the identity. The `|` separator keeps ("AB", "") and ("A", "B") apart.
pub fn fingerprint(heading: &str, text: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(normalize(heading).as_bytes());
    hasher.update(b"|");
    hasher.update(normalize(text).as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn whitespace_does_not_matter() {
        assert_eq!(
            fingerprint("Intro", "Hello   world"),
            fingerprint("Intro", "Hello world")
        );
        assert_eq!(
            fingerprint("  Intro\n", "Hello world "),
            fingerprint("Intro", "Hello world")
        );
    }

    #[test]
    fn separator_prevents_concat_collisions() {
        assert_ne!(fingerprint("A", "B"), fingerprint("AB", ""));
        assert_ne!(fingerprint("", "AB"), fingerprint("A", "B"));
    }

    #[test]
    fn fixed_length_hex() {
        let fp = fingerprint("Intro", "Hello world");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    proptest! {
        #[test]
        fn extra_spaces_never_change_the_digest(
            words in prop::collection::vec("[a-z]{1,8}", 1..12),
            pad in 1usize..4,
        ) {
            let tight = words.join(" ");
            let loose = words.join(&" ".repeat(pad));
            prop_assert_eq!(fingerprint("H", &tight), fingerprint("H", &loose));
        }
    }
}

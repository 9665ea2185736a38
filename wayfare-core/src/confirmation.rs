use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PREFIX: &str = "TC";
const BODY_LEN: usize = 12;
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Human-readable token for a whole booking transaction, e.g. `TC4K9Z0QW1M7XB`.
///
/// The body is drawn from the random bits of a v4 UUID rather than the clock,
/// so two bookings in the same millisecond still get distinct numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationNumber(String);

impl ConfirmationNumber {
    pub fn generate() -> Self {
        Self::from_entropy(Uuid::new_v4().as_u128())
    }

    fn from_entropy(mut value: u128) -> Self {
        let mut body = [b'0'; BODY_LEN];
        for slot in body.iter_mut().rev() {
            *slot = ALPHABET[(value % 36) as usize];
            value /= 36;
        }
        let body: String = body.iter().map(|&b| b as char).collect();
        Self(format!("{}{}", PREFIX, body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ConfirmationNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_format() {
        let number = ConfirmationNumber::generate();
        let text = number.as_str();

        assert!(text.starts_with("TC"));
        assert_eq!(text.len(), PREFIX.len() + BODY_LEN);
        assert!(text[2..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_encoding_is_base36() {
        assert_eq!(ConfirmationNumber::from_entropy(0).as_str(), "TC000000000000");
        assert_eq!(ConfirmationNumber::from_entropy(35).as_str(), "TC00000000000Z");
        assert_eq!(ConfirmationNumber::from_entropy(36).as_str(), "TC000000000010");
    }

    #[test]
    fn test_burst_is_distinct() {
        let numbers: HashSet<_> = (0..1000).map(|_| ConfirmationNumber::generate()).collect();
        assert_eq!(numbers.len(), 1000);
    }
}

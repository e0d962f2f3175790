//! # Correlation Ids
//!
//! Every command carries an `IdCommand` that the gateway uses to report the
//! result later. The gateway only needs it to be unique and at most 40
//! characters long, so two generators are offered:
//!
//! | Strategy | Shape | Notes |
//! |----------|-------|-------|
//! | [`IdStrategy::Random`] | `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` | eight random 16-bit groups, no version bits |
//! | [`IdStrategy::Uuid`] | RFC 4122 v4 | same shape, version/variant bits set |

use rand::Rng;
use serde::Deserialize;

use crate::error::{KkmError, Result};

/// Longest correlation id the gateway accepts.
pub const MAX_CORRELATION_ID_LEN: usize = 40;

/// How new correlation ids are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Grouped random hex, 8-4-4-4-12.
    #[default]
    Random,
    /// Real UUID v4.
    Uuid,
}

impl IdStrategy {
    /// Generate a fresh id with this strategy.
    pub fn generate(self) -> String {
        match self {
            IdStrategy::Random => new_correlation_id(),
            IdStrategy::Uuid => uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Build a 36-character id from eight random 16-bit groups.
///
/// ```
/// let id = kkmserver_client::command::new_correlation_id();
/// assert_eq!(id.len(), 36);
/// assert_eq!(id.matches('-').count(), 4);
/// ```
pub fn new_correlation_id() -> String {
    let mut rng = rand::rng();
    let mut group = || format!("{:04x}", rng.random::<u16>());
    format!(
        "{}{}-{}-{}-{}-{}{}{}",
        group(),
        group(),
        group(),
        group(),
        group(),
        group(),
        group(),
        group()
    )
}

/// Reject ids the gateway would refuse.
pub(crate) fn validate_correlation_id(id: &str) -> Result<()> {
    let len = id.chars().count();
    if len > MAX_CORRELATION_ID_LEN {
        return Err(KkmError::CorrelationIdTooLong(len));
    }
    Ok(())
}

/// Check the 8-4-4-4-12 lowercase hex shape.
pub fn is_grouped_hex(id: &str) -> bool {
    let groups: Vec<&str> = id.split('-').collect();
    let lens = [8, 4, 4, 4, 12];
    groups.len() == lens.len()
        && groups.iter().zip(lens).all(|(g, len)| {
            g.len() == len && g.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_shape() {
        for _ in 0..100 {
            let id = new_correlation_id();
            assert_eq!(id.len(), 36);
            assert!(is_grouped_hex(&id), "bad id: {}", id);
        }
    }

    #[test]
    fn test_uuid_strategy_shape() {
        let id = IdStrategy::Uuid.generate();
        assert!(is_grouped_hex(&id));
        // version nibble
        assert_eq!(&id[14..15], "4");
    }

    #[test]
    fn test_ids_differ() {
        assert_ne!(new_correlation_id(), new_correlation_id());
        assert_ne!(IdStrategy::Uuid.generate(), IdStrategy::Uuid.generate());
    }

    #[test]
    fn test_is_grouped_hex_rejects() {
        assert!(!is_grouped_hex(""));
        assert!(!is_grouped_hex("0000000-0000-0000-0000-000000000000"));
        assert!(!is_grouped_hex("00000000-0000-0000-0000-00000000000g"));
        assert!(!is_grouped_hex("00000000_0000-0000-0000-000000000000"));
        assert!(!is_grouped_hex("00000000-0000-0000-0000-000000000000-0"));
        assert!(!is_grouped_hex("ABCDEF00-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_validate_length() {
        assert!(validate_correlation_id(&"a".repeat(40)).is_ok());
        assert!(matches!(
            validate_correlation_id(&"a".repeat(41)),
            Err(KkmError::CorrelationIdTooLong(41))
        ));
    }
}

//! Qualified `Pallet.name` identifiers for calls and events.

use crate::error::{DomainError, DomainResult};

const SEPARATOR: char = '.';

/// A call or event name split into its pallet and item components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub pallet: String,
    pub name: String,
}

impl QualifiedName {
    /// Split `"Balances.Transfer"` into `Balances` / `Transfer`.
    ///
    /// Exactly one separator with a non-empty component on each side is
    /// required; anything else is [`DomainError::MalformedName`].
    pub fn parse(qualified: &str) -> DomainResult<Self> {
        match qualified.split_once(SEPARATOR) {
            Some((pallet, name))
                if !pallet.is_empty() && !name.is_empty() && !name.contains(SEPARATOR) =>
            {
                Ok(Self {
                    pallet: pallet.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(DomainError::MalformedName(qualified.to_string())),
        }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.pallet, SEPARATOR, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_pallet_and_name() {
        let qn = QualifiedName::parse("Balances.Transfer").unwrap();
        assert_eq!(qn.pallet, "Balances");
        assert_eq!(qn.name, "Transfer");
        assert_eq!(qn.to_string(), "Balances.Transfer");
    }

    #[test]
    fn rejects_missing_or_extra_separator() {
        for bad in ["Balances", "Balances.Transfer.Extra", ".Transfer", "Balances.", ""] {
            let err = QualifiedName::parse(bad).unwrap_err();
            assert!(matches!(err, DomainError::MalformedName(ref s) if s == bad), "{bad}");
        }
    }
}

use super::errors::ConsensusError;
use super::types::Validator;

/// Fixed validator roster. The first [`ValidatorRoster::INITIAL_QUORUM`]
/// entries form the initial quorum; the rest are held back for disputes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorRoster {
    validators: Vec<Validator>,
}

impl ValidatorRoster {
    pub const INITIAL_QUORUM: usize = 3;

    pub fn new(validators: Vec<Validator>) -> Result<Self, ConsensusError> {
        let required = Self::INITIAL_QUORUM + 1;
        if validators.len() < required {
            return Err(ConsensusError::RosterTooSmall {
                required,
                actual: validators.len(),
            });
        }
        Ok(Self { validators })
    }

    /// The five-validator roster used by the party game.
    pub fn standard() -> Self {
        Self {
            validators: vec![
                Validator::new("v1", "Sentinel (Validator)", "Strict"),
                Validator::new("v2", "Arbiter (Validator)", "Nuanced"),
                Validator::new("v3", "Courier (Validator)", "Speed"),
                Validator::new("v4", "Archivist (Validator)", "Context"),
                Validator::new("v5", "Engineer (Validator)", "Technical"),
            ],
        }
    }

    pub fn initial_quorum(&self) -> &[Validator] {
        &self.validators[..Self::INITIAL_QUORUM]
    }

    pub fn expansion(&self) -> &[Validator] {
        &self.validators[Self::INITIAL_QUORUM..]
    }

    pub fn all(&self) -> &[Validator] {
        &self.validators
    }

    pub fn get(&self, id: &str) -> Option<&Validator> {
        self.validators.iter().find(|validator| validator.id == id)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Default for ValidatorRoster {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_roster_splits_three_and_two() {
        let roster = ValidatorRoster::standard();
        let quorum: Vec<_> = roster.initial_quorum().iter().map(|v| v.id.as_str()).collect();
        let expansion: Vec<_> = roster.expansion().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(quorum, ["v1", "v2", "v3"]);
        assert_eq!(expansion, ["v4", "v5"]);
    }

    #[test]
    fn roster_without_expansion_validators_is_rejected() {
        let validators = ValidatorRoster::standard().initial_quorum().to_vec();
        assert_eq!(
            ValidatorRoster::new(validators),
            Err(ConsensusError::RosterTooSmall {
                required: 4,
                actual: 3
            })
        );
    }
}

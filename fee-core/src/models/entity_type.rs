use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rate_card::{KeyField, RateCardError};

/// Legal-entity category of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Individual,
    Huf,
    Company,
    Society,
}

impl EntityType {
    /// Every entity type, in rate-card column order.
    pub const ALL: [EntityType; 4] = [
        EntityType::Individual,
        EntityType::Huf,
        EntityType::Company,
        EntityType::Society,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Huf => "huf",
            Self::Company => "company",
            Self::Society => "society",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Individual => "Individual/Proprietorship",
            Self::Huf => "HUF/Partnership/LLP",
            Self::Company => "Pvt. Ltd. Company/Limited Company",
            Self::Society => "Society/Association/BOI",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for EntityType {
    type Err = RateCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "individual" => Ok(Self::Individual),
            "huf" => Ok(Self::Huf),
            "company" => Ok(Self::Company),
            "society" => Ok(Self::Society),
            other => Err(RateCardError::invalid(KeyField::EntityType, other)),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for entity in EntityType::ALL {
            assert_eq!(entity.as_str().parse::<EntityType>(), Ok(entity));
        }
    }

    #[test]
    fn unknown_tag_is_invalid_key() {
        assert_eq!(
            "trust".parse::<EntityType>(),
            Err(RateCardError::InvalidKey {
                field: KeyField::EntityType,
                value: "trust".to_string(),
            })
        );
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert!("Company".parse::<EntityType>().is_err());
    }

    #[test]
    fn index_follows_declaration_order() {
        let indices: Vec<usize> = EntityType::ALL.iter().map(|e| e.index()).collect();

        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}

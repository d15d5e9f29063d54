use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rate_card::{KeyField, RateCardError};

/// Category of litigation support being priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[serde(alias = "communications")]
    Notices,
    Rectification,
    Grievances,
    Assessment,
    Penalty,
    Transfer,
}

impl ServiceType {
    /// Every service type, in rate-card column order.
    pub const ALL: [ServiceType; 6] = [
        ServiceType::Notices,
        ServiceType::Rectification,
        ServiceType::Grievances,
        ServiceType::Assessment,
        ServiceType::Penalty,
        ServiceType::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notices => "notices",
            Self::Rectification => "rectification",
            Self::Grievances => "grievances",
            Self::Assessment => "assessment",
            Self::Penalty => "penalty",
            Self::Transfer => "transfer",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Notices => "Responses to Communications/Showcause Notices",
            Self::Rectification => "Rectification Applications",
            Self::Grievances => "Responses for handling Grievances",
            Self::Assessment => "Responses to Assessment/Scrutiny/Demand Proceedings",
            Self::Penalty => "Responses to Penalty Proceedings",
            Self::Transfer => "Transfer Pricing Disputes",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for ServiceType {
    type Err = RateCardError;

    /// Parses a service tag. `communications` is the legacy package-builder
    /// name for the notices column and maps to [`ServiceType::Notices`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "notices" | "communications" => Ok(Self::Notices),
            "rectification" => Ok(Self::Rectification),
            "grievances" => Ok(Self::Grievances),
            "assessment" => Ok(Self::Assessment),
            "penalty" => Ok(Self::Penalty),
            "transfer" => Ok(Self::Transfer),
            other => Err(RateCardError::invalid(KeyField::ServiceType, other)),
        }
    }
}

impl fmt::Display for ServiceType {
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
        for service in ServiceType::ALL {
            assert_eq!(service.as_str().parse::<ServiceType>(), Ok(service));
        }
    }

    #[test]
    fn communications_is_an_alias_for_notices() {
        assert_eq!("communications".parse::<ServiceType>(), Ok(ServiceType::Notices));
        assert_eq!(ServiceType::Notices.as_str(), "notices");
    }

    #[test]
    fn unknown_tag_is_invalid_key() {
        let err = "audit".parse::<ServiceType>().unwrap_err();

        assert_eq!(err.to_string(), "invalid service type: 'audit'");
    }
}

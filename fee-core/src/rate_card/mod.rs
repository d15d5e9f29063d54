//! Rate card and fee lookup.
//!
//! One canonical, immutable table maps an (income slab, entity type,
//! service type) triple to a fixed fee. Lookups are exact: there is no
//! interpolation between slabs and no default for a key that is not on the
//! card.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fee_core::{EntityType, ServiceType};
//! use fee_core::rate_card::{lookup_fee, RateCard};
//!
//! assert_eq!(
//!     lookup_fee(1, EntityType::Company, ServiceType::Transfer).unwrap(),
//!     dec!(25000)
//! );
//! assert_eq!(RateCard::quote(3, "huf", "assessment").unwrap(), dec!(10000));
//! assert!(RateCard::quote(6, "individual", "notices").is_err());
//! ```

pub mod audit;
mod table;

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EntityType, ServiceType, SlabId};

pub use audit::{KNOWN_ANOMALIES, KnownAnomaly, SlabRegression, is_known_anomaly, slab_regressions};

/// Which part of a rate-card key was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyField {
    Slab,
    EntityType,
    ServiceType,
}

impl fmt::Display for KeyField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Slab => "income slab",
            Self::EntityType => "entity type",
            Self::ServiceType => "service type",
        })
    }
}

/// Errors that can occur when looking up a fee.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateCardError {
    /// The slab id, entity tag or service tag is not on the rate card.
    #[error("invalid {field}: '{value}'")]
    InvalidKey { field: KeyField, value: String },
}

impl RateCardError {
    pub(crate) fn invalid(
        field: KeyField,
        value: impl ToString,
    ) -> Self {
        Self::InvalidKey {
            field,
            value: value.to_string(),
        }
    }
}

/// A validated (slab, entity, service) triple.
///
/// Every field is a closed type, so a `RateCardKey` always addresses a
/// populated cell and [`RateCardKey::fee`] cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RateCardKey {
    pub slab: SlabId,
    pub entity_type: EntityType,
    pub service_type: ServiceType,
}

impl RateCardKey {
    pub fn new(
        slab_id: u8,
        entity_type: EntityType,
        service_type: ServiceType,
    ) -> Result<Self, RateCardError> {
        Ok(Self {
            slab: SlabId::new(slab_id)?,
            entity_type,
            service_type,
        })
    }

    /// Build a key from raw tags, as received from a form or a CSV row.
    pub fn parse(
        slab_id: u8,
        entity_type: &str,
        service_type: &str,
    ) -> Result<Self, RateCardError> {
        Ok(Self {
            slab: SlabId::new(slab_id)?,
            entity_type: entity_type.parse()?,
            service_type: service_type.parse()?,
        })
    }

    /// The fee for this cell.
    pub fn fee(&self) -> Decimal {
        Decimal::from(self.raw_fee())
    }

    fn raw_fee(&self) -> u32 {
        table::FEE_TABLE[self.slab.index()][self.entity_type.index()][self.service_type.index()]
    }
}

impl fmt::Display for RateCardKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "slab {} / {} / {}",
            self.slab, self.entity_type, self.service_type
        )
    }
}

/// One priced cell of the rate card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeEntry {
    pub key: RateCardKey,
    pub fee: Decimal,
}

/// Look up the fee for a slab id, entity type and service type.
///
/// # Errors
///
/// Returns [`RateCardError::InvalidKey`] if `slab_id` is outside `1..=5`.
pub fn lookup_fee(
    slab_id: u8,
    entity_type: EntityType,
    service_type: ServiceType,
) -> Result<Decimal, RateCardError> {
    RateCardKey::new(slab_id, entity_type, service_type).map(|key| key.fee())
}

/// Entry points over the canonical rate card.
pub struct RateCard;

impl RateCard {
    /// Number of cells on the card (5 slabs × 4 entities × 6 services).
    pub const LEN: usize = SlabId::ALL.len() * EntityType::ALL.len() * ServiceType::ALL.len();

    /// Price a request from raw tags.
    ///
    /// # Errors
    ///
    /// Returns [`RateCardError::InvalidKey`] naming the first field that is
    /// not on the card.
    pub fn quote(
        slab_id: u8,
        entity_type: &str,
        service_type: &str,
    ) -> Result<Decimal, RateCardError> {
        RateCardKey::parse(slab_id, entity_type, service_type).map(|key| key.fee())
    }

    /// Every cell, ordered by slab, then entity, then service.
    pub fn entries() -> impl Iterator<Item = FeeEntry> {
        SlabId::ALL.into_iter().flat_map(|slab| {
            EntityType::ALL.into_iter().flat_map(move |entity_type| {
                ServiceType::ALL.into_iter().map(move |service_type| {
                    let key = RateCardKey {
                        slab,
                        entity_type,
                        service_type,
                    };
                    FeeEntry {
                        key,
                        fee: key.fee(),
                    }
                })
            })
        })
    }
}

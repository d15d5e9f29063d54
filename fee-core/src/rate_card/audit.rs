//! Consistency checks over the rate card.
//!
//! Fees are expected to be non-decreasing as the slab rises for a fixed
//! entity and service. The card is reproduced verbatim from the published
//! schedule, so cells that break the pattern are reported rather than
//! corrected.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{EntityType, ServiceType, SlabId};

use super::{RateCard, RateCardKey};

/// A cell priced below the same entity/service cell one slab down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlabRegression {
    pub key: RateCardKey,
    pub fee: Decimal,
    pub previous_fee: Decimal,
}

/// A cell documented as suspicious, pending confirmation against the
/// authoritative rate card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnownAnomaly {
    pub key: RateCardKey,
    pub note: &'static str,
}

pub const KNOWN_ANOMALIES: &[KnownAnomaly] = &[KnownAnomaly {
    key: RateCardKey {
        slab: SlabId::new_unchecked(4),
        entity_type: EntityType::Society,
        service_type: ServiceType::Penalty,
    },
    note: "1000 where slabs 3 and 5 charge 10000; likely a transcription error in the source card",
}];

pub fn is_known_anomaly(key: &RateCardKey) -> bool {
    KNOWN_ANOMALIES.iter().any(|a| a.key == *key)
}

/// Every cell whose fee drops relative to the previous slab.
pub fn slab_regressions() -> Vec<SlabRegression> {
    RateCard::entries()
        .filter_map(|entry| {
            let previous = entry.key.slab.previous()?;
            let previous_fee = RateCardKey {
                slab: previous,
                ..entry.key
            }
            .fee();
            (entry.fee < previous_fee).then_some(SlabRegression {
                key: entry.key,
                fee: entry.fee,
                previous_fee,
            })
        })
        .collect()
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::rate_card::RateCardKey;

/// A named bundle an admin offers at a rate-card price.
///
/// `price` is a cached copy of `key.fee()`. It is never set directly: it is
/// computed when the package is built and recomputed whenever the key
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePackage {
    pub id: i64,
    pub name: String,
    pub description: String,
    key: RateCardKey,
    price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServicePackage {
    pub fn key(&self) -> RateCardKey {
        self.key
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Point the package at a different cell and reprice it.
    pub fn rekey(
        &mut self,
        key: RateCardKey,
    ) {
        self.key = key;
        self.price = key.fee();
    }

    /// Apply an admin edit. Only the fields that are set change.
    pub fn apply(
        &mut self,
        update: ServicePackageUpdate,
    ) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(key) = update.key {
            self.rekey(key);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
    }
}

/// A package as stored by a repository backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePackageRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub key: RateCardKey,
    pub stored_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServicePackageRecord> for ServicePackage {
    /// The stored price is only an audit copy; the rate card wins.
    fn from(record: ServicePackageRecord) -> Self {
        let price = record.key.fee();
        if price != record.stored_price {
            warn!(
                package_id = record.id,
                stored = %record.stored_price,
                rate_card = %price,
                "stored package price disagrees with rate card; repricing"
            );
        }
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            key: record.key,
            price,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// For creating new packages (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewServicePackage {
    pub name: String,
    pub description: String,
    key: RateCardKey,
    price: Decimal,
    pub is_active: bool,
}

impl NewServicePackage {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        key: RateCardKey,
        is_active: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            key,
            price: key.fee(),
            is_active,
        }
    }

    pub fn key(&self) -> RateCardKey {
        self.key
    }

    pub fn price(&self) -> Decimal {
        self.price
    }
}

/// Partial edit of a package; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServicePackageUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub key: Option<RateCardKey>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{EntityType, ServiceType};
    use crate::rate_card::{RateCard, lookup_fee};

    fn key(
        slab: u8,
        entity: EntityType,
        service: ServiceType,
    ) -> RateCardKey {
        RateCardKey::new(slab, entity, service).unwrap()
    }

    fn stored(key: RateCardKey) -> ServicePackage {
        ServicePackageRecord {
            id: 7,
            name: "Starter".to_string(),
            description: "Notice reply".to_string(),
            key,
            stored_price: key.fee(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
        .into()
    }

    #[test]
    fn new_package_price_matches_lookup_for_every_cell() {
        for entry in RateCard::entries() {
            let k = entry.key;
            let package = NewServicePackage::new("p", "d", k, true);

            assert_eq!(
                package.price(),
                lookup_fee(k.slab.get(), k.entity_type, k.service_type).unwrap()
            );
        }
    }

    #[test]
    fn rekey_reprices() {
        let mut package = stored(key(1, EntityType::Individual, ServiceType::Notices));
        assert_eq!(package.price(), dec!(3000));

        package.rekey(key(5, EntityType::Individual, ServiceType::Transfer));

        assert_eq!(package.price(), dec!(30000));
        assert_eq!(package.key().service_type, ServiceType::Transfer);
    }

    #[test]
    fn apply_changes_only_set_fields() {
        let mut package = stored(key(1, EntityType::Company, ServiceType::Transfer));

        package.apply(ServicePackageUpdate {
            description: Some("TP dispute".to_string()),
            is_active: Some(false),
            ..Default::default()
        });

        assert_eq!(package.name, "Starter");
        assert_eq!(package.description, "TP dispute");
        assert!(!package.is_active);
        assert_eq!(package.price(), dec!(25000));
    }

    #[test]
    fn apply_with_new_key_reprices() {
        let mut package = stored(key(1, EntityType::Company, ServiceType::Transfer));

        package.apply(ServicePackageUpdate {
            key: Some(key(3, EntityType::Huf, ServiceType::Assessment)),
            ..Default::default()
        });

        assert_eq!(package.price(), dec!(10000));
    }

    #[test]
    fn stale_stored_price_is_replaced() {
        let k = key(2, EntityType::Company, ServiceType::Assessment);
        let package: ServicePackage = ServicePackageRecord {
            id: 1,
            name: "Scrutiny".to_string(),
            description: String::new(),
            key: k,
            stored_price: dec!(12345),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
        .into();

        assert_eq!(package.price(), dec!(15000));
    }
}

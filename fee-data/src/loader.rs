use std::io::Read;

use fee_core::{
    NewServicePackage, PortalRepository, RateCardError, RateCardKey, RepositoryError,
    ServicePackage, SlabId,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading service packages.
#[derive(Debug, Error)]
pub enum PackageLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("line {line}: {source}")]
    InvalidKey {
        line: usize,
        #[source]
        source: RateCardError,
    },

    #[error("line {line}: package name is empty")]
    EmptyName { line: usize },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for PackageLoaderError {
    fn from(err: csv::Error) -> Self {
        PackageLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from a packages CSV file.
///
/// - `name`: display name, required
/// - `description`: free text, may be empty
/// - `slab_id`: income slab, 1 to 5
/// - `entity_type`: `individual`, `huf`, `company` or `society`
/// - `service_type`: a service tag (`communications` is read as `notices`)
/// - `active`: `true` or `false`
///
/// There is no price column: prices always come from the rate card.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub slab_id: i64,
    pub entity_type: String,
    pub service_type: String,
    pub active: bool,
}

impl PackageRecord {
    pub fn key(&self) -> Result<RateCardKey, RateCardError> {
        Ok(RateCardKey {
            slab: SlabId::try_from(self.slab_id)?,
            entity_type: self.entity_type.parse()?,
            service_type: self.service_type.parse()?,
        })
    }
}

/// Bulk import of service packages through [`PortalRepository`], so it
/// works against any registered backend.
pub struct PackageLoader;

impl PackageLoader {
    /// Parse package records from a CSV reader with a header line.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<PackageRecord>, PackageLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: PackageRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Create one package per record, priced from the rate card.
    ///
    /// Every row is validated before anything is written, so a bad key or
    /// blank name aborts the whole load and names the offending line
    /// (1-based, counting the header). The packages are then written in one
    /// batch: a storage failure part way through leaves none of them behind.
    pub async fn load<R: PortalRepository + ?Sized>(
        repo: &R,
        records: &[PackageRecord],
    ) -> Result<Vec<ServicePackage>, PackageLoaderError> {
        let mut validated = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let line = index + 2;
            let name = record.name.trim();
            if name.is_empty() {
                return Err(PackageLoaderError::EmptyName { line });
            }
            let key = record
                .key()
                .map_err(|source| PackageLoaderError::InvalidKey { line, source })?;
            validated.push(NewServicePackage::new(
                name,
                record.description.trim(),
                key,
                record.active,
            ));
        }

        let created = repo.create_packages(validated).await?;
        info!(count = created.len(), "packages loaded");

        Ok(created)
    }
}

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};

use fee_core::rate_card::is_known_anomaly;
use fee_core::{RateCard, RateCardError, RateCardKey, SlabId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when reading or writing rate-card CSV files.
#[derive(Debug, Error)]
pub enum RateCardCsvError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("CSV write error: {0}")]
    CsvWrite(String),
}

/// One row of a rate-card CSV file: `slab_id,entity_type,service_type,fee`.
///
/// Fields are kept raw so that an out-of-range slab or unknown tag shows up
/// in the audit instead of failing the whole parse.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RateCardRecord {
    pub slab_id: i64,
    pub entity_type: String,
    pub service_type: String,
    pub fee: Decimal,
}

impl RateCardRecord {
    pub fn key(&self) -> Result<RateCardKey, RateCardError> {
        Ok(RateCardKey {
            slab: SlabId::try_from(self.slab_id)?,
            entity_type: self.entity_type.parse()?,
            service_type: self.service_type.parse()?,
        })
    }
}

/// A discrepancy between a CSV file and the canonical rate card.
///
/// `line` is the 1-based line in the file, counting the header.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditFinding {
    Mismatch {
        line: usize,
        key: RateCardKey,
        expected: Decimal,
        found: Decimal,
    },
    InvalidKey {
        line: usize,
        error: RateCardError,
    },
    Duplicate {
        line: usize,
        key: RateCardKey,
        first_line: usize,
    },
    Missing {
        key: RateCardKey,
        expected: Decimal,
    },
}

impl fmt::Display for AuditFinding {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Mismatch {
                line,
                key,
                expected,
                found,
            } => {
                write!(f, "line {line}: {key} is {found}, rate card says {expected}")?;
                if is_known_anomaly(key) {
                    f.write_str(" (known anomaly)")?;
                }
                Ok(())
            }
            Self::InvalidKey { line, error } => write!(f, "line {line}: {error}"),
            Self::Duplicate {
                line,
                key,
                first_line,
            } => write!(f, "line {line}: {key} already given on line {first_line}"),
            Self::Missing { key, expected } => {
                write!(f, "missing: {key} (rate card says {expected})")
            }
        }
    }
}

/// Result of comparing a CSV file with the canonical table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateCardAudit {
    pub rows: usize,
    pub matched: usize,
    pub findings: Vec<AuditFinding>,
}

impl RateCardAudit {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// CSV import/export for the rate card.
pub struct RateCardCsv;

impl RateCardCsv {
    /// Parse rate-card rows from a CSV reader with a header line.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<RateCardRecord>, RateCardCsvError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: RateCardRecord =
                result.map_err(|e| RateCardCsvError::CsvParse(e.to_string()))?;
            records.push(record);
        }

        Ok(records)
    }

    /// Compare `records` with the canonical table.
    ///
    /// Reports rows whose fee differs, rows with keys that are not on the
    /// card, repeated keys, and canonical cells the file does not mention.
    pub fn audit(records: &[RateCardRecord]) -> RateCardAudit {
        let mut audit = RateCardAudit {
            rows: records.len(),
            ..RateCardAudit::default()
        };
        let mut seen: HashMap<RateCardKey, usize> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            let line = index + 2;
            let key = match record.key() {
                Ok(key) => key,
                Err(error) => {
                    audit.findings.push(AuditFinding::InvalidKey { line, error });
                    continue;
                }
            };
            if let Some(&first_line) = seen.get(&key) {
                audit.findings.push(AuditFinding::Duplicate {
                    line,
                    key,
                    first_line,
                });
                continue;
            }
            seen.insert(key, line);

            let expected = key.fee();
            if record.fee == expected {
                audit.matched += 1;
            } else {
                audit.findings.push(AuditFinding::Mismatch {
                    line,
                    key,
                    expected,
                    found: record.fee,
                });
            }
        }

        audit.findings.extend(
            RateCard::entries()
                .filter(|entry| !seen.contains_key(&entry.key))
                .map(|entry| AuditFinding::Missing {
                    key: entry.key,
                    expected: entry.fee,
                }),
        );

        audit
    }

    /// Write the canonical table, one row per cell, with a header line.
    pub fn export<W: Write>(writer: W) -> Result<usize, RateCardCsvError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut written = 0;

        for entry in RateCard::entries() {
            csv_writer
                .serialize(RateCardRecord {
                    slab_id: i64::from(entry.key.slab.get()),
                    entity_type: entry.key.entity_type.as_str().to_string(),
                    service_type: entry.key.service_type.as_str().to_string(),
                    fee: entry.fee,
                })
                .map_err(|e| RateCardCsvError::CsvWrite(e.to_string()))?;
            written += 1;
        }
        csv_writer
            .flush()
            .map_err(|e| RateCardCsvError::CsvWrite(e.to_string()))?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use fee_core::rate_card::KeyField;
    use fee_core::{EntityType, ServiceType};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn canonical() -> Vec<RateCardRecord> {
        let mut out = Vec::new();
        RateCardCsv::export(&mut out).expect("Failed to export");
        RateCardCsv::parse(out.as_slice()).expect("Failed to parse export")
    }

    #[test]
    fn test_parse_single_row() {
        let csv = "slab_id,entity_type,service_type,fee\n2, company ,transfer,50000";

        let records = RateCardCsv::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![RateCardRecord {
                slab_id: 2,
                entity_type: "company".to_string(),
                service_type: "transfer".to_string(),
                fee: dec!(50000),
            }]
        );
    }

    #[test]
    fn test_parse_bad_fee() {
        let csv = "slab_id,entity_type,service_type,fee\n1,huf,notices,lots";

        let err = RateCardCsv::parse(csv.as_bytes()).expect_err("Should fail for bad fee");

        assert!(matches!(err, RateCardCsvError::CsvParse(_)));
    }

    #[test]
    fn test_export_has_every_cell() {
        let mut out = Vec::new();

        let written = RateCardCsv::export(&mut out).expect("Failed to export");

        let text = String::from_utf8(out).expect("utf-8");
        assert_eq!(written, 120);
        assert_eq!(text.lines().count(), 121);
        assert_eq!(text.lines().next(), Some("slab_id,entity_type,service_type,fee"));
        assert!(text.contains("\n4,society,penalty,1000\n"));
    }

    #[test]
    fn test_audit_of_export_is_clean() {
        let audit = RateCardCsv::audit(&canonical());

        assert!(audit.is_clean(), "unexpected findings: {:#?}", audit.findings);
        assert_eq!(audit.matched, 120);
    }

    #[test]
    fn test_audit_reports_changed_fee() {
        let mut records = canonical();
        // Row 0 is slab 1 / individual / notices.
        records[0].fee = dec!(3500);

        let audit = RateCardCsv::audit(&records);

        assert_eq!(
            audit.findings,
            vec![AuditFinding::Mismatch {
                line: 2,
                key: RateCardKey::new(1, EntityType::Individual, ServiceType::Notices).unwrap(),
                expected: dec!(3000),
                found: dec!(3500),
            }]
        );
    }

    #[test]
    fn test_audit_reports_invalid_key_and_missing_cell() {
        let mut records = canonical();
        records[0].entity_type = "trust".to_string();

        let audit = RateCardCsv::audit(&records);

        assert_eq!(
            audit.findings,
            vec![
                AuditFinding::InvalidKey {
                    line: 2,
                    error: RateCardError::InvalidKey {
                        field: KeyField::EntityType,
                        value: "trust".to_string(),
                    },
                },
                AuditFinding::Missing {
                    key: RateCardKey::new(1, EntityType::Individual, ServiceType::Notices).unwrap(),
                    expected: dec!(3000),
                },
            ]
        );
    }

    #[test]
    fn test_audit_accepts_communications_alias() {
        let mut records = canonical();
        records[0].service_type = "communications".to_string();

        assert!(RateCardCsv::audit(&records).is_clean());
    }

    #[test]
    fn test_audit_reports_duplicates() {
        let mut records = canonical();
        records.push(records[5].clone());

        let audit = RateCardCsv::audit(&records);

        assert_eq!(audit.findings.len(), 1);
        assert!(matches!(
            audit.findings[0],
            AuditFinding::Duplicate { line: 122, first_line: 7, .. }
        ));
    }

    #[test]
    fn test_mismatch_on_anomaly_is_labelled() {
        let finding = AuditFinding::Mismatch {
            line: 99,
            key: RateCardKey::new(4, EntityType::Society, ServiceType::Penalty).unwrap(),
            expected: dec!(1000),
            found: dec!(10000),
        };

        assert_eq!(
            finding.to_string(),
            "line 99: slab 4 / society / penalty is 10000, rate card says 1000 (known anomaly)"
        );
    }
}

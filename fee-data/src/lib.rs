mod loader;
mod rate_card;

pub use loader::{PackageLoader, PackageLoaderError, PackageRecord};
pub use rate_card::{AuditFinding, RateCardAudit, RateCardCsv, RateCardCsvError, RateCardRecord};

pub mod db;
pub mod models;
pub mod money;
pub mod portal;
pub mod rate_card;

pub use db::repository::{PortalRepository, RepositoryError};
pub use models::*;
pub use money::format_inr;
pub use portal::{Portal, PortalError, Session};
pub use rate_card::{FeeEntry, RateCard, RateCardError, RateCardKey, lookup_fee};

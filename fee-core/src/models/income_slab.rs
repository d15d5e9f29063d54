use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rate_card::{KeyField, RateCardError};

/// Identifier of one of the five income/turnover slabs (1..=5).
///
/// The inner value is only constructible through [`SlabId::new`] or the
/// `TryFrom` impls, so a `SlabId` in hand is always a valid rate-card key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlabId(u8);

impl SlabId {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub const ALL: [SlabId; 5] = [SlabId(1), SlabId(2), SlabId(3), SlabId(4), SlabId(5)];

    pub fn new(id: u8) -> Result<Self, RateCardError> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(Self(id))
        } else {
            Err(RateCardError::invalid(KeyField::Slab, id))
        }
    }

    pub(crate) const fn new_unchecked(id: u8) -> Self {
        Self(id)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        usize::from(self.0 - Self::MIN)
    }

    /// The slab immediately below this one, if any.
    pub fn previous(self) -> Option<Self> {
        (self.0 > Self::MIN).then(|| Self(self.0 - 1))
    }

    /// Static reference data for this slab.
    pub fn slab(self) -> &'static IncomeSlab {
        &INCOME_SLABS[self.index()]
    }
}

impl TryFrom<u8> for SlabId {
    type Error = RateCardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for SlabId {
    type Error = RateCardError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| RateCardError::invalid(KeyField::Slab, value))
            .and_then(Self::new)
    }
}

impl From<SlabId> for u8 {
    fn from(id: SlabId) -> Self {
        id.0
    }
}

impl fmt::Display for SlabId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A gross-income / turnover bracket used to tier pricing.
///
/// Upper bounds are in lakhs and inclusive; `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeSlab {
    pub id: SlabId,
    pub name: &'static str,
    pub income: &'static str,
    pub turnover: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    max_income_lakhs: Option<u32>,
    #[serde(skip)]
    max_turnover_lakhs: Option<u32>,
}

impl IncomeSlab {
    pub fn max_income_lakhs(&self) -> Option<Decimal> {
        self.max_income_lakhs.map(Decimal::from)
    }

    pub fn max_turnover_lakhs(&self) -> Option<Decimal> {
        self.max_turnover_lakhs.map(Decimal::from)
    }
}

pub static INCOME_SLABS: [IncomeSlab; 5] = [
    IncomeSlab {
        id: SlabId::new_unchecked(1),
        name: "Slab 1",
        income: "UPTO 15 LAKHS",
        turnover: "UPTO 100 LAKHS",
        description: "GROSS INCOME UPTO 15 LAKHS OR TURNOVER UPTO 100 LAKHS, WHICHEVER IS HIGHER",
        max_income_lakhs: Some(15),
        max_turnover_lakhs: Some(100),
    },
    IncomeSlab {
        id: SlabId::new_unchecked(2),
        name: "Slab 2",
        income: "16 to 25 LAKHS",
        turnover: "UPTO 500 LAKHS",
        description: "GROSS INCOME 16 to 25 LAKHS OR TURNOVER UPTO 500 LAKHS, WHICHEVER IS HIGHER",
        max_income_lakhs: Some(25),
        max_turnover_lakhs: Some(500),
    },
    IncomeSlab {
        id: SlabId::new_unchecked(3),
        name: "Slab 3",
        income: "26 to 50 LAKHS",
        turnover: "UPTO 1000 LAKHS",
        description: "GROSS INCOME 26 to 50 LAKHS OR TURNOVER UPTO 1000 LAKHS, WHICHEVER IS HIGHER",
        max_income_lakhs: Some(50),
        max_turnover_lakhs: Some(1000),
    },
    IncomeSlab {
        id: SlabId::new_unchecked(4),
        name: "Slab 4",
        income: "51 to 100 LAKHS",
        turnover: "UPTO 5000 LAKHS",
        description: "GROSS INCOME 51 to 100 LAKHS OR TURNOVER UPTO 5000 LAKHS, WHICHEVER IS HIGHER",
        max_income_lakhs: Some(100),
        max_turnover_lakhs: Some(5000),
    },
    IncomeSlab {
        id: SlabId::new_unchecked(5),
        name: "Slab 5",
        income: "ABOVE 101 LAKHS",
        turnover: "5001 LAKHS",
        description: "GROSS INCOME ABOVE 101 LAKHS OR TURNOVER 5001 LAKHS, WHICHEVER IS HIGHER",
        max_income_lakhs: None,
        max_turnover_lakhs: None,
    },
];

/// All income slabs in ascending order.
pub fn income_slabs() -> &'static [IncomeSlab] {
    &INCOME_SLABS
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlabClassificationError {
    #[error("{field} cannot be negative (got {value})")]
    NegativeAmount { field: &'static str, value: Decimal },
}

/// Outcome of placing a client in a slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlabClassification {
    /// Slab implied by gross income alone.
    pub by_income: SlabId,
    /// Slab implied by turnover alone.
    pub by_turnover: SlabId,
    /// The applicable slab: whichever of the two is higher.
    pub slab: SlabId,
}

/// Place a client in a slab from gross income and turnover, both in lakhs.
///
/// Each figure is matched to the first slab whose upper bound it does not
/// exceed, so amounts falling between two printed ranges (15.5 lakhs, say)
/// land in the next slab up. The applicable slab is the higher of the two.
pub fn classify_slab(
    gross_income_lakhs: Decimal,
    turnover_lakhs: Decimal,
) -> Result<SlabClassification, SlabClassificationError> {
    if gross_income_lakhs.is_sign_negative() && !gross_income_lakhs.is_zero() {
        return Err(SlabClassificationError::NegativeAmount {
            field: "gross income",
            value: gross_income_lakhs,
        });
    }
    if turnover_lakhs.is_sign_negative() && !turnover_lakhs.is_zero() {
        return Err(SlabClassificationError::NegativeAmount {
            field: "turnover",
            value: turnover_lakhs,
        });
    }

    let by_income = first_slab_within(gross_income_lakhs, IncomeSlab::max_income_lakhs);
    let by_turnover = first_slab_within(turnover_lakhs, IncomeSlab::max_turnover_lakhs);

    Ok(SlabClassification {
        by_income,
        by_turnover,
        slab: by_income.max(by_turnover),
    })
}

fn first_slab_within(
    amount: Decimal,
    bound: fn(&IncomeSlab) -> Option<Decimal>,
) -> SlabId {
    INCOME_SLABS
        .iter()
        .find(|slab| bound(slab).is_none_or(|max| amount <= max))
        .map(|slab| slab.id)
        // The top slab is unbounded, so `find` always succeeds.
        .unwrap_or(SlabId::new_unchecked(SlabId::MAX))
}

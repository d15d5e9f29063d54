//! The reference fee schedule, in rupees.
//!
//! Indexed `[slab - 1][entity][service]`, with entities and services in the
//! declaration order of [`EntityType`](crate::EntityType) and
//! [`ServiceType`](crate::ServiceType):
//!
//! - entity: individual, huf, company, society
//! - service: notices, rectification, grievances, assessment, penalty, transfer
//!
//! The array type fixes the shape at 5 × 4 × 6, so a missing cell does not
//! compile.

pub(crate) const FEE_TABLE: [[[u32; 6]; 4]; 5] = [
    // Slab 1: income upto 15 lakhs or turnover upto 100 lakhs
    [
        [3_000, 3_000, 2_500, 5_000, 7_500, 10_000],
        [5_000, 3_000, 2_500, 7_500, 7_500, 15_000],
        [7_500, 5_000, 2_500, 10_000, 10_000, 25_000],
        [5_000, 5_000, 2_500, 5_000, 7_500, 25_000],
    ],
    // Slab 2: income 16 to 25 lakhs or turnover upto 500 lakhs
    [
        [5_000, 3_000, 5_000, 7_500, 10_000, 15_000],
        [5_000, 3_000, 5_000, 7_500, 10_000, 25_000],
        [7_500, 5_000, 5_000, 15_000, 10_000, 50_000],
        [5_000, 3_000, 5_000, 10_000, 10_000, 25_000],
    ],
    // Slab 3: income 26 to 50 lakhs or turnover upto 1000 lakhs
    [
        [7_500, 5_000, 7_500, 10_000, 10_000, 25_000],
        [7_500, 5_000, 7_500, 10_000, 10_000, 25_000],
        [10_000, 5_000, 7_500, 15_000, 10_000, 50_000],
        [10_000, 5_000, 7_500, 10_000, 10_000, 30_000],
    ],
    // Slab 4: income 51 to 100 lakhs or turnover upto 5000 lakhs
    [
        [7_500, 5_000, 7_500, 10_000, 10_000, 25_000],
        [10_000, 7_500, 7_500, 10_000, 10_000, 25_000],
        [10_000, 7_500, 7_500, 15_000, 10_000, 50_000],
        // Penalty is 1_000 on the source card; see KNOWN_ANOMALIES.
        [10_000, 7_500, 7_500, 10_000, 1_000, 30_000],
    ],
    // Slab 5: income above 101 lakhs or turnover 5001 lakhs
    [
        [10_000, 7_500, 10_000, 15_000, 15_000, 30_000],
        [15_000, 7_500, 7_500, 10_000, 10_000, 40_000],
        [10_000, 10_000, 10_000, 15_000, 10_000, 50_000],
        [10_000, 7_500, 7_500, 10_000, 10_000, 40_000],
    ],
];

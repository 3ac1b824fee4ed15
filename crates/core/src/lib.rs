//! # birdbook-core
//!
//! Record schemas and shared types for birdbook.
//!
//! Three record types are kept, one table each:
//!
//! - [`Bird`]: adult birds, ids `B0001`, `B0002`, ...
//! - [`Pair`]: breeding pairs, ids `P0001`, ...
//! - [`Chick`]: chicks, ids `K0001`, ...
//!
//! References between records (a pair's `MaleID`, a chick's `ClutchID`) are
//! plain text and are not checked against the referenced table.

pub mod derived;
pub mod error;
pub mod record;
pub mod vocab;

pub use derived::{age_in_months, age_label, months_between, parse_date, FarmStats};
pub use error::{FarmError, FarmResult};
pub use record::{
    Bird, BirdInput, Chick, ChickInput, Pair, PairInput, Record, BIRDS, CHICKS, PAIRS,
};
pub use vocab::{Badge, ChickSex, ChickStatus, Origin, PairStatus, Sex, UnknownValue};

/// Re-export of the table layer the records are stored through.
pub use birdbook_sheet as sheet;

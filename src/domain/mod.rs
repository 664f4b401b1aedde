//! Negotiation domain: issues, bids and private utility

pub mod bid;
pub mod utility;

pub use bid::{Bid, Domain, Issue};
pub use utility::{LinearAdditiveUtility, ProfileDescription, UtilityFunction};

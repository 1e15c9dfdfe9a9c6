//! awscensus
//!
//! Counts AWS account resources in every region each service supports and
//! reports per-region and cross-region totals.

pub mod aws;
pub mod census;
pub mod config;
pub mod report;
pub mod resource;

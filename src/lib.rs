//! PARIMUTUEL — settlement engine for two-sided pari-mutuel contracts.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod money;
pub mod engine;
pub mod ledger;
pub mod report;

// Library root: re-exports all modules so integration tests and the binary
// can reach the crate's public API.

pub mod config;
pub mod ledger;
pub mod pipeline;
pub mod report;
pub mod slate_file;
pub mod stats;

//! An in-process account ledger with savings and checking balance rules,
//! persisted to a fixed-layout binary file.
pub mod bank;
pub mod telemetry;

//! Loan rate check: applicant input normalization, the multi-step rate check
//! form, and the client for the external scoring service.

pub mod config;
pub mod error;
pub mod rate_check;
pub mod telemetry;

//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `LoanLedger`, the primary entry point for
//! creating loans and recording payments. It owns the persistence port and
//! serializes mutations per loan so each payment event applies atomically.

pub mod ledger;

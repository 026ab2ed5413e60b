//! Loan ledger engine for a lending-portfolio back end: amortization
//! schedule generation, payment allocation under strict monetary
//! invariants, and status derivation for fixed-installment loans.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

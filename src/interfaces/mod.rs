//! Presentation-facing adapters (the CLI's CSV command format).

pub mod csv;

//! Adapters implementing the persistence port.

pub mod in_memory;

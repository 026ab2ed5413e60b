//! Domain layer: entities, value objects, pure status functions, the
//! schedule generator, and the persistence port.

pub mod installment;
pub mod loan;
pub mod money;
pub mod payment;
pub mod ports;
pub mod schedule;

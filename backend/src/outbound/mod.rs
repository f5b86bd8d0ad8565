//! Outbound adapters implementing the driven ports.

pub mod dynamodb;
pub mod identity;
pub mod memory;
pub mod suggest;

//! Domain types and the ports the application layer depends on.

pub mod cart;
pub mod gateway;
pub mod money;
pub mod order;
pub mod ports;

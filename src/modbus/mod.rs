//! Modbus TCP surface: Janitza register projection and the multi-unit
//! server.

pub mod registers;
pub mod server;

pub use server::{run_server, JanitzaService, MeterReadingProvider};

pub mod alerts;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod geo;
pub mod log_io;
pub mod model;
pub mod parser;
pub mod sos;
pub mod stations;
pub mod tracker;

#[cfg(test)]
mod sim_test;

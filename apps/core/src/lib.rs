//! WiseWhisk core: food label lookup, scoring and comparison over the Open
//! Food Facts product database.

pub mod activity;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod session;

#[cfg(test)]
mod tests;

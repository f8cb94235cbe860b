//! # Lookup Module
//!
//! Data access for nutrition records.
//!
//! ## Components
//! - `traits`: the `ProductSource` seam used by the engine
//! - `open_food_facts`: HTTP client for the Open Food Facts API
//! - `local_cache`: optional offline CSV catalog

pub mod local_cache;
pub mod open_food_facts;
pub mod traits;

pub use local_cache::{DatabaseStats, LocalFood, LocalFoodDatabase};
pub use open_food_facts::OpenFoodFactsClient;
pub use traits::ProductSource;

//! Test Module
//!
//! Cross-module test suite for the WiseWhisk core.
//!
//! ## Test Categories
//! - `engine_tests`: parsing, allergen, scoring and comparison pipelines
//! - `lookup_tests`: Open Food Facts client against a mock server, CSV catalog files
//! - `session_tests`: profile, custom ingredients, activity export, session isolation
//! - `integration_tests`: full chat workflows through the copilot

pub mod engine_tests;

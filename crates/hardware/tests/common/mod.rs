//! # Common Test Utilities
//!
//! Helpers shared by the unit tests.

//! Common test utilities for virtualview
//!
//! Shared fixtures, row builders and tree assertions for the integration
//! tests.

#![allow(dead_code)]

mod assertions;
mod builders;
mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;

//! Test utilities for the bip38 workspace
//!
//! Published BIP38 vectors and a logging initialiser shared by unit and
//! integration tests.

pub mod fixtures;
pub mod logging;

pub use fixtures::*;
pub use logging::init_test_logging;

//! Test utilities for the reconciler tests.
//!
//! This module provides a scripted platform and helpers that build a seeded guild.

pub mod fixtures;
pub mod mock_platform;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_platform::{Call, MockLogControl, MockPlatform, MockPresence, Op};

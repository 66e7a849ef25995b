//! # Utilities Module
//!
//! Grid mathematics and seeded random helpers used by generation.

pub mod math;
pub mod random;

pub use math::*;
pub use random::*;

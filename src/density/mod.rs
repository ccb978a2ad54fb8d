//! Exact density evolution over trial state spaces.
//!
//! Instead of sampling trials, this module pushes the full probability mass
//! `P(state)` forward one trial at a time and reads absorbed mass off each
//! intermediate distribution. Every step's result is exact up to floating-point
//! rounding.

pub mod absorption;
pub mod forward;

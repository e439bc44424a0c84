//! Property-based test strategies for sweepcheck.
//!
//! Provides audio buffer generators for exercising the comparator and the
//! sweep descriptor with arbitrary signals and rates.
//!
//! # Usage
//!
//! ```ignore
//! use sweepcheck_proptest::generators::*;
//! use test_strategy::proptest;
//!
//! #[proptest]
//! fn my_test(#[strategy(audio_signal(1..512))] signal: Vec<f32>) {
//!     assert!(!signal.is_empty());
//! }
//! ```

pub mod generators;

pub use proptest;
pub use test_strategy;

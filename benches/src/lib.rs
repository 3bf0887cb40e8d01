//! Criterion harness helpers shared by the shroud benchmarks.

pub use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

/// Standard payload sizes used across the cipher and digest benches.
pub const SIZES: &[usize] = &[64, 1024, 16 * 1024];

//! Deterministic, pure logic shared by the I/O adapters and tools.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod exclude;
pub mod path;
pub mod types;

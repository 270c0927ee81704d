//! # floodmax parallel
//!
//! Fan-out strategies for independent units of work.
//!
//! Only source decomposition is embarrassingly parallel: each input file is
//! split by rank without touching any shared state. Everything downstream of
//! it is a sequential fold and does not use this crate.

pub mod strategy;

pub use strategy::{num_cpus, ParallelError, ParallelStrategy, ProcessingMode};

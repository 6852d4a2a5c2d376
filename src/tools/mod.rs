//! The tools module provides helper functions for the compressor.
//!
//! The tools are:
//! - cli: Command line interface and the options it produces.
//! - freq_count: Frequency count of each byte value in the input.
//!
pub mod cli;
pub mod freq_count;

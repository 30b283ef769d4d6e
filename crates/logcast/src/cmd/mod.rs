//! Command implementations for the logcast CLI

pub mod serve;
pub mod tail;

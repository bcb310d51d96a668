//! Command-line subcommands for the `tilekiln` binary.

pub mod convert;
pub mod generate;
pub mod probe;
pub mod serve;

//! Library half of the `zk` binary, split out so integration tests and the
//! binary share argument parsing and rendering.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;

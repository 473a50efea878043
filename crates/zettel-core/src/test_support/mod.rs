//! Test doubles for the host abstraction

mod mocks;

pub use mocks::MemoryHost;

// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod config;
pub mod data;
pub mod export;
pub mod optimize;
pub mod ranker;
pub mod solver;

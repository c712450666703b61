//! Repository methods, one module per table family, all as `impl TxStore`.

pub mod comment;
pub mod project;
pub mod task;
pub mod user;

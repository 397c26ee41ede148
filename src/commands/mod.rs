//! CLI command implementations.

pub mod add;
pub mod check;
pub mod init;
pub mod list;
pub mod lookup;

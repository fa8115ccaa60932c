//! CLI command implementations

pub mod base;
pub mod get;
pub mod init;
pub mod validators;

pub use base::{Command, CommandContext};
pub use get::GetCommand;
pub use init::InitCommand;

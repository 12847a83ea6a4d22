//! Subcommands of the `version-matrix` binary.

pub mod init;
pub mod run;

//! One module per subcommand.

pub mod apply;
pub mod completions;
pub mod config;
pub mod init;

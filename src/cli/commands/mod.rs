pub mod call;
pub mod serve;
pub mod tools;

use clap::ValueEnum;

/// Output format for listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[cfg(test)]
#[path = "call_test.rs"]
mod call_test;

//! CLI subcommand definitions.

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show current configuration.
    Show,

    /// Enable automatic switching.
    Enable,

    /// Disable automatic switching.
    Disable,

    /// Manually select and activate a config.
    Select {
        /// Identifikationsnummer of the config to switch to.
        number: u32,
    },
}

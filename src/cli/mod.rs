//! Command-line interface for promoforge.
//!
//! Provides commands for starting promotion workflows, polling their status,
//! cancelling them, and regenerating individual assets.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};

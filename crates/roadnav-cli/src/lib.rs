//! Road navigation CLI library.
//!
//! Subcommand handlers and output rendering live here so they can be unit
//! tested without spawning the binary.

pub mod commands;
pub mod output;

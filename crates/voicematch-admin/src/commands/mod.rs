//! Admin command handlers.
//!
//! Each submodule owns the clap definitions and handlers for one command
//! group. Handlers return the JSON printed on stdout.

pub mod engagement;
pub mod penalty;
pub mod profile;
pub mod quota;

use voicematch_engine::{Engine, SqliteStore};

/// The engine every handler runs against.
pub type AdminEngine = Engine<SqliteStore>;

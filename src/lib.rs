//! Core of a DJ set builder: songs placed on a canvas are wired into a chain,
//! the chain becomes a playback queue, and the playback engine walks that
//! queue through songs and the transition clips between them.

pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

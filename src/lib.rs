//! Radioforge Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod archive;
pub mod config;
pub mod manifest;
pub mod media;
pub mod pipeline;
pub mod sanitize;
pub mod songlist;
pub mod station;
pub mod writer;

// Re-export commonly used types for convenience
pub use pipeline::{spawn_build, BuildEvent, BuildOptions, BuildOutcome};
pub use station::{MaterializedSong, Song, SongDeclaration, SourceKind, StationData, WorkingSet};

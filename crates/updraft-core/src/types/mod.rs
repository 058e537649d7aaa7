//! Type definitions shared by the engine crates

mod folders;
mod runtime_config;

pub use folders::KnownFolders;
pub use runtime_config::*;

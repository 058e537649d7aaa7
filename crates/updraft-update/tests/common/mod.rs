//! Common test infrastructure for updraft-update tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Versions, names and payloads shared across tests
//! - `builders`: Engine config, folders and release feed builders
//! - `fakes`: Recording process monitor, launcher, registrar and progress sink
//! - `mock_server`: Wiremock setup helpers for feed and asset endpoints

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod fakes;
pub mod mock_server;

pub use builders::*;
pub use constants::*;
pub use fakes::*;
pub use mock_server::*;

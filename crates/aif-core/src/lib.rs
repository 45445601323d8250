pub mod baseline;
pub mod checksum;
pub mod classify;
pub mod config;
pub mod error;
pub mod io;
pub mod manifest;
pub mod merge;
pub mod paths;
pub mod sections;
pub mod update;

pub use error::{AifError, Result};

pub mod checksum;
pub mod classify;
pub mod merge;
pub mod sections;
pub mod update;

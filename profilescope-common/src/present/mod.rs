//! Derived display values. Nothing in here performs I/O.

pub mod profile;
pub mod timeline;

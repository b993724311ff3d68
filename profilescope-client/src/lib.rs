pub mod client;

pub use client::{DEFAULT_BASE_URL, Directory, DirectoryClient, DirectoryError};
pub use reqwest::StatusCode;

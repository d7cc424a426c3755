pub mod client;
pub mod types;
pub mod upload;

pub use client::{ApiClient, PAGE_SIZE};
pub use upload::Uploader;

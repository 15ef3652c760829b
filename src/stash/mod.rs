mod client;
pub mod models;

pub use client::StashClient;
pub use models::{FileRecord, Fingerprint, Scene, SceneCatalog, OSHASH, PHASH};

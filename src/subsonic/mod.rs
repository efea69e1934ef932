// Subsonic integration for catalog synchronization
//
// This module provides:
// - Server credential value type (supplied decrypted by the caller)
// - Catalog client with paginated album listing and windowed track fan-out
// - Connection probe against the server's ping endpoint

pub mod client;

// Re-export commonly used types
pub use client::{ServerCredentials, SubsonicClient};

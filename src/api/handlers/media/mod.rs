pub mod delete;
pub mod hash;
pub mod multipart;
pub mod types;
pub mod upload;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use delete::delete_media;
pub use hash::get_media_hash;
pub use upload::{upload_media, upload_multiple_media};

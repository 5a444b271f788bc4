pub mod response;

pub use response::{ErrorResponse, GalleryResponse, HealthResponse, UploadResponse};

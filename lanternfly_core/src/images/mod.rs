pub mod naming;
pub mod service;
pub mod validation;

pub use naming::{sanitize_filename, storage_key, Clock, FixedClock, SystemClock};
pub use service::{ImageService, ImageUpload};
pub use validation::ValidationError;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    Json,
};
use tracing::debug;

use crate::{
    error::{AppError, Result},
    images::{ImageUpload, ValidationError},
    models::{GalleryResponse, UploadResponse},
    AppState,
};

/// Name of the multipart part carrying the image.
pub const FILE_FIELD: &str = "file";

pub async fn upload_image(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!("Upload without a multipart body: {}", rejection);
            return Err(ValidationError::MissingFile.into());
        }
    };

    let limit = state.max_upload_bytes;
    let mut upload: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::from_multipart(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // A part without a filename parameter is a plain form value, not a file.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        // Raw header: the parsed form drops values the mime parser rejects.
        let content_type = field
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::from_multipart(e, limit))?;

        upload = Some(ImageUpload {
            filename,
            content_type,
            data,
        });
        break;
    }

    let upload = upload.ok_or(ValidationError::MissingFile)?;
    let url = state.images.upload(upload).await?;

    Ok(Json(UploadResponse::new(url)))
}

pub async fn list_gallery(State(state): State<AppState>) -> Result<Json<GalleryResponse>> {
    let gallery = state.images.gallery().await?;
    debug!("Gallery lists {} images", gallery.len());

    Ok(Json(GalleryResponse::new(gallery)))
}

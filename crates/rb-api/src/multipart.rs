//! Reads the multipart create/edit post form.

use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use rb_core::error::AppError;
use rb_core::forms::{PostForm, Upload, MAX_TEXT_BYTES};

use crate::error::ApiError;

fn malformed(err: impl std::fmt::Display) -> ApiError {
    ApiError(AppError::ValidationError(format!("malformed form data: {err}")))
}

/// Decodes a text part. A part cut at the cap is already too long for
/// validation, so only complete parts have to be valid UTF-8.
fn text_value(data: Vec<u8>) -> Result<String, ApiError> {
    if data.len() > MAX_TEXT_BYTES {
        return Ok(String::from_utf8_lossy(&data).into_owned());
    }
    String::from_utf8(data).map_err(malformed)
}

/// Collects the known fields; unknown parts are drained and ignored.
///
/// Parts are kept up to one byte past their cap (`max_upload` for the file,
/// `MAX_TEXT_BYTES` for text) so that validation can report them as too large.
pub async fn read_post_form(mut payload: Multipart, max_upload: usize) -> Result<PostForm, ApiError> {
    let mut form = PostForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);

        let cap = if name == "image" { max_upload } else { MAX_TEXT_BYTES };
        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            let room = (cap + 1).saturating_sub(data.len());
            data.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }

        match name.as_str() {
            "text" => form.text = text_value(data)?,
            "group" => form.group = text_value(data)?,
            "image" => {
                form.image = Some(Upload {
                    filename: filename.unwrap_or_default(),
                    data,
                })
            }
            "image-clear" => form.clear_image = true,
            _ => {}
        }
    }

    Ok(form)
}

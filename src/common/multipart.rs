use axum::extract::Multipart;

use crate::common::error::AppError;

// ---
// Helper: extrai o campo "file" de um multipart (nome + bytes).
// ---
pub(crate) async fn read_uploaded_file(
    mut multipart: Multipart,
) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e)))?;
            return Ok((file_name, bytes.to_vec()));
        }
    }

    Err(AppError::EmptyFile)
}

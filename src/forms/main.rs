use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};

/// File sent by the portal for one upload field.
#[derive(MultipartForm)]
pub struct UploadFileForm {
    /// Label of the field the file belongs to.
    pub label: Text<String>,
    #[multipart(limit = "10MB")]
    pub file: TempFile,
}

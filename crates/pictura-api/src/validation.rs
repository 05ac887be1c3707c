//! Upload validation
//!
//! Checks run before anything is written to the blob store. Every rejection
//! maps to the flash message shown to the uploader.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Request has no file part")]
    MissingFilePart,

    #[error("File part has an empty filename")]
    NoSelectedFile,

    #[error("Extension of '{0}' is not in the allow-list")]
    ExtensionNotAllowed(String),

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("File size {size} bytes exceeds maximum allowed size of {max} bytes")]
    FileTooLarge { size: usize, max: usize },
}

pub const FLASH_FILE_TOO_LARGE: &str = "File too large";

impl ValidationError {
    pub fn flash_message(&self) -> &'static str {
        match self {
            ValidationError::MissingFilePart => "No file part",
            ValidationError::NoSelectedFile => "No selected file",
            ValidationError::ExtensionNotAllowed(_) => "File type not allowed",
            ValidationError::EmptyFile => "File is empty",
            ValidationError::FileTooLarge { .. } => FLASH_FILE_TOO_LARGE,
        }
    }
}

/// Upload limits taken from configuration.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub allowed_extensions: Vec<String>,
    pub max_file_size_bytes: usize,
}

impl UploadPolicy {
    /// True when `filename` has an extension in the allow-list (case-insensitive).
    pub fn allows(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }

    pub fn check_filename(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.is_empty() {
            return Err(ValidationError::NoSelectedFile);
        }
        if !self.allows(filename) {
            return Err(ValidationError::ExtensionNotAllowed(filename.to_string()));
        }
        Ok(())
    }

    pub fn check_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if size > self.max_file_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size_bytes,
            });
        }
        Ok(())
    }
}

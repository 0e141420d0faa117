pub mod reader;

pub use reader::{DocxReader, ParseError};

use sha2::{Digest, Sha256};

/// Stable fingerprint of a document's raw bytes, for log correlation
pub fn document_id(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Extract plain text from an uploaded .docx
pub fn extract_text(bytes: &[u8]) -> Result<String, ParseError> {
    let text = DocxReader::read_bytes(bytes)?;
    tracing::debug!(
        document_id = %document_id(bytes),
        chars = text.chars().count(),
        "Extracted document text"
    );
    Ok(text)
}

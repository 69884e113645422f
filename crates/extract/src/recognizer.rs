use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
}

/// Anything that turns an image into text. The engine only ever sees the
/// text; recognition technology stays behind this trait.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

// ── Mock backend ─────────────────────────────────────────────────────────────

/// Returns canned text whatever the image; lets the scan pipeline run in
/// tests without a recognition engine.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

/// Always fails; exercises the error path of callers.
pub struct FailingRecognizer;

impl OcrBackend for FailingRecognizer {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        if image_bytes.is_empty() {
            Err(OcrError::ImageDecode("empty image".into()))
        } else {
            Err(OcrError::Engine("no text layer".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("STARBUCKS\n$5.50\nVISA");
        assert_eq!(r.recognize(b"fake image data").unwrap(), "STARBUCKS\n$5.50\nVISA");
        assert_eq!(r.recognize(b"").unwrap(), "STARBUCKS\n$5.50\nVISA");
    }

    #[test]
    fn failing_recognizer_reports_why() {
        assert!(matches!(FailingRecognizer.recognize(b""), Err(OcrError::ImageDecode(_))));
        assert!(matches!(FailingRecognizer.recognize(b"png"), Err(OcrError::Engine(_))));
    }
}

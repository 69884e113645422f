use std::sync::Arc;

use thiserror::Error;

use crate::budget::{CancelToken, Cancelled};
use crate::engine::{ExtractionRequest, Extractor};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::ExtractionResult;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("Scan cancelled")]
    Cancelled,
    #[error("Scan worker failed: {0}")]
    Worker(String),
}

impl From<Cancelled> for PipelineError {
    fn from(_: Cancelled) -> Self {
        PipelineError::Cancelled
    }
}

/// Orchestrates: recognize → extract, on a blocking worker thread so async
/// callers are never stalled by CPU-bound work.
pub struct ScanPipeline<R: OcrBackend> {
    recognizer: Arc<R>,
    extractor: Arc<Extractor>,
}

impl<R: OcrBackend> Clone for ScanPipeline<R> {
    fn clone(&self) -> Self {
        Self {
            recognizer: Arc::clone(&self.recognizer),
            extractor: Arc::clone(&self.extractor),
        }
    }
}

impl<R: OcrBackend + 'static> ScanPipeline<R> {
    pub fn new(recognizer: R, extractor: Extractor) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            extractor: Arc::new(extractor),
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Recognize `image` and extract its fields. `cancel` is honoured before
    /// recognition, between recognition and extraction, and between
    /// extractors.
    pub async fn scan(
        &self,
        image: Vec<u8>,
        request: ExtractionRequest,
        cancel: CancelToken,
    ) -> Result<ExtractionResult, PipelineError> {
        cancel.check()?;
        let recognizer = Arc::clone(&self.recognizer);
        let extractor = Arc::clone(&self.extractor);

        let handle = tokio::task::spawn_blocking(move || -> Result<ExtractionResult, PipelineError> {
            let text = recognizer.recognize(&image)?;
            tracing::debug!(bytes = image.len(), chars = text.chars().count(), "Image recognized");
            cancel.check()?;
            Ok(extractor.extract_cancellable(&text, &request, &cancel)?)
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => Err(PipelineError::Worker(e.to_string())),
        }
    }

    /// Extract from text that was recognized elsewhere (e.g. a PDF text layer).
    pub async fn scan_text(
        &self,
        text: String,
        request: ExtractionRequest,
        cancel: CancelToken,
    ) -> Result<ExtractionResult, PipelineError> {
        cancel.check()?;
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || extractor.extract_cancellable(&text, &request, &cancel))
            .await
            .map_err(|e| PipelineError::Worker(e.to_string()))?
            .map_err(PipelineError::from)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

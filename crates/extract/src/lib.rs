//! Receipt field extraction.
//!
//! Raw recognized text goes in, an [`ExtractionResult`] proposal comes out:
//! one optional value and confidence per receipt field, each traceable to a
//! substring of the input. Nothing is persisted here; the [`ReviewGate`]
//! decides which proposed values reach a stored record.

pub mod aggregate;
pub mod budget;
pub mod candidate;
pub mod config;
pub mod engine;
pub mod extractors;
pub mod fuzzy;
pub mod normalize;
pub mod pipeline;
pub mod rank;
pub mod recognizer;
pub mod review;
pub mod types;

pub use budget::{BudgetExceeded, CancelToken, Cancelled};
pub use candidate::{Candidate, PatternId};
pub use config::{ConfigError, ExtractionConfig};
pub use engine::{ExtractionRequest, Extractor};
pub use extractors::{ExtractionInput, FieldExtractor};
pub use normalize::{NormalizedText, Span};
pub use pipeline::{PipelineError, ScanPipeline};
pub use rank::ScoredCandidate;
pub use recognizer::{FailingRecognizer, MockRecognizer, OcrBackend, OcrError};
pub use review::{MergeReport, ReviewError, ReviewGate};
pub use types::{Confidence, ExtractedField, ExtractionResult, Field, FieldValue, ValueKind};

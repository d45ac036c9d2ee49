//! OCR parsing pipeline for Philippine BIR-style receipts and invoices.
//!
//! Unordered `(polygon, text, confidence)` tokens from an OCR engine go
//! through reading-order line reconstruction, paragraph assembly, rule-based
//! field extraction, and expense-category suggestion, producing a
//! [`ScanResult`] ready for a human review form. The engine itself is
//! injected through [`OcrBackend`]; everything after it is pure and
//! deterministic.

pub mod categorize;
pub mod extract;
pub mod layout;
pub mod pipeline;
pub mod recognizer;
pub mod types;

pub use categorize::{categories_from_toml, suggest_category};
pub use extract::Extractor;
pub use layout::{normalize_whitespace, LineReconstructor, Paragraph};
pub use pipeline::{parse_tokens, PipelineError, ReceiptPipeline, ScanResult};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError};
pub use types::{TextLine, Token};

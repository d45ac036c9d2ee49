use thiserror::Error;

use crate::types::Token;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract backend not compiled; enable the `tesseract` feature")]
    NotAvailable,
}

/// Abstraction over an OCR engine.
///
/// Implementations accept raw PNG/JPEG image bytes and return the recognized
/// tokens with their locations. The engine is constructed once by the caller
/// and injected; `Send + Sync` lets a single instance serve concurrent
/// pipeline invocations.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<Token>, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set token list regardless of input — drives pipeline tests
/// without a system OCR library installed.
pub struct MockRecognizer {
    pub tokens: Vec<Token>,
}

impl MockRecognizer {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<Vec<Token>, OcrError> {
        Ok(self.tokens.clone())
    }
}

// ── Tesseract word-box conversion ─────────────────────────────────────────────

/// Convert Tesseract TSV output into tokens. Word rows are level 5 with
/// columns left/top/width/height at 6..=9, confidence (0-100) at 10 and text
/// at 11. Structural rows and empty text cells are dropped.
pub fn parse_word_tsv(tsv: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for row in tsv.lines() {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }
        let (Ok(left), Ok(top), Ok(width), Ok(height), Ok(conf)) = (
            cols[6].parse::<f32>(),
            cols[7].parse::<f32>(),
            cols[8].parse::<f32>(),
            cols[9].parse::<f32>(),
            cols[10].parse::<f32>(),
        ) else {
            continue;
        };
        tokens.push(Token::from_rect(
            left,
            top,
            width,
            height,
            text,
            (conf / 100.0).clamp(0.0, 1.0),
        ));
    }
    tokens
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{parse_word_tsv, OcrBackend, OcrError};
    use crate::types::Token;
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<Token>, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            let tsv = lt
                .get_tsv_text(0)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(parse_word_tsv(&tsv))
        }
    }
}

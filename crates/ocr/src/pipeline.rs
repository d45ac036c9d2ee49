//! Pipeline orchestration: tokens in, structured scan result out.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use resibo_core::{CategorySuggestion, ExpenseCategory, ParsedReceipt};

use crate::categorize::suggest_category;
use crate::extract::Extractor;
use crate::layout::{LineReconstructor, Paragraph};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::Token;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// The caller-facing result of one scan: the structured record at the top
/// level, the category verdict, the normalized paragraph, and the overall
/// confidence rounded to four decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(flatten)]
    pub record: ParsedReceipt,
    pub suggested_category: CategorySuggestion,
    pub raw_text: String,
    pub confidence: f32,
}

/// The pure stage chain: reconstruct reading order, build the paragraph,
/// extract fields, suggest a category. Infallible; empty input yields the
/// fully-default result.
pub fn parse_tokens(
    tokens: &[Token],
    categories: &[ExpenseCategory],
    reconstructor: &LineReconstructor,
) -> ScanResult {
    let lines = reconstructor.reconstruct(tokens);
    let paragraph = Paragraph::from_lines(&lines);
    tracing::debug!(
        tokens = tokens.len(),
        lines = lines.len(),
        "reconstructed reading order"
    );

    let line_texts: Vec<String> = lines.iter().map(|l| l.text.clone()).collect();
    let record = Extractor::extract(&line_texts, &paragraph.text);
    let suggested_category = suggest_category(&paragraph.text, categories);
    tracing::debug!(category = %suggested_category.name, "suggested category");

    ScanResult {
        record,
        suggested_category,
        raw_text: paragraph.text,
        confidence: round4(paragraph.confidence),
    }
}

fn round4(v: f32) -> f32 {
    (v * 10_000.0).round() / 10_000.0
}

/// Binds an injected OCR backend to the stage chain.
pub struct ReceiptPipeline<R: OcrBackend> {
    recognizer: R,
    reconstructor: LineReconstructor,
}

impl<R: OcrBackend> ReceiptPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            reconstructor: LineReconstructor::default(),
        }
    }

    pub fn with_reconstructor(recognizer: R, reconstructor: LineReconstructor) -> Self {
        Self { recognizer, reconstructor }
    }

    /// Recognize raw image bytes and run the stage chain.
    pub fn process_image(
        &self,
        image_bytes: &[u8],
        categories: &[ExpenseCategory],
    ) -> Result<ScanResult, PipelineError> {
        let tokens = self.recognizer.recognize(image_bytes)?;
        Ok(parse_tokens(&tokens, categories, &self.reconstructor))
    }

    /// Read an image file from disk and process it.
    pub fn process_file(
        &self,
        path: &Path,
        categories: &[ExpenseCategory],
    ) -> Result<ScanResult, PipelineError> {
        tracing::info!("Processing receipt image: {}", path.display());
        let bytes = std::fs::read(path)?;
        self.process_image(&bytes, categories)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::MockRecognizer;
    use resibo_core::record::{ReceiptType, VatStatus};

    /// Token rows of a small but complete BIR-style receipt. Rows are handed
    /// over shuffled; reconstruction must restore reading order.
    fn receipt_tokens() -> Vec<Token> {
        let rows: &[(f32, &[&str])] = &[
            (0.0, &["ACME", "TRADING"]),
            (20.0, &["123", "Rizal", "Ave,", "Manila"]),
            (40.0, &["VAT", "REG", "TIN:", "123-456-789-000"]),
            (60.0, &["OR", "No:", "4567"]),
            (80.0, &["Date:", "03/15/2024"]),
            (100.0, &["SOLD", "TO:", "Juan", "dela", "Cruz"]),
            (120.0, &["Quezon", "City"]),
            (140.0, &["1", "Bond", "paper", "250.00", "250.00"]),
            (160.0, &["VATABLE", "SALES", "223.21"]),
            (180.0, &["VAT", "AMOUNT", "26.79"]),
            (200.0, &["TOTAL", "AMOUNT", "DUE", "250.00"]),
        ];
        let mut tokens = Vec::new();
        for (y, words) in rows {
            let mut x = 0.0;
            for w in *words {
                tokens.push(Token::from_rect(x, *y, 10.0 * w.len() as f32, 12.0, *w, 0.9));
                x += 10.0 * w.len() as f32 + 8.0;
            }
        }
        tokens.reverse();
        tokens
    }

    fn office_categories() -> Vec<ExpenseCategory> {
        vec![ExpenseCategory::new(1, "Office Supplies", "bond paper,ink")]
    }

    #[test]
    fn parse_tokens_end_to_end() {
        let result = parse_tokens(
            &receipt_tokens(),
            &office_categories(),
            &LineReconstructor::default(),
        );

        let r = &result.record;
        assert_eq!(r.seller.registered_business_name, "ACME TRADING");
        assert_eq!(r.seller.business_address, "123 Rizal Ave, Manila");
        assert_eq!(r.seller.tin, "123-456-789-000");
        assert_eq!(r.seller.vat_status, VatStatus::Vat);
        assert_eq!(r.receipt.receipt_type, ReceiptType::OfficialReceipt);
        assert_eq!(r.receipt.serial_number, "4567");
        assert_eq!(r.receipt.transaction_date, "2024-03-15T00:00:00");
        assert_eq!(r.buyer.buyer_name, "Juan dela Cruz");
        assert_eq!(r.buyer.buyer_address, "Quezon City");
        assert_eq!(r.receipt.vatable_sales, "223.21");
        assert_eq!(r.receipt.vat_amount, "26.79");
        assert_eq!(r.receipt.total_amount_due, "250.00");
        assert_eq!(r.receipt.gross_sales, "250.00");
        assert_eq!(r.items.len(), 1);
        assert_eq!(r.items[0].description, "Bond paper");

        assert_eq!(result.suggested_category.id, Some(1));
        assert_eq!(result.suggested_category.name, "Office Supplies");
        assert!(result.raw_text.starts_with("ACME TRADING 123 Rizal Ave, Manila"));
        assert!((result.confidence - 0.9).abs() < 1e-3);
    }

    #[test]
    fn empty_tokens_produce_default_result() {
        let result = parse_tokens(&[], &[], &LineReconstructor::default());
        assert_eq!(result.record, ParsedReceipt::default());
        assert_eq!(result.suggested_category, CategorySuggestion::uncategorized());
        assert_eq!(result.raw_text, "");
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn confidence_is_rounded_to_four_decimals() {
        let tokens = vec![Token::from_rect(0.0, 0.0, 40.0, 12.0, "hi", 0.123_456)];
        let result = parse_tokens(&tokens, &[], &LineReconstructor::default());
        assert!((result.confidence - 0.1235).abs() < 1e-5);
    }

    #[test]
    fn scan_result_serializes_contract_shape() {
        let result = parse_tokens(&[], &[], &LineReconstructor::default());
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "buyer", "confidence", "items", "printer", "raw_text", "receipt",
                "seller", "suggested_category",
            ]
        );
        assert_eq!(json["suggested_category"]["name"], "Uncategorized");
        assert_eq!(json["suggested_category"]["id"], serde_json::Value::Null);
        assert_eq!(json["receipt"]["receipt_type"], "OFFICIAL_RECEIPT");
    }

    #[test]
    fn process_image_runs_recognizer_output_through_stages() {
        let pipeline = ReceiptPipeline::new(MockRecognizer::new(receipt_tokens()));
        let result = pipeline.process_image(b"raw bytes", &office_categories()).unwrap();
        assert_eq!(result.record.receipt.total_amount_due, "250.00");
        assert_eq!(result.suggested_category.name, "Office Supplies");
    }

    #[test]
    fn process_file_reads_bytes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        std::fs::write(&path, b"not really a png").unwrap();

        let pipeline = ReceiptPipeline::new(MockRecognizer::new(receipt_tokens()));
        let result = pipeline.process_file(&path, &[]).unwrap();
        assert_eq!(result.record.seller.tin, "123-456-789-000");
    }

    #[test]
    fn process_file_missing_path_is_io_error() {
        let pipeline = ReceiptPipeline::new(MockRecognizer::new(vec![]));
        let err = pipeline
            .process_file(Path::new("/definitely/not/here.png"), &[])
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}

//! Domain types for the resibo receipt scanner.
//!
//! This crate is dependency-light on purpose: it holds the structured
//! record produced by OCR extraction, the expense-category types used by
//! the classifier, and monetary normalization. All parsing lives in
//! `resibo-ocr`.

pub mod amount;
pub mod category;
pub mod record;

pub use category::{CategorySuggestion, ExpenseCategory};
pub use record::{
    BuyerInfo, ParsedReceipt, PrinterInfo, ReceiptInfo, ReceiptItem, ReceiptType, SellerInfo,
    VatStatus,
};

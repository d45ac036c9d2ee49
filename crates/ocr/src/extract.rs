//! Keyword- and layout-driven field extraction over reconstructed lines.
//!
//! Each sub-extraction is an independent pass with an explicit fallback, so
//! the cascade as a whole is total: sparse or garbled input produces empty
//! fields, never an error. Evaluation order matters on ambiguous input and
//! is fixed here.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use rust_decimal::Decimal;

use resibo_core::amount::{normalize_amount, parse_amount};
use resibo_core::record::{
    BuyerInfo, ParsedReceipt, PrinterInfo, ReceiptInfo, ReceiptItem, ReceiptType, SellerInfo,
    VatStatus,
};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_tin,
    r"(\d{3})[-\s.]?(\d{3})[-\s.]?(\d{3})[-\s.]?(\d{3})");
re!(re_amount,
    r"\d[\d,]*\.\d{2}");
re!(re_serial_label,
    r"(?i)(?:No\.?|#|Receipt\s*(?:No|#)\.?)\s*[:\-]?\s*([A-Z0-9\-]+)");
re!(re_atp_label,
    r"(?i)(?:ATP|Authority\s+to\s+Print)\s*(?:No\.?|#)?\s*[:\-]?\s*([A-Z0-9\-]+)");
re!(re_item_row,
    r"^(\d+(?:\.\d+)?)\s+(.+?)\s+(\d[\d,]*\.\d{2})\s+(\d[\d,]*\.\d{2})$");
re!(re_short_number,
    r"\b\d{5,8}\b");
re!(re_long_number,
    r"\b\d{4,}\b");
re!(re_buyer_label,
    r"(?i)(?:sold\s*to|customer|buyer)\s*[:\-]?\s*");
re!(re_printer_label,
    r"(?i)(?:printed\s*by|printer)\s*[:\-]?\s*");

re!(re_date_numeric,
    r"\b(\d{1,2})[/\-](\d{1,2})[/\-](\d{2,4})\b");
re!(re_date_textual,
    r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z.]*\s+(\d{1,2}),?\s+(\d{4})\b");

// ── Keyword tables ───────────────────────────────────────────────────────────

const HEADER_STOP_KEYWORDS: &[&str] = &[
    "OFFICIAL RECEIPT", "SALES INVOICE", "OR NO", "SI NO", "DATE", "VAT REG", "TIN",
];
const BUYER_TIN_CONTEXT: &[&str] = &["SOLD", "BUYER", "CUSTOMER"];
const PRINTER_TIN_CONTEXT: &[&str] = &["PRINT", "ATP", "ACCREDIT"];
const BUYER_LABEL_KEYWORDS: &[&str] = &["SOLD TO", "CUSTOMER", "BUYER"];
const BUYER_ADDRESS_STOP: &[&str] = &["TIN", "DATE", "QTY", "TOTAL", "VATABLE"];
const PRINTER_LABEL_KEYWORDS: &[&str] = &["PRINTED BY", "PRINTER"];

const GROSS_SALES_KEYWORDS: &[&str] = &["GROSS SALES", "GROSS"];
const VATABLE_SALES_KEYWORDS: &[&str] = &["VATABLE SALES", "VATABLE"];
const VAT_AMOUNT_KEYWORDS: &[&str] = &["VAT AMOUNT", "VAT AMT", "12%", "OUTPUT TAX"];
const VAT_EXEMPT_KEYWORDS: &[&str] = &["VAT-EXEMPT", "VAT EXEMPT", "EXEMPT SALES"];
const ZERO_RATED_KEYWORDS: &[&str] = &["ZERO-RATED", "ZERO RATED"];
const TOTAL_DUE_KEYWORDS: &[&str] = &[
    "TOTAL AMOUNT DUE", "TOTAL DUE", "AMOUNT DUE", "TOTAL AMT", "GRAND TOTAL", "TOTAL SALE",
];

fn contains_any(upper: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| upper.contains(kw))
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Extract a fully-populated receipt record from ordered line texts and
    /// the normalized paragraph. Never fails; unmatched fields stay at their
    /// defaults.
    pub fn extract(lines: &[String], paragraph: &str) -> ParsedReceipt {
        let mut record = ParsedReceipt::default();
        if lines.is_empty() {
            return record;
        }

        record.receipt.receipt_type = Self::detect_receipt_type(paragraph);
        record.seller.vat_status = Self::detect_vat_status(paragraph);
        Self::extract_seller_header(lines, &mut record.seller);
        Self::assign_tins(lines, &mut record);
        record.receipt.serial_number = Self::extract_serial_number(lines);
        record.receipt.transaction_date = Self::extract_transaction_date(lines);
        Self::extract_buyer(lines, &mut record.buyer);
        Self::extract_financials(lines, paragraph, &mut record.receipt);
        record.items = Self::extract_items(lines);
        Self::extract_printer(lines, &mut record.printer);

        record
    }

    // ── Document classification ───────────────────────────────────────────────

    fn detect_receipt_type(paragraph: &str) -> ReceiptType {
        if paragraph.to_uppercase().contains("SALES INVOICE") {
            ReceiptType::SalesInvoice
        } else {
            ReceiptType::OfficialReceipt
        }
    }

    fn detect_vat_status(paragraph: &str) -> VatStatus {
        let p = paragraph.to_uppercase();
        if p.contains("NON-VAT") || p.contains("NON VAT") {
            VatStatus::NonVat
        } else if p.contains("VAT REG") || p.contains("VAT REGISTERED") {
            VatStatus::Vat
        } else {
            VatStatus::NonVat
        }
    }

    // ── Seller header ─────────────────────────────────────────────────────────

    /// The masthead is whatever sits above the first structural keyword,
    /// capped at six lines: first line is the registered name, the rest the
    /// address.
    fn extract_seller_header(lines: &[String], seller: &mut SellerInfo) {
        let mut header: Vec<&str> = Vec::new();
        for ln in lines.iter().take(6) {
            let up = ln.trim().to_uppercase();
            if contains_any(&up, HEADER_STOP_KEYWORDS) {
                break;
            }
            header.push(ln.trim());
        }
        if let Some((name, rest)) = header.split_first() {
            seller.registered_business_name = name.to_string();
            seller.business_address = rest.join(" ");
        }
    }

    // ── TIN collection and role assignment ────────────────────────────────────

    /// First TIN on the page belongs to the seller. Later TINs are assigned
    /// by keyword context; with no recognizable context the buyer slot fills
    /// before the printer slot.
    fn assign_tins(lines: &[String], record: &mut ParsedReceipt) {
        let mut found: Vec<(String, String)> = Vec::new();
        for ln in lines {
            if let Some(c) = re_tin().captures(ln) {
                let tin = format!("{}-{}-{}-{}", &c[1], &c[2], &c[3], &c[4]);
                found.push((tin, ln.to_uppercase()));
            }
        }

        let mut rest = found.into_iter();
        if let Some((tin, _)) = rest.next() {
            record.seller.tin = tin;
        }
        for (tin, context) in rest {
            if contains_any(&context, BUYER_TIN_CONTEXT) {
                record.buyer.buyer_tin = tin;
            } else if contains_any(&context, PRINTER_TIN_CONTEXT) {
                record.printer.printer_tin = tin;
            } else if record.buyer.buyer_tin.is_empty() {
                record.buyer.buyer_tin = tin;
            } else {
                record.printer.printer_tin = tin;
            }
        }
    }

    // ── Serial number ─────────────────────────────────────────────────────────

    fn extract_serial_number(lines: &[String]) -> String {
        for ln in lines {
            if let Some(c) = re_serial_label().captures(ln) {
                if let Some(m) = c.get(1) {
                    return m.as_str().trim().to_string();
                }
            }
        }
        // No labeled serial: a bare 5-8 digit number near the top is the
        // next best guess. Last match on the line, since prefixes like
        // branch codes tend to come first.
        for ln in lines.iter().take(10) {
            if let Some(m) = re_short_number().find_iter(ln).last() {
                return m.as_str().to_string();
            }
        }
        String::new()
    }

    // ── Transaction date ──────────────────────────────────────────────────────

    fn extract_transaction_date(lines: &[String]) -> String {
        for ln in lines {
            if let Some(date) = find_date(ln) {
                return date.format("%Y-%m-%dT00:00:00").to_string();
            }
        }
        String::new()
    }

    // ── Buyer block ───────────────────────────────────────────────────────────

    fn extract_buyer(lines: &[String], buyer: &mut BuyerInfo) {
        for (i, ln) in lines.iter().enumerate() {
            let up = ln.to_uppercase();
            if !contains_any(&up, BUYER_LABEL_KEYWORDS) {
                continue;
            }
            let name = re_buyer_label().replace_all(ln, "").trim().to_string();
            if !name.is_empty() {
                buyer.buyer_name = name;
            }
            // The next line is usually the address, unless it already
            // belongs to another block.
            if let Some(next) = lines.get(i + 1) {
                if !contains_any(&next.to_uppercase(), BUYER_ADDRESS_STOP) {
                    buyer.buyer_address = next.trim().to_string();
                }
            }
            break;
        }
    }

    // ── Financial summary ─────────────────────────────────────────────────────

    /// First line carrying one of the field's keywords wins; the last amount
    /// on that line is taken because labels precede figures. A keyword line
    /// without an amount keeps the scan going.
    fn labeled_amount(lines: &[String], keywords: &[&str]) -> String {
        for ln in lines {
            if !contains_any(&ln.to_uppercase(), keywords) {
                continue;
            }
            if let Some(m) = re_amount().find_iter(ln).last() {
                return normalize_amount(m.as_str());
            }
        }
        String::new()
    }

    fn extract_financials(lines: &[String], paragraph: &str, receipt: &mut ReceiptInfo) {
        receipt.gross_sales = Self::labeled_amount(lines, GROSS_SALES_KEYWORDS);
        receipt.vatable_sales = Self::labeled_amount(lines, VATABLE_SALES_KEYWORDS);
        receipt.vat_amount = Self::labeled_amount(lines, VAT_AMOUNT_KEYWORDS);
        receipt.vat_exempt_sales = Self::labeled_amount(lines, VAT_EXEMPT_KEYWORDS);
        receipt.zero_rated_sales = Self::labeled_amount(lines, ZERO_RATED_KEYWORDS);
        receipt.total_amount_due = Self::labeled_amount(lines, TOTAL_DUE_KEYWORDS);

        // No labeled total anywhere: the largest amount on the page is the
        // most plausible candidate.
        if receipt.total_amount_due.is_empty() {
            if let Some(max) = re_amount()
                .find_iter(paragraph)
                .filter_map(|m| parse_amount(m.as_str()))
                .max()
            {
                let mut max: Decimal = max;
                max.rescale(2);
                receipt.total_amount_due = max.to_string();
            }
        }
        if receipt.gross_sales.is_empty() {
            receipt.gross_sales = receipt.total_amount_due.clone();
        }
    }

    // ── Line items ────────────────────────────────────────────────────────────

    fn extract_items(lines: &[String]) -> Vec<ReceiptItem> {
        lines
            .iter()
            .filter_map(|ln| re_item_row().captures(ln.trim()))
            .map(|c| ReceiptItem {
                quantity: c[1].to_string(),
                description: c[2].trim().to_string(),
                unit_cost: normalize_amount(&c[3]),
                // Stored as printed; reconciliation against qty x unit cost
                // is the reviewer's call.
                line_total: normalize_amount(&c[4]),
            })
            .collect()
    }

    // ── Printer / accreditation block ─────────────────────────────────────────

    fn extract_printer(lines: &[String], printer: &mut PrinterInfo) {
        for ln in lines {
            if let Some(c) = re_atp_label().captures(ln) {
                if let Some(m) = c.get(1) {
                    printer.authority_to_print_number = m.as_str().trim().to_string();
                    break;
                }
            }
        }

        for (i, ln) in lines.iter().enumerate() {
            let up = ln.to_uppercase();
            if !contains_any(&up, PRINTER_LABEL_KEYWORDS) {
                continue;
            }
            let name = re_printer_label().replace_all(ln, "").trim().to_string();
            if !name.is_empty() {
                printer.printer_name = name;
            }
            // Footer blocks are compact; the next line is the address.
            if let Some(next) = lines.get(i + 1) {
                printer.printer_address = next.trim().to_string();
            }
            break;
        }

        for ln in lines {
            let up = ln.to_uppercase();
            if up.contains("DATE ISSUED") || up.contains("ISSUE DATE") {
                if let Some(date) = find_date(ln) {
                    printer.atp_issue_date = date.format("%Y-%m-%d").to_string();
                }
                break;
            }
        }

        for ln in lines {
            let up = ln.to_uppercase();
            if up.contains("SERIAL") && (up.contains("RANGE") || ln.contains('-')) {
                let nums: Vec<&str> =
                    re_long_number().find_iter(ln).map(|m| m.as_str()).collect();
                if nums.len() >= 2 {
                    printer.serial_start = nums[0].to_string();
                    printer.serial_end = nums[1].to_string();
                }
                break;
            }
        }
    }
}

// ── Date helpers ──────────────────────────────────────────────────────────────

/// First date on the line, numeric or textual, whichever appears earlier.
/// An unparseable match yields None so callers skip to the next line.
fn find_date(line: &str) -> Option<NaiveDate> {
    let numeric = re_date_numeric().captures(line);
    let textual = re_date_textual().captures(line);
    match (numeric, textual) {
        (Some(n), Some(t)) => {
            let n_start = n.get(0).map_or(usize::MAX, |m| m.start());
            let t_start = t.get(0).map_or(usize::MAX, |m| m.start());
            if n_start <= t_start {
                numeric_date(&n)
            } else {
                textual_date(&t)
            }
        }
        (Some(n), None) => numeric_date(&n),
        (None, Some(t)) => textual_date(&t),
        (None, None) => None,
    }
}

/// Month-first, swapping to day-first when month-first is not a valid
/// calendar date.
fn numeric_date(c: &Captures) -> Option<NaiveDate> {
    let p1: u32 = c.get(1)?.as_str().parse().ok()?;
    let p2: u32 = c.get(2)?.as_str().parse().ok()?;
    let year = expand_year(c.get(3)?.as_str().parse().ok()?);
    NaiveDate::from_ymd_opt(year, p1, p2).or_else(|| NaiveDate::from_ymd_opt(year, p2, p1))
}

fn textual_date(c: &Captures) -> Option<NaiveDate> {
    let month = abbr_month_to_num(c.get(1)?.as_str())?;
    let day: u32 = c.get(2)?.as_str().parse().ok()?;
    let year: i32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn expand_year(y: i32) -> i32 {
    if y < 100 { 2000 + y } else { y }
}

fn abbr_month_to_num(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "jan" => Some(1), "feb" => Some(2), "mar" => Some(3), "apr" => Some(4),
        "may" => Some(5), "jun" => Some(6), "jul" => Some(7), "aug" => Some(8),
        "sep" => Some(9), "oct" => Some(10), "nov" => Some(11), "dec" => Some(12),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Structured receipt record assembled by the extraction pass.
//!
//! Field names follow the review-form wire contract, so the structs
//! serialize without rename attributes. Every leaf is a string that
//! defaults to empty; monetary fields hold decimal strings already
//! normalized by [`crate::amount::normalize_amount`]. A partially
//! readable scan still produces a complete record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of document the seller issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptType {
    #[default]
    OfficialReceipt,
    SalesInvoice,
}

impl fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReceiptType::OfficialReceipt => "OFFICIAL_RECEIPT",
            ReceiptType::SalesInvoice => "SALES_INVOICE",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ReceiptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OFFICIAL_RECEIPT" => Ok(ReceiptType::OfficialReceipt),
            "SALES_INVOICE" => Ok(ReceiptType::SalesInvoice),
            other => Err(format!("Unknown receipt type: '{other}'")),
        }
    }
}

/// VAT registration of the issuing business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VatStatus {
    Vat,
    #[default]
    NonVat,
}

impl fmt::Display for VatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VatStatus::Vat => "VAT",
            VatStatus::NonVat => "NON_VAT",
        };
        write!(f, "{s}")
    }
}

impl FromStr for VatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VAT" => Ok(VatStatus::Vat),
            "NON_VAT" => Ok(VatStatus::NonVat),
            other => Err(format!("Unknown vat status: '{other}'")),
        }
    }
}

/// Issuing business, as printed in the receipt header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerInfo {
    pub registered_business_name: String,
    pub business_address: String,
    pub tin: String,
    pub vat_status: VatStatus,
}

/// "SOLD TO" customer block, present on invoices and larger receipts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub buyer_name: String,
    pub buyer_address: String,
    pub buyer_tin: String,
}

/// Document identity and financial summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptInfo {
    pub receipt_type: ReceiptType,
    pub serial_number: String,
    /// ISO-8601 timestamp, e.g. "2024-03-15T00:00:00".
    pub transaction_date: String,
    pub gross_sales: String,
    pub vatable_sales: String,
    pub vat_amount: String,
    pub vat_exempt_sales: String,
    pub zero_rated_sales: String,
    pub total_amount_due: String,
}

/// One tabular line item. `line_total` is stored as printed, not
/// recomputed from quantity and unit cost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub quantity: String,
    pub description: String,
    pub unit_cost: String,
    pub line_total: String,
}

/// Accredited-printer block from the receipt footer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterInfo {
    pub authority_to_print_number: String,
    pub printer_name: String,
    pub printer_tin: String,
    pub printer_address: String,
    /// Date portion only, e.g. "2024-01-05".
    pub atp_issue_date: String,
    pub bir_permit_number: String,
    pub serial_start: String,
    pub serial_end: String,
}

/// Full structured record for one scanned document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReceipt {
    pub seller: SellerInfo,
    pub buyer: BuyerInfo,
    pub receipt: ReceiptInfo,
    pub items: Vec<ReceiptItem>,
    pub printer: PrinterInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_type_round_trips() {
        for t in [ReceiptType::OfficialReceipt, ReceiptType::SalesInvoice] {
            assert_eq!(t.to_string().parse::<ReceiptType>(), Ok(t));
        }
        assert!("VAT".parse::<ReceiptType>().is_err());
    }

    #[test]
    fn vat_status_round_trips() {
        for v in [VatStatus::Vat, VatStatus::NonVat] {
            assert_eq!(v.to_string().parse::<VatStatus>(), Ok(v));
        }
        assert!("EXEMPT".parse::<VatStatus>().is_err());
    }

    #[test]
    fn enums_use_wire_names_in_json() {
        let json = serde_json::to_value(ReceiptType::OfficialReceipt).unwrap();
        assert_eq!(json, serde_json::json!("OFFICIAL_RECEIPT"));
        let json = serde_json::to_value(VatStatus::NonVat).unwrap();
        assert_eq!(json, serde_json::json!("NON_VAT"));
    }

    #[test]
    fn default_record_is_empty_but_complete() {
        let rec = ParsedReceipt::default();
        assert_eq!(rec.receipt.receipt_type, ReceiptType::OfficialReceipt);
        assert_eq!(rec.seller.vat_status, VatStatus::NonVat);
        assert!(rec.seller.tin.is_empty());
        assert!(rec.items.is_empty());

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["receipt"]["receipt_type"], "OFFICIAL_RECEIPT");
        assert_eq!(json["buyer"]["buyer_name"], "");
        assert_eq!(json["printer"]["bir_permit_number"], "");
    }

    #[test]
    fn item_serializes_with_wire_field_names() {
        let item = ReceiptItem {
            quantity: "2".into(),
            description: "Bond paper".into(),
            unit_cost: "250.00".into(),
            line_total: "500.00".into(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "quantity": "2",
                "description": "Bond paper",
                "unit_cost": "250.00",
                "line_total": "500.00",
            })
        );
    }
}

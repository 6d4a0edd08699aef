//! Invoice records produced by the model response parser
//!
//! Field names on the wire match the JSON the model is asked to produce, so a
//! serialized [`ParsedDocument`] can be sent back to the user verbatim.

use serde::{Deserialize, Serialize};

/// One line item on an invoice
///
/// All numeric fields default to `0.0` and are always finite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentItem {
    /// Item name, may be empty
    pub name: String,

    /// Supplier article / SKU, absent when the document shows none
    pub article: Option<String>,

    /// Quantity in `unit`s
    pub quantity: f64,

    /// Unit of measure, possibly with a pack size (e.g. "100шт")
    pub unit: String,

    /// Unit price excluding tax
    pub price_no_pdv: f64,

    /// Unit price including tax
    pub price_with_pdv: f64,

    /// Line total excluding tax
    pub total_no_pdv: f64,

    /// Line total including tax
    pub total_with_pdv: f64,
}

/// The whole-invoice record
///
/// Constructed once per inbound file and never mutated afterwards.
///
/// `edrpou` and `ipn` are two distinct supplier registry identifiers
/// (conventionally 8 or 10 digits, and 10 to 12 digits). They are never
/// interchangeable, but their lengths are hints for the model, not checks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Invoice number, separators preserved (e.g. "Л-25/46")
    pub invoice_number: String,

    /// Invoice date as printed, not validated
    pub invoice_date: String,

    /// Supplier business-registry code
    pub edrpou: String,

    /// Supplier individual tax number
    pub ipn: String,

    /// Supplier name
    pub supplier: String,

    /// Whether item prices are quoted including tax
    #[serde(rename = "isPriceWithPdv")]
    pub is_price_with_pdv: bool,

    /// Line items in document order
    pub items: Vec<DocumentItem>,

    /// Document total excluding tax
    pub total_no_pdv: f64,

    /// Document tax amount
    pub total_pdv: f64,

    /// Document total including tax
    pub total_with_pdv: f64,
}

impl ParsedDocument {
    /// True when every field still holds its default value
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

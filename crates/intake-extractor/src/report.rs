//! Reply payloads: pretty JSON and an `.xlsx` workbook

use crate::error::ExtractorError;
use intake_domain::ParsedDocument;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// Items table header, in column order
pub const ITEM_HEADERS: [&str; 9] = [
    "#",
    "Name",
    "Article",
    "Quantity",
    "Unit",
    "Price excl. tax",
    "Price incl. tax",
    "Total excl. tax",
    "Total incl. tax",
];

/// Rows above the blank separator
const INFO_ROWS: u32 = 6;

/// Pretty-printed ParsedDocument JSON
pub fn to_json(document: &ParsedDocument) -> Result<String, ExtractorError> {
    serde_json::to_string_pretty(document)
        .map_err(|e| ExtractorError::Render(format!("failed to serialize document: {}", e)))
}

/// Drop control characters the xlsx XML cannot carry
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|c| matches!(c, '\t' | '\n' | '\r') || !c.is_control())
        .filter(|c| !matches!(*c as u32, 0xFFFE | 0xFFFF))
        .collect()
}

fn xlsx_err(e: XlsxError) -> ExtractorError {
    ExtractorError::Render(format!("failed to build workbook: {}", e))
}

/// Render a document as an in-memory `.xlsx` file
///
/// Layout: an info block (number, date, both tax ids, supplier, tax flag), a
/// blank row, the items table with its header row, then a totals row and a
/// tax-amount row.
pub fn to_workbook(document: &ParsedDocument) -> Result<Vec<u8>, ExtractorError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Invoice").map_err(xlsx_err)?;

    let info: [(&str, String); INFO_ROWS as usize] = [
        ("Invoice number", document.invoice_number.clone()),
        ("Invoice date", document.invoice_date.clone()),
        ("EDRPOU", document.edrpou.clone()),
        ("IPN", document.ipn.clone()),
        ("Supplier", document.supplier.clone()),
        (
            "Prices include tax",
            if document.is_price_with_pdv { "Yes" } else { "No" }.to_string(),
        ),
    ];
    for (row, (label, value)) in info.iter().enumerate() {
        let row = row as u32;
        sheet.write_string_with_format(row, 0, *label, &bold).map_err(xlsx_err)?;
        sheet.write_string(row, 1, sanitize_cell(value)).map_err(xlsx_err)?;
    }

    let header_row = INFO_ROWS + 1;
    for (col, header) in ITEM_HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(header_row, col as u16, *header, &bold)
            .map_err(xlsx_err)?;
    }

    let mut row = header_row + 1;
    for (idx, item) in document.items.iter().enumerate() {
        sheet.write_number(row, 0, (idx + 1) as f64).map_err(xlsx_err)?;
        sheet.write_string(row, 1, sanitize_cell(&item.name)).map_err(xlsx_err)?;
        sheet
            .write_string(row, 2, sanitize_cell(item.article.as_deref().unwrap_or("")))
            .map_err(xlsx_err)?;
        sheet.write_number(row, 3, item.quantity).map_err(xlsx_err)?;
        sheet.write_string(row, 4, sanitize_cell(&item.unit)).map_err(xlsx_err)?;
        sheet.write_number(row, 5, item.price_no_pdv).map_err(xlsx_err)?;
        sheet.write_number(row, 6, item.price_with_pdv).map_err(xlsx_err)?;
        sheet.write_number(row, 7, item.total_no_pdv).map_err(xlsx_err)?;
        sheet.write_number(row, 8, item.total_with_pdv).map_err(xlsx_err)?;
        row += 1;
    }

    sheet.write_string_with_format(row, 1, "Total", &bold).map_err(xlsx_err)?;
    sheet.write_number(row, 7, document.total_no_pdv).map_err(xlsx_err)?;
    sheet.write_number(row, 8, document.total_with_pdv).map_err(xlsx_err)?;
    row += 1;

    sheet.write_string_with_format(row, 1, "Tax amount", &bold).map_err(xlsx_err)?;
    sheet.write_number(row, 8, document.total_pdv).map_err(xlsx_err)?;

    sheet.set_column_width(1, 40.0).map_err(xlsx_err)?;

    workbook.save_to_buffer().map_err(xlsx_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Data, Reader};
    use intake_domain::DocumentItem;

    fn sample() -> ParsedDocument {
        ParsedDocument {
            invoice_number: "Л-25/46".into(),
            invoice_date: "01.01.2025".into(),
            edrpou: "35601501".into(),
            ipn: "356015004822".into(),
            supplier: "ТОВ 'Будматеріали'".into(),
            is_price_with_pdv: true,
            items: vec![DocumentItem {
                name: "Кирпич".into(),
                article: None,
                quantity: 10.0,
                unit: "100шт".into(),
                price_no_pdv: 100.0,
                price_with_pdv: 120.0,
                total_no_pdv: 1000.0,
                total_with_pdv: 1200.0,
            }],
            total_no_pdv: 1000.0,
            total_pdv: 200.0,
            total_with_pdv: 1200.0,
        }
    }

    #[test]
    fn test_json_uses_wire_field_names() {
        let json = to_json(&sample()).unwrap();
        assert!(json.contains("\"isPriceWithPdv\": true"));
        assert!(json.contains("\"article\": null"));
        let back: ParsedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_workbook_layout() {
        let bytes = to_workbook(&sample()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("invoice.xlsx");
        std::fs::write(&path, bytes).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range("Invoice").unwrap();
        let cell = |r: u32, c: u32| range.get_value((r, c)).cloned().unwrap_or(Data::Empty);

        assert_eq!(cell(0, 1), Data::String("Л-25/46".into()));
        assert_eq!(cell(2, 1), Data::String("35601501".into()));
        assert_eq!(cell(5, 1), Data::String("Yes".into()));
        assert_eq!(cell(6, 0), Data::Empty);
        assert_eq!(cell(7, 0), Data::String("#".into()));
        assert_eq!(cell(7, 8), Data::String("Total incl. tax".into()));
        assert_eq!(cell(8, 1), Data::String("Кирпич".into()));
        assert_eq!(cell(8, 3), Data::Float(10.0));
        assert_eq!(cell(9, 1), Data::String("Total".into()));
        assert_eq!(cell(9, 8), Data::Float(1200.0));
        assert_eq!(cell(10, 1), Data::String("Tax amount".into()));
        assert_eq!(cell(10, 8), Data::Float(200.0));
    }

    #[test]
    fn test_oversized_cell_is_a_render_error() {
        let mut document = sample();
        document.supplier = "x".repeat(40_000);

        let err = to_workbook(&document).unwrap_err();
        assert!(matches!(err, ExtractorError::Render(_)), "got {:?}", err);
        assert!(err.to_string().starts_with("Render error: failed to build workbook"));
    }

    #[test]
    fn test_sanitize_cell_strips_control_chars() {
        assert_eq!(sanitize_cell("a\u{0}b\tc\u{7f}"), "ab\tc");
    }
}

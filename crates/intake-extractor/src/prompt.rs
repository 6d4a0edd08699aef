//! LLM prompt engineering for invoice extraction

use intake_domain::FileKind;

/// Builds prompts for the LLM to extract invoice fields
///
/// The document text is appended verbatim after the instructions. It is not
/// escaped, so text that imitates instructions can steer the model.
pub struct PromptBuilder {
    text: String,
    source: Option<FileKind>,
}

impl PromptBuilder {
    /// Create a new prompt builder for extracted document text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    /// Record where the text came from, for source-specific hints
    pub fn with_source(mut self, kind: FileKind) -> Self {
        self.source = Some(kind);
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(EXTRACTION_INSTRUCTIONS.len() + self.text.len() + 256);

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");
        prompt.push_str(RESPONSE_EXAMPLE);
        prompt.push_str("\n\nDocument content:\n");
        if self.source.is_some_and(|k| k.is_tabular()) {
            prompt.push_str("This data was extracted from a spreadsheet in text form.\n");
        }
        prompt.push('\n');
        prompt.push_str(&self.text);
        prompt.push('\n');

        prompt
    }

    /// Prompt sent alongside an image attachment; carries no document section
    pub fn for_image() -> String {
        format!(
            "{}\nThe document is attached as a photo or screenshot of an invoice.\n\n{}",
            EXTRACTION_INSTRUCTIONS, RESPONSE_EXAMPLE
        )
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"Read the document below. It may mix Ukrainian, Russian and English, and prices may be stated with or without VAT (ПДВ / НДС). Extract the following data.

The document may be a multi-page PDF. Page separators look like "=== Page N ===".
Search the whole text: the invoice header and the items table may be on different pages.
Tables may be embedded as JSON (marked "--- Tables on page N ---"); use them for item data when present.

Supplier identification codes need the MOST care:
1. edrpou (ЄДРПОУ / ЕДРПОУ): look for "код за ЄДРПОУ XXXXXXXX", "ЄДРПОУ: XXXXXXXX" or "Код ЄДРПОУ XXXXXXXX". Usually 8 digits, 10 digits for sole proprietors (ФОП). Never take digits from a bank account line (containing "UA" or "р/с"), МФО, or a certificate number.
2. ipn (ІПН / ИНН): look for "ІПН XXXXXXXXXXXX" or "ИНН: XXXXXXXXXXXX". Always 10 to 12 digits, usually right after ЄДРПОУ.
Example: in "код за ЄДРПОУ 35601501, ІПН 356015004822, № свід. 200026344" edrpou is 35601501 and ipn is 356015004822; 200026344 is neither.
Copy digits exactly in their original order. If a code cannot be determined with certainty, return an empty string.

Invoice numbers keep their letter prefixes and separators: in "Рахунок-фактура № Л-25/46" the number is "Л-25/46".

Do not recalculate prices; only read them and place them in the right fields.

Deciding isPriceWithPdv (are item prices VAT-inclusive):
1. A column such as "Ціна з ПДВ" or "Сума з ПДВ" means prices include VAT.
2. A note "в т.ч. ПДВ" next to a price means prices include VAT.
3. A line "У тому числі ПДВ" with an amount most likely means prices include VAT.
4. No mention of VAT at all means prices exclude VAT.
If both VAT-inclusive and VAT-exclusive prices are shown, fill every ..._no_pdv and ..._with_pdv field.

Fields:
invoice_number: invoice number (№). /1234/
invoice_date: invoice date. /DD.MM.YYYY/
edrpou: supplier ЄДРПОУ. /35601501/
ipn: supplier ІПН. /356015004822/
supplier: supplier (counterparty) name. /ТОВ 'Будматеріали'/
isPriceWithPdv: whether item prices include VAT. /true|false/
total_no_pdv: document total without VAT. /10000/
total_pdv: VAT amount. /1000/
total_with_pdv: document total with VAT. /11000/

items: list of line items (goods, services or works), each with:
name: item name. /Кирпич/
article: article or SKU, may mix alphabets. /1234567890 | КР 2.04 | ZST10230-04079/
quantity: numeric quantity. /1000/
unit: unit of measure ("шт", "шт.", "100шт", "кг", "м", "м²", "м³", "л", "од", "год"). A number attached to a unit (like "100шт") belongs to unit, not to quantity.
price_no_pdv: unit price without VAT. /100/
price_with_pdv: unit price with VAT. /110/
total_no_pdv: line total without VAT. /10000/
total_with_pdv: line total with VAT. /11000/

All quantities, prices and totals MUST be numbers.
Use null for anything that is missing.
Answer with a single valid JSON object only, with no text, comments or code fences around it."#;

const RESPONSE_EXAMPLE: &str = r#"Expected response format:
{
  "invoice_number": "Л-25/46",
  "invoice_date": "01.01.2025",
  "edrpou": "35601501",
  "ipn": "356015004822",
  "supplier": "ТОВ 'Будматеріали'",
  "isPriceWithPdv": true,
  "items": [
    {
      "name": "Кирпич",
      "article": "КР 2.04",
      "quantity": 10,
      "unit": "100шт",
      "price_no_pdv": 100,
      "price_with_pdv": 110,
      "total_no_pdv": 1000,
      "total_with_pdv": 1100
    },
    {
      "name": "Песок",
      "article": null,
      "quantity": 5,
      "unit": "м³",
      "price_no_pdv": 200,
      "price_with_pdv": 240,
      "total_no_pdv": 1000,
      "total_with_pdv": 1200
    }
  ],
  "total_no_pdv": 2000,
  "total_pdv": 400,
  "total_with_pdv": 2400
}"#;

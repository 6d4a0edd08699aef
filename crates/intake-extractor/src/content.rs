//! Document-content extraction
//!
//! Turns a staged file into what the vendor call needs: an optimized JPEG for
//! images, or plain text for PDFs, spreadsheets and everything else.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use calamine::{open_workbook_auto, Data, Reader};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use intake_domain::FileKind;
use pdf_oxide::PdfDocument;
use std::path::Path;
use tracing::{debug, warn};

/// What an extracted file looks like to the rest of the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedContent {
    /// Binary image payload for a multimodal model
    Image {
        /// MIME type of `data`
        media_type: String,
        /// Encoded image bytes
        data: Vec<u8>,
    },
    /// Text ready to append to a prompt
    Text(String),
}

/// How files with an unrecognized extension are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFormat {
    /// Read as UTF-8 text
    PlainText,
    /// Fail with [`ExtractorError::UnsupportedFormat`]
    Reject,
}

/// Extracts content from local files
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    config: ExtractorConfig,
    unknown: UnknownFormat,
}

impl ContentExtractor {
    /// Create an extractor that reads unknown formats as text
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            unknown: UnknownFormat::PlainText,
        }
    }

    /// Set the policy for unrecognized extensions
    pub fn with_unknown_format(mut self, unknown: UnknownFormat) -> Self {
        self.unknown = unknown;
        self
    }

    /// Extract content from `path`, dispatching on `kind`
    ///
    /// Blocking; callers on an async runtime should use `spawn_blocking`.
    pub fn extract(&self, path: &Path, kind: FileKind) -> Result<ExtractedContent, ExtractorError> {
        debug!(file = %path.display(), kind = %kind, "Extracting content");

        match kind {
            FileKind::Image => {
                let raw = std::fs::read(path).map_err(|e| {
                    ExtractorError::Extraction(format!("failed to read {}: {}", path.display(), e))
                })?;
                let (media_type, data) = optimize_image(&raw, media_type_for(path), &self.config);
                Ok(ExtractedContent::Image { media_type, data })
            }
            FileKind::Pdf => extract_pdf_text(path).map(ExtractedContent::Text),
            FileKind::Spreadsheet => extract_workbook_text(path).map(ExtractedContent::Text),
            FileKind::Csv => extract_csv_text(path).map(ExtractedContent::Text),
            FileKind::Other => match self.unknown {
                UnknownFormat::PlainText => read_plain_text(path).map(ExtractedContent::Text),
                UnknownFormat::Reject => Err(ExtractorError::UnsupportedFormat(
                    path.extension()
                        .and_then(|e| e.to_str())
                        .map(|e| format!(".{}", e.to_lowercase()))
                        .unwrap_or_else(|| "(no extension)".to_string()),
                )),
            },
        }
    }
}

/// MIME type implied by an image file's extension
fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Shrink and re-encode an image as JPEG
///
/// Images larger than `max_image_dimension` on either side are resized to fit,
/// preserving aspect ratio; smaller images are never upscaled. Animated
/// formats keep only the first frame. If decoding or encoding fails the raw
/// bytes are returned unchanged with `fallback_media_type`.
pub fn optimize_image(raw: &[u8], fallback_media_type: &str, config: &ExtractorConfig) -> (String, Vec<u8>) {
    let mut img = match image::load_from_memory(raw) {
        Ok(img) => img,
        Err(e) => {
            warn!(error = %e, "Image decode failed, sending original bytes");
            return (fallback_media_type.to_string(), raw.to_vec());
        }
    };

    let max = config.max_image_dimension;
    let (width, height) = img.dimensions();
    let resized = width > max || height > max;
    if resized {
        img = img.resize(max, max, FilterType::CatmullRom);
    }

    let quality = if resized {
        config.resized_jpeg_quality
    } else {
        config.jpeg_quality
    };

    let rgb = img.to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    if let Err(e) = encoder.encode_image(&rgb) {
        warn!(error = %e, "JPEG encode failed, sending original bytes");
        return (fallback_media_type.to_string(), raw.to_vec());
    }

    debug!(
        original_bytes = raw.len(),
        optimized_bytes = buffer.len(),
        width = rgb.width(),
        height = rgb.height(),
        resized,
        "Optimized image"
    );
    ("image/jpeg".to_string(), buffer)
}

/// Text layer of every page, prefixed with a page-count banner
fn extract_pdf_text(path: &Path) -> Result<String, ExtractorError> {
    let mut doc = PdfDocument::open(path)
        .map_err(|e| ExtractorError::Extraction(format!("failed to parse PDF: {e}")))?;

    let page_count = doc
        .page_count()
        .map_err(|e| ExtractorError::Extraction(format!("failed to read PDF page count: {e}")))?;

    let mut pages = Vec::with_capacity(page_count);
    for page_index in 0..page_count {
        let text = doc.extract_text(page_index).unwrap_or_default();
        if !text.trim().is_empty() {
            pages.push(text);
        }
    }

    debug!(page_count, pages_with_text = pages.len(), "Extracted PDF text");
    Ok(format!(
        "=== PDF document ({} pages) ===\n\n{}",
        page_count,
        pages.join("\n")
    ))
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Append one sheet as a banner plus tab-separated rows, skipping blank rows
fn push_sheet<I, R>(out: &mut String, name: &str, rows: I)
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    out.push_str(&format!("=== Sheet: {} ===\n", name));
    for row in rows {
        let cells: Vec<String> = row.into_iter().collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out.push('\n');
}

/// Every sheet of an `.xls`/`.xlsx` workbook, in workbook order
fn extract_workbook_text(path: &Path) -> Result<String, ExtractorError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ExtractorError::Extraction(format!("could not open workbook: {}", e)))?;

    let mut out = String::from("=== Excel document ===\n\n");
    for name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ExtractorError::Extraction(format!("could not read sheet '{}': {}", name, e)))?;
        push_sheet(
            &mut out,
            &name,
            range.rows().map(|row| row.iter().map(render_cell).collect::<Vec<_>>()),
        );
    }

    debug!(chars = out.len(), "Extracted workbook text");
    Ok(out)
}

/// A CSV file rendered like a single-sheet workbook named after the file
fn extract_csv_text(path: &Path) -> Result<String, ExtractorError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ExtractorError::Extraction(format!("could not open CSV: {}", e)))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractorError::Extraction(format!("invalid CSV: {}", e)))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1");
    let mut out = String::from("=== Excel document ===\n\n");
    push_sheet(&mut out, name, rows);
    Ok(out)
}

fn read_plain_text(path: &Path) -> Result<String, ExtractorError> {
    std::fs::read_to_string(path).map_err(|e| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ExtractorError::Extraction(format!("could not read file {}: {}", name, e))
    })
}

//! Inbound file classification by extension

use std::fmt;
use std::path::Path;

/// How an inbound file is handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `.jpg`, `.jpeg`, `.png`, `.gif`, `.webp`
    Image,
    /// `.pdf`
    Pdf,
    /// `.xls`, `.xlsx`
    Spreadsheet,
    /// `.csv`
    Csv,
    /// Anything else (read as UTF-8 text where the backend allows it)
    Other,
}

impl FileKind {
    /// Classify a bare extension, with or without the leading dot
    ///
    /// # Examples
    ///
    /// ```
    /// use intake_domain::FileKind;
    ///
    /// assert_eq!(FileKind::from_extension(".JPG"), FileKind::Image);
    /// assert_eq!(FileKind::from_extension("xlsx"), FileKind::Spreadsheet);
    /// assert_eq!(FileKind::from_extension("txt"), FileKind::Other);
    /// ```
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" => FileKind::Image,
            "pdf" => FileKind::Pdf,
            "xls" | "xlsx" => FileKind::Spreadsheet,
            "csv" => FileKind::Csv,
            _ => FileKind::Other,
        }
    }

    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileKind::Other)
    }

    /// True for the kinds read as tables (workbooks and CSV)
    pub fn is_tabular(&self) -> bool {
        matches!(self, FileKind::Spreadsheet | FileKind::Csv)
    }

    /// Short lowercase label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Pdf => "pdf",
            FileKind::Spreadsheet => "spreadsheet",
            FileKind::Csv => "csv",
            FileKind::Other => "other",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        for ext in ["jpg", "jpeg", "png", "gif", "webp", ".PNG"] {
            assert_eq!(FileKind::from_extension(ext), FileKind::Image, "{ext}");
        }
    }

    #[test]
    fn test_tabular_kinds() {
        assert!(FileKind::from_extension("xls").is_tabular());
        assert!(FileKind::from_extension("csv").is_tabular());
        assert!(!FileKind::from_extension("pdf").is_tabular());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(FileKind::from_path(Path::new("/tmp/a/invoice.PDF")), FileKind::Pdf);
        assert_eq!(FileKind::from_path(Path::new("/tmp/noext")), FileKind::Other);
    }
}

//! Uploaded document reader.
//!
//! Never fails: anything that cannot be read becomes an inline
//! `Error reading file: …` string so the chat turn can still proceed.

use chathub_config::FetchConfig;
use chathub_core::fetch::{DEFAULT_MAX_CHARS, FetchedContent};
use chathub_core::upload::{Upload, UploadKind};
use tracing::{debug, warn};

/// Prefix of the inline error text returned for unreadable files.
pub const READ_ERROR_PREFIX: &str = "Error reading file:";

/// Reads text, PDF and CSV uploads into bounded plain text.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    max_chars: usize,
    pdf_max_pages: usize,
    csv_preview_rows: usize,
}

impl Default for FileFetcher {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            pdf_max_pages: 5,
            csv_preview_rows: 50,
        }
    }
}

impl FileFetcher {
    pub fn new(max_chars: usize, pdf_max_pages: usize, csv_preview_rows: usize) -> Self {
        Self {
            max_chars,
            pdf_max_pages,
            csv_preview_rows,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.max_chars, config.pdf_max_pages, config.csv_preview_rows)
    }

    /// Extract the upload's text, or an inline error description.
    pub fn read(&self, upload: &Upload) -> FetchedContent {
        let result = match upload.kind() {
            Some(UploadKind::PlainText) => read_text(&upload.bytes),
            Some(UploadKind::Pdf) => read_pdf(&upload.bytes, self.pdf_max_pages),
            Some(UploadKind::Csv) => csv_preview(&upload.bytes, self.csv_preview_rows),
            None => Err(format!("unsupported file type '{}'", upload.media_type)),
        };

        match result {
            Ok(text) => {
                debug!(file = %upload.name, chars = text.len(), "Read uploaded file");
                FetchedContent::bounded(text, self.max_chars)
            }
            Err(reason) => {
                warn!(file = %upload.name, error = %reason, "Could not read uploaded file");
                FetchedContent::bounded(format!("{READ_ERROR_PREFIX} {reason}"), self.max_chars)
            }
        }
    }
}

fn read_text(bytes: &[u8]) -> Result<String, String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| format!("file is not valid UTF-8 ({e})"))
}

fn read_pdf(bytes: &[u8], max_pages: usize) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let mut text = String::new();
    for page in first_pages(&doc, max_pages) {
        // Pages without a text layer contribute nothing.
        match doc.extract_text(&[page]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => debug!(page, error = %e, "Skipping unreadable PDF page"),
        }
    }
    Ok(text)
}

/// Page numbers of the first `cap` pages, in document order.
pub fn first_pages(doc: &lopdf::Document, cap: usize) -> Vec<u32> {
    doc.get_pages().into_keys().take(cap).collect()
}

/// Render the first `max_rows` records as a column-aligned table.
///
/// Layout: a header line, then one line per record prefixed with its row
/// index. Numeric-looking cells are right-aligned, the rest left-aligned.
pub fn csv_preview(bytes: &[u8], max_rows: usize) -> Result<String, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err("no columns to parse from file".into());
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records().take(max_rows) {
        let record = record.map_err(|e| e.to_string())?;
        let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    let index_width = rows.len().saturating_sub(1).to_string().len();
    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .map(|r| r[col].chars().count())
                .chain(std::iter::once(headers[col].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let numeric: Vec<bool> = (0..headers.len())
        .map(|col| {
            !rows.is_empty()
                && rows
                    .iter()
                    .all(|r| r[col].is_empty() || r[col].trim().parse::<f64>().is_ok())
        })
        .collect();

    let render = |index: &str, cells: &[String]| {
        let mut line = format!("{index:<index_width$}");
        for (col, cell) in cells.iter().enumerate().take(headers.len()) {
            line.push_str("  ");
            let width = widths[col];
            if numeric[col] {
                line.push_str(&format!("{cell:>width$}"));
            } else {
                line.push_str(&format!("{cell:<width$}"));
            }
        }
        line.trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render("", &headers));
    for (i, row) in rows.iter().enumerate() {
        lines.push(render(&i.to_string(), row));
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chathub_core::upload::{MIME_CSV, MIME_PDF, MIME_TEXT};
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    fn fetcher() -> FileFetcher {
        FileFetcher::default()
    }

    #[test]
    fn plain_text_is_returned_verbatim() {
        let upload = Upload::new("notes.txt", MIME_TEXT, "hello\nworld".as_bytes().to_vec());
        assert_eq!(fetcher().read(&upload).as_str(), "hello\nworld");
    }

    #[test]
    fn plain_text_is_truncated_to_budget() {
        let upload = Upload::new("big.txt", MIME_TEXT, "a".repeat(10_000).into_bytes());
        let content = fetcher().read(&upload);
        assert_eq!(content.char_count(), 6000);
    }

    #[test]
    fn invalid_utf8_is_inline_error() {
        let upload = Upload::new("bin.txt", MIME_TEXT, vec![0xff, 0xfe, 0x00]);
        assert!(fetcher().read(&upload).as_str().starts_with(READ_ERROR_PREFIX));
    }

    #[test]
    fn unsupported_media_type_is_inline_error() {
        let upload = Upload::new("x.docx", "application/msword", vec![1, 2, 3]);
        let text = fetcher().read(&upload).into_string();
        assert!(text.starts_with("Error reading file: unsupported file type"));
    }

    #[test]
    fn corrupt_pdf_is_inline_error() {
        let upload = Upload::new("broken.pdf", MIME_PDF, b"%PDF-1.4 garbage".to_vec());
        assert!(fetcher().read(&upload).as_str().starts_with(READ_ERROR_PREFIX));
    }

    /// A document of `count` pages, page `i` showing the text `Page i`.
    fn labelled_pdf(count: usize) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let kids: Vec<Object> = (0..count)
            .map(|i| {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 12.into()]),
                        Operation::new("Td", vec![72.into(), 720.into()]),
                        Operation::new("Tj", vec![Object::string_literal(format!("Page {i}"))]),
                        Operation::new("ET", vec![]),
                    ],
                };
                let content_id =
                    doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                    "Resources" => resources_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn first_pages_caps_page_count() {
        let doc = labelled_pdf(7);
        assert_eq!(doc.get_pages().len(), 7);
        assert_eq!(first_pages(&doc, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(first_pages(&doc, 10).len(), 7);
    }

    #[test]
    fn pdf_text_is_extracted_from_first_five_pages() {
        let mut bytes = Vec::new();
        labelled_pdf(7).save_to(&mut bytes).unwrap();

        let upload = Upload::new("report.pdf", MIME_PDF, bytes);
        let text = fetcher().read(&upload).into_string();
        assert!(!text.starts_with(READ_ERROR_PREFIX), "{text}");
        for i in 0..5 {
            assert!(text.contains(&format!("Page {i}")), "missing page {i}: {text}");
        }
        assert!(!text.contains("Page 5"));
        assert!(!text.contains("Page 6"));
    }

    #[test]
    fn csv_preview_is_aligned() {
        let data = b"name,score\nalice,9\nbob,10\n";
        let preview = csv_preview(data, 50).unwrap();
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines, vec!["   name   score", "0  alice      9", "1  bob       10"]);
    }

    #[test]
    fn csv_preview_caps_rows() {
        let mut data = String::from("n\n");
        for i in 0..120 {
            data.push_str(&format!("{i}\n"));
        }
        let preview = csv_preview(data.as_bytes(), 50).unwrap();
        // header + 50 rows
        assert_eq!(preview.lines().count(), 51);
        assert!(preview.lines().last().unwrap().ends_with("49"));
    }

    #[test]
    fn csv_upload_bounded_by_budget() {
        let mut data = String::from("text\n");
        for _ in 0..50 {
            data.push_str(&"x".repeat(400));
            data.push('\n');
        }
        let upload = Upload::new("wide.csv", MIME_CSV, data.into_bytes());
        assert_eq!(fetcher().read(&upload).char_count(), 6000);
    }

    #[test]
    fn empty_csv_is_inline_error() {
        let upload = Upload::new("empty.csv", MIME_CSV, Vec::new());
        assert!(fetcher().read(&upload).as_str().starts_with(READ_ERROR_PREFIX));
    }
}

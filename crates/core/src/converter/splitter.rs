//! Splits a rendered deck PDF into individual page PDFs.

use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::ConverterError;

/// Splits a multi-page PDF into one file per page.
///
/// Page files are named `0001.pdf`, `0002.pdf`, ... in document order.
/// This is synchronous CPU work; callers run it on a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfSplitter;

impl PdfSplitter {
    pub fn split(&self, input_pdf: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, ConverterError> {
        std::fs::create_dir_all(output_dir)?;

        let doc = Document::load(input_pdf)
            .map_err(|e| ConverterError::split_failed(format!("failed to load PDF: {e}")))?;

        let page_count = doc.get_pages().len() as u32;
        if page_count == 0 {
            return Err(ConverterError::EmptyDocument);
        }

        let mut page_paths = Vec::with_capacity(page_count as usize);
        for page_no in 1..=page_count {
            let mut single = doc.clone();
            let others: Vec<u32> = (1..=page_count).filter(|n| *n != page_no).collect();
            if !others.is_empty() {
                single.delete_pages(&others);
            }
            single.prune_objects();
            single.compress();

            let page_path = output_dir.join(format!("{page_no:04}.pdf"));
            single
                .save(&page_path)
                .map_err(|e| ConverterError::split_failed(format!("failed to save page {page_no}: {e}")))?;
            page_paths.push(page_path);
        }

        debug!(page_count, output_dir = %output_dir.display(), "PDF split complete");
        Ok(page_paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Builds a minimal PDF with the given number of blank pages.
    fn write_test_pdf(dir: &Path, pages: usize) -> PathBuf {
        use lopdf::{dictionary, Object, ObjectId};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                });
                Object::Reference(page_id)
            })
            .collect();

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = dir.join("deck.pdf");
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_split_three_pages() {
        let dir = TempDir::new().unwrap();
        let input = write_test_pdf(dir.path(), 3);
        let out_dir = dir.path().join("pages");

        let pages = PdfSplitter.split(&input, &out_dir).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].file_name().unwrap(), "0001.pdf");
        assert_eq!(pages[2].file_name().unwrap(), "0003.pdf");

        for page in &pages {
            let split = Document::load(page).unwrap();
            assert_eq!(split.get_pages().len(), 1);
        }
    }

    #[test]
    fn test_split_single_page() {
        let dir = TempDir::new().unwrap();
        let input = write_test_pdf(dir.path(), 1);
        let out_dir = dir.path().join("pages");

        let pages = PdfSplitter.split(&input, &out_dir).unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_split_corrupt_input_fails() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("garbage.pdf");
        std::fs::write(&input, b"this is not a pdf").unwrap();

        let err = PdfSplitter.split(&input, &dir.path().join("pages")).unwrap_err();
        assert!(matches!(err, ConverterError::SplitFailed { .. }));
    }
}

//! PDF metadata extraction

use std::path::Path;

use lopdf::Document;

use crate::error::{Error, Result};

/// Count the number of pages in a PDF file.
///
/// Reads the Count field from the catalog's Pages dictionary, which holds up
/// on nested page trees where walking Kids directly does not.
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let count = catalog_page_count(&doc)?;

    if count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(count)
}

fn catalog_page_count(doc: &Document) -> Result<usize> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let catalog = doc.get_object(catalog_id)?.as_dict()?;

    let pages_id = catalog.get(b"Pages")?.as_reference()?;
    let pages = doc.get_object(pages_id)?.as_dict()?;

    let count = pages.get(b"Count")?.as_i64()?;
    Ok(count as usize)
}

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::{Error, Result};

// TODO: bookmarks/outlines of the source pdfs are dropped, carry them over.

/// Concatenates the given pdfs, in order, into one document.
///
/// Every source document's objects get renumbered into a shared id space,
/// the page objects are reparented under a fresh page tree and a new
/// catalog becomes the document root. The sources' own catalogs and page
/// trees are discarded.
pub fn merge_documents<P: AsRef<Path>>(paths: &[P]) -> Result<Document> {
    let mut max_id = 1u32;
    let mut pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut objects: Vec<(ObjectId, Object)> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let mut doc = Document::load(path).map_err(|source| Error::PdfOpen {
            path: path.to_path_buf(),
            source,
        })?;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages is keyed by page number, so iteration preserves the
        // source's page order.
        for &page_id in doc.get_pages().values() {
            if let Ok(page) = doc.get_object(page_id) {
                pages.push((page_id, page.clone()));
            }
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or("") {
                "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
                _ => objects.push((object_id, object)),
            }
        }
    }

    let mut document = Document::with_version("1.5");
    document.objects.extend(objects);
    document.max_id = max_id;

    let pages_id = document.new_object_id();
    for (object_id, object) in &pages {
        if let Object::Dictionary(dict) = object {
            let mut dict = dict.clone();
            dict.set("Parent", Object::Reference(pages_id));
            document
                .objects
                .insert(*object_id, Object::Dictionary(dict));
        }
    }

    let kids: Vec<Object> = pages
        .iter()
        .map(|&(id, _)| Object::Reference(id))
        .collect();
    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(page_count)),
        ])),
    );

    let catalog_id = document.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    document.trailer.set("Root", Object::Reference(catalog_id));

    document.renumber_objects();
    document.compress();
    Ok(document)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_pages_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        testpdf::write(&first, "alpha");
        testpdf::write(&second, "beta");

        let merged = merge_documents(&[&first, &second]).unwrap();
        assert_eq!(merged.get_pages().len(), 2);
        assert!(merged.extract_text(&[1]).unwrap().contains("alpha"));
        assert!(merged.extract_text(&[2]).unwrap().contains("beta"));
    }

    #[test]
    fn unreadable_source_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.pdf");
        let bad = dir.path().join("bad.pdf");
        testpdf::write(&good, "fine");
        std::fs::write(&bad, b"this is not a pdf").unwrap();

        let err = merge_documents(&[&good, &bad]).unwrap_err();
        match err {
            Error::PdfOpen { path, .. } => assert_eq!(path, bad),
            other => panic!("unexpected error: {other}"),
        }
    }
}

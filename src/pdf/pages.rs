//! Building a new document from pages of existing ones
//!
//! Both split and merge come down to the same step: take a list of source
//! documents, pick pages from each, and stitch them under one fresh page
//! tree. Objects are renumbered per source so ids never collide.

use std::collections::BTreeMap;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::trace;
use crate::error::FailureCause;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree we are willing to walk; guards against Parent cycles
const MAX_TREE_DEPTH: usize = 64;

/// Pages to take from one source document
#[derive(Debug)]
pub(crate) struct PageSelection {
    pub document: Document,
    /// 1-indexed page numbers, in output order
    pub pages: Vec<u32>,
}

impl PageSelection {
    /// Every page of `document`, in order
    pub fn all(document: Document) -> Self {
        let count = document.get_pages().len() as u32;
        Self {
            document,
            pages: (1..=count).collect(),
        }
    }
}

/// Assemble a new document holding the selected pages in order
///
/// Based on the lopdf merge example: renumber each source, pool the objects,
/// then hang the pages off a new Pages node under a new Catalog. Objects no
/// longer reachable from the new catalog are pruned.
pub(crate) fn assemble(selections: Vec<PageSelection>) -> Result<Document, FailureCause> {
    let version = selections
        .first()
        .map(|s| s.document.version.clone())
        .unwrap_or_else(|| "1.5".to_string());

    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for selection in selections {
        let mut doc = selection.document;

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages = doc.get_pages();
        for number in &selection.pages {
            let page_id = *pages.get(number).ok_or_else(|| {
                FailureCause::Malformed(format!("page {} missing from page tree", number))
            })?;

            // Must happen before the page is re-parented
            materialize_inherited(&mut doc, page_id)?;
            page_ids.push(page_id);
        }

        trace!(pages = selection.pages.len(), max_id, "pooled source objects");
        objects.extend(doc.objects);
    }

    let mut output = Document::with_version(version);
    output.objects.extend(objects);

    // new_object_id() must hand out ids above everything we just pooled
    output.max_id = max_id - 1;

    let pages_id = output.new_object_id();
    let catalog_id = output.new_object_id();

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    output.objects.insert(pages_id, Object::Dictionary(pages_object));
    output.objects.insert(catalog_id, Object::Dictionary(catalog));
    output.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        let page = output.get_dictionary_mut(page_id)?;
        page.set("Parent", Object::Reference(pages_id));
    }

    // Drops the old catalogs and page tree nodes
    let pruned = output.prune_objects();
    trace!(pruned = pruned.len(), "pruned unreachable objects");

    output.renumber_objects();
    output.compress();

    Ok(output)
}

/// Copy inheritable attributes from the page's ancestors onto the page
///
/// Once the page is moved under a new, bare Pages node it can no longer
/// inherit, so anything it relied on has to live on the page itself.
fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), FailureCause> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();

    {
        let page = doc.get_dictionary(page_id)?;
        let mut missing: Vec<&[u8]> = INHERITABLE
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();

        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;

        while let Some(parent_id) = parent {
            if missing.is_empty() || depth >= MAX_TREE_DEPTH {
                break;
            }

            let node = match doc.get_dictionary(parent_id) {
                Ok(node) => node,
                Err(_) => break,
            };

            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((*key, value.clone()));
                    false
                }
                Err(_) => true,
            });

            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }
    }

    if !inherited.is_empty() {
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    /// Two pages under an intermediate Pages node that carries the MediaBox
    fn nested_tree_pdf() -> Document {
        let mut doc = Document::with_version("1.4");
        let root_pages_id = doc.new_object_id();
        let inner_pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for label in ["first", "second"] {
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                format!("BT ({}) Tj ET", label).into_bytes(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => inner_pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            inner_pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => root_pages_id,
                "Kids" => kids,
                "Count" => 2,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(200), Object::Integer(100)],
            }),
        );
        doc.objects.insert(
            root_pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(inner_pages_id)],
                "Count" => 2,
                "Rotate" => 90,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => root_pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_assemble_keeps_inherited_attributes() {
        let source = nested_tree_pdf();
        let output = assemble(vec![PageSelection {
            document: source,
            pages: vec![2],
        }])
        .unwrap();

        let pages = output.get_pages();
        assert_eq!(pages.len(), 1);

        let page = output.get_dictionary(pages[&1]).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 200);
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);

        let content = output.get_page_content(pages[&1]).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("(second)"));
    }

    #[test]
    fn test_assemble_repeats_pages_in_given_order() {
        let output = assemble(vec![
            PageSelection::all(nested_tree_pdf()),
            PageSelection {
                document: nested_tree_pdf(),
                pages: vec![2, 1],
            },
        ])
        .unwrap();

        let labels: Vec<String> = output
            .get_pages()
            .values()
            .map(|&id| String::from_utf8_lossy(&output.get_page_content(id).unwrap()).into_owned())
            .collect();

        assert_eq!(labels.len(), 4);
        assert!(labels[0].contains("(first)"));
        assert!(labels[1].contains("(second)"));
        assert!(labels[2].contains("(second)"));
        assert!(labels[3].contains("(first)"));
    }

    #[test]
    fn test_assemble_rejects_missing_page() {
        let err = assemble(vec![PageSelection {
            document: nested_tree_pdf(),
            pages: vec![3],
        }])
        .unwrap_err();
        assert!(matches!(err, FailureCause::Malformed(_)));
    }
}

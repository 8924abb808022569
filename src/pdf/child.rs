use crate::split::source::{ChildOutput, PageGeometry};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// An output PDF under construction, one page per copied source page.
pub struct ChildDocument {
    doc: Document,
    pages_id: ObjectId,
    first_page: PageGeometry,
    kids: Vec<Object>,
    /// Source object id -> id in this document, so shared resources
    /// (fonts, images) are copied once.
    imported: HashMap<ObjectId, ObjectId>,
}

impl ChildDocument {
    /// An empty document sized US Letter until [`ChildOutput::set_page_size`]
    /// binds it to its first page.
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        ChildDocument {
            doc,
            pages_id,
            first_page: PageGeometry::LETTER,
            kids: Vec::new(),
            imported: HashMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Deep-copy `object` from `source`, following references. Page tree
    /// back-links (`/Parent`) are dropped and dangling references become null.
    pub fn import_object(&mut self, source: &Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => Object::Reference(self.import_reference(source, *id)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.import_object(source, item))
                    .collect(),
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.import_dictionary(source, dict)),
            Object::Stream(stream) => {
                let dict = self.import_dictionary(source, &stream.dict);
                Object::Stream(Stream::new(dict, stream.content.clone()))
            }
            other => other.clone(),
        }
    }

    fn import_reference(&mut self, source: &Document, id: ObjectId) -> ObjectId {
        if let Some(&mapped) = self.imported.get(&id) {
            return mapped;
        }

        // Register before recursing; resource graphs may be cyclic.
        let new_id = self.doc.new_object_id();
        self.imported.insert(id, new_id);

        let copied = match source.get_object(id) {
            Ok(object) => self.import_object(source, object),
            Err(_) => Object::Null,
        };
        self.doc.objects.insert(new_id, copied);
        new_id
    }

    fn import_dictionary(&mut self, source: &Document, dict: &Dictionary) -> Dictionary {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copied.set(key.clone(), self.import_object(source, value));
        }
        copied
    }

    /// Append a page of size `geometry` that draws `form` with the content
    /// transform `matrix`.
    pub fn add_form_page(&mut self, form: Stream, geometry: PageGeometry, matrix: [f32; 6]) -> ObjectId {
        let form_id = self.doc.add_object(Object::Stream(form));

        let ops = format!(
            "q {} {} {} {} {} {} cm /SrcPage Do Q",
            matrix[0], matrix[1], matrix[2], matrix[3], matrix[4], matrix[5]
        );
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(Dictionary::new(), ops.into_bytes())));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box(geometry),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "SrcPage" => form_id,
                },
            },
        });
        self.kids.push(Object::Reference(page_id));
        page_id
    }

    /// Close the page tree and serialize the document.
    pub fn finish(mut self) -> std::io::Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
                "MediaBox" => media_box(self.first_page),
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(bytes)
    }
}

impl Default for ChildDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ChildOutput for ChildDocument {
    fn set_page_size(&mut self, geometry: PageGeometry) {
        self.first_page = geometry;
    }
}

fn media_box(geometry: PageGeometry) -> Vec<Object> {
    vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(geometry.width),
        Object::Real(geometry.height),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_shares_objects() {
        let mut source = Document::with_version("1.5");
        let font_id = source.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources = Object::Dictionary(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut child = ChildDocument::new();
        let first = child.import_object(&source, &resources);
        let second = child.import_object(&source, &resources);
        let font_ref = |resources: &Object| {
            resources
                .as_dict()
                .and_then(|d| d.get(b"Font"))
                .and_then(|f| f.as_dict())
                .and_then(|f| f.get(b"F1"))
                .and_then(|r| r.as_reference())
                .unwrap()
        };
        assert_eq!(font_ref(&first), font_ref(&second));
        assert_eq!(child.imported.len(), 1);
    }

    #[test]
    fn test_import_skips_parent_and_dangling() {
        let mut source = Document::with_version("1.5");
        let parent_id = source.add_object(dictionary! { "Type" => "Pages" });
        let dict = Object::Dictionary(dictionary! {
            "Parent" => parent_id,
            "Missing" => Object::Reference((999, 0)),
        });

        let mut child = ChildDocument::new();
        let copied = child.import_object(&source, &dict);
        let copied = copied.as_dict().unwrap();
        assert!(copied.get(b"Parent").is_err());

        let missing = copied.get(b"Missing").unwrap().as_reference().unwrap();
        assert!(matches!(child.doc.get_object(missing), Ok(Object::Null)));
    }

    #[test]
    fn test_finish_produces_loadable_pdf() {
        let mut child = ChildDocument::new();
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            },
            b"0 0 m 100 100 l S".to_vec(),
        );
        child.add_form_page(form.clone(), PageGeometry::LETTER, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        child.add_form_page(form, PageGeometry::new(792.0, 612.0), [0.0, -1.0, 1.0, 0.0, 0.0, 612.0]);
        assert_eq!(child.page_count(), 2);

        let bytes = child.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 2);
    }

    #[test]
    fn test_page_size_binds_page_tree() {
        let mut child = ChildDocument::new();
        child.set_page_size(PageGeometry::new(792.0, 612.0));
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            },
            Vec::new(),
        );
        child.add_form_page(form, PageGeometry::new(792.0, 612.0), [0.0, -1.0, 1.0, 0.0, 0.0, 612.0]);

        let loaded = Document::load_mem(&child.finish().unwrap()).unwrap();
        let pages_id = loaded
            .catalog()
            .unwrap()
            .get(b"Pages")
            .unwrap()
            .as_reference()
            .unwrap();
        let media_box = loaded
            .get_dictionary(pages_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 792.0);
        assert_eq!(media_box[3].as_float().unwrap(), 612.0);
    }
}

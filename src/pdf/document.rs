use crate::error::{Result, SplitError};
use crate::pdf::child::ChildDocument;
use crate::split::source::{PageGeometry, Rotation, SourceDocument};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

// Page trees deeper than this are treated as cyclic.
const MAX_TREE_DEPTH: usize = 64;

static NULL: Object = Object::Null;

/// A loaded source PDF. Read-only for the lifetime of a split.
pub struct PdfDocument {
    pub doc: Document,
    /// File name used to derive child names, e.g. `Report.pdf`.
    pub name: String,
    page_ids: Vec<ObjectId>,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| SplitError::shared(format!("failed to read {}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document.pdf");
        Self::from_bytes(&bytes, name)
    }

    pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| SplitError::shared(format!("failed to parse PDF: {}", e)))?;
        Self::from_document(doc, name.into())
    }

    fn from_document(doc: Document, name: String) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(SplitError::shared(format!("{} is encrypted", name)));
        }

        // get_pages is keyed by 1-based page number, so values come out in order
        let page_ids = doc.get_pages().into_values().collect();
        Ok(PdfDocument {
            doc,
            name,
            page_ids,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        page.checked_sub(1)
            .and_then(|i| self.page_ids.get(i as usize))
            .copied()
            .ok_or_else(|| {
                SplitError::page_copy(
                    page,
                    format!("out of range (1-{})", self.page_count()),
                )
            })
    }

    /// Look up `key` on the page, falling back to its ancestors in the page tree.
    fn inherited(&self, page: u32, key: &[u8]) -> Result<Option<&Object>> {
        let mut current = self.page_id(page)?;
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.doc.get_dictionary(current).map_err(|e| {
                SplitError::shared(format!("page {} tree node {:?} is unreadable: {}", page, current, e))
            })?;

            if let Ok(value) = dict.get(key) {
                return Ok(Some(self.resolve(value)));
            }

            match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => current = parent,
                Err(_) => return Ok(None),
            }
        }
        Err(SplitError::shared(format!("page tree above page {} is cyclic", page)))
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(&NULL),
            other => other,
        }
    }

    /// `[llx, lly, urx, ury]` of the page's MediaBox, US Letter if none is set.
    fn media_box(&self, page: u32) -> Result<[f32; 4]> {
        let Some(object) = self.inherited(page, b"MediaBox")? else {
            return Ok([0.0, 0.0, PageGeometry::LETTER.width, PageGeometry::LETTER.height]);
        };

        let values = object
            .as_array()
            .map_err(|_| SplitError::page_copy(page, "MediaBox is not an array"))?
            .iter()
            .map(|v| self.resolve(v).as_float())
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|_| SplitError::page_copy(page, "MediaBox has non-numeric entries"))?;

        match values.as_slice() {
            &[a, b, c, d] => Ok([a.min(c), b.min(d), a.max(c), b.max(d)]),
            _ => Err(SplitError::page_copy(
                page,
                format!("MediaBox has {} entries", values.len()),
            )),
        }
    }
}

impl SourceDocument for PdfDocument {
    type Output = ChildDocument;

    fn total_pages(&self) -> u32 {
        self.page_count()
    }

    fn page_geometry(&self, page: u32) -> Result<PageGeometry> {
        let [llx, lly, urx, ury] = self.media_box(page)?;
        Ok(PageGeometry::new(urx - llx, ury - lly))
    }

    fn page_rotation(&self, page: u32) -> Result<Rotation> {
        let degrees = match self.inherited(page, b"Rotate")? {
            Some(object) => object
                .as_i64()
                .map_err(|_| SplitError::page_copy(page, "Rotate is not an integer"))?,
            None => 0,
        };
        Rotation::from_degrees(degrees)
            .ok_or_else(|| SplitError::page_copy(page, format!("unsupported rotation {}", degrees)))
    }

    fn copy_page_into(
        &self,
        output: &mut ChildDocument,
        page: u32,
        geometry: PageGeometry,
        rotation: Rotation,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;
        let [llx, lly, urx, ury] = self.media_box(page)?;

        let content = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| SplitError::page_copy(page, e))?;
        let resources = match self.inherited(page, b"Resources")? {
            Some(resources) => output.import_object(&self.doc, resources),
            None => Object::Dictionary(lopdf::Dictionary::new()),
        };

        // The source page becomes a form XObject whose origin is the MediaBox corner.
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "FormType" => Object::Integer(1),
                "BBox" => vec![
                    Object::Real(llx),
                    Object::Real(lly),
                    Object::Real(urx),
                    Object::Real(ury),
                ],
                "Matrix" => vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Real(-llx),
                    Object::Real(-lly),
                ],
                "Resources" => resources,
            },
            content,
        );

        output.add_form_page(form, geometry, rotation.placement_matrix(geometry));
        Ok(())
    }
}

use crate::bookmark::Bookmark;
use crate::error::{Result, SplitError};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

/// Read the top-level outline entries of a document, in order.
///
/// Nested entries are ignored. Each bookmark's page reference has the form
/// `"<page> <fit> <args...>"`, for example `"11 XYZ null null null"`; a
/// destination that cannot be resolved to a page starts with `null`.
pub fn read_bookmarks(doc: &Document) -> Result<Vec<Bookmark>> {
    let catalog = doc
        .catalog()
        .map_err(|e| SplitError::shared(format!("failed to get document catalog: {}", e)))?;

    let outlines = match catalog.get(b"Outlines") {
        Ok(Object::Reference(r)) => match doc.get_dictionary(*r) {
            Ok(d) => d,
            Err(_) => return Ok(Vec::new()),
        },
        Ok(Object::Dictionary(d)) => d,
        _ => return Ok(Vec::new()), // No outlines/bookmarks
    };

    let first_ref = match outlines.get(b"First") {
        Ok(Object::Reference(r)) => *r,
        _ => return Ok(Vec::new()),
    };

    let page_map = build_page_map(doc);
    let mut bookmarks = Vec::new();
    let mut seen = HashSet::new();
    let mut current_id = Some(first_ref);

    while let Some(id) = current_id {
        // Broken files sometimes link siblings in a loop.
        if !seen.insert(id) {
            break;
        }

        let dict = match doc.get_dictionary(id) {
            Ok(d) => d,
            Err(_) => break,
        };

        let title = match dict.get(b"Title") {
            Ok(Object::String(bytes, _)) => decode_pdf_string(bytes),
            _ => "Untitled".to_string(),
        };

        let page_reference = destination_of(doc, dict)
            .map(|dest| format_reference(dest, &page_map))
            .unwrap_or_default();

        bookmarks.push(Bookmark::new(title, page_reference));

        current_id = match dict.get(b"Next") {
            Ok(Object::Reference(r)) => Some(*r),
            _ => None,
        };
    }

    Ok(bookmarks)
}

/// The explicit destination array of an outline item, from `/Dest` or a
/// `/GoTo` action.
fn destination_of<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a [Object]> {
    if let Ok(dest) = dict.get(b"Dest") {
        return resolve_destination(doc, dest, 0);
    }

    let action = match dict.get(b"A") {
        Ok(Object::Reference(r)) => doc.get_dictionary(*r).ok()?,
        Ok(Object::Dictionary(d)) => d,
        _ => return None,
    };

    match action.get(b"S") {
        Ok(Object::Name(kind)) if kind == b"GoTo" => {
            resolve_destination(doc, action.get(b"D").ok()?, 0)
        }
        _ => None,
    }
}

fn resolve_destination<'a>(doc: &'a Document, dest: &'a Object, depth: u32) -> Option<&'a [Object]> {
    if depth > 16 {
        return None;
    }
    match dest {
        Object::Array(arr) => Some(arr.as_slice()),
        Object::String(name, _) | Object::Name(name) => {
            let target = resolve_named_destination(doc, name)?;
            resolve_destination(doc, target, depth + 1)
        }
        // Named destination values may be wrapped as << /D [...] >>
        Object::Dictionary(d) => resolve_destination(doc, d.get(b"D").ok()?, depth + 1),
        Object::Reference(r) => resolve_destination(doc, doc.get_object(*r).ok()?, depth + 1),
        _ => None,
    }
}

fn resolve_named_destination<'a>(doc: &'a Document, name: &[u8]) -> Option<&'a Object> {
    let catalog = doc.catalog().ok()?;

    // Names/Dests name tree
    if let Some(names_dict) = dictionary_entry(doc, catalog, b"Names") {
        if let Ok(Object::Reference(dests_ref)) = names_dict.get(b"Dests") {
            if let Some(found) = search_name_tree(doc, *dests_ref, name, 0) {
                return Some(found);
            }
        }
    }

    // Dests dictionary (older style)
    dictionary_entry(doc, catalog, b"Dests")?.get(name).ok()
}

fn dictionary_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    match dict.get(key).ok()? {
        Object::Reference(r) => doc.get_dictionary(*r).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

fn search_name_tree<'a>(doc: &'a Document, node_id: ObjectId, name: &[u8], depth: u32) -> Option<&'a Object> {
    if depth > 32 {
        return None;
    }
    let dict = doc.get_dictionary(node_id).ok()?;

    if let Ok(Object::Array(names)) = dict.get(b"Names") {
        for chunk in names.chunks(2) {
            if let [Object::String(key, _), value] = chunk {
                if key.as_slice() == name {
                    return Some(value);
                }
            }
        }
    }

    if let Ok(Object::Array(kids)) = dict.get(b"Kids") {
        for kid in kids {
            if let Object::Reference(kid_ref) = kid {
                if let Some(found) = search_name_tree(doc, *kid_ref, name, depth + 1) {
                    return Some(found);
                }
            }
        }
    }

    None
}

/// Render `[page /XYZ left top zoom]` as `"<page> XYZ <left> <top> <zoom>"`.
fn format_reference(dest: &[Object], page_map: &HashMap<ObjectId, u32>) -> String {
    let page = match dest.first() {
        Some(Object::Reference(page_ref)) => page_map.get(page_ref).map(|n| n.to_string()),
        // Remote-style destinations carry a 0-based page index
        Some(Object::Integer(index)) if *index >= 0 => Some((index + 1).to_string()),
        _ => None,
    };

    let mut tokens = vec![page.unwrap_or_else(|| "null".to_string())];
    tokens.extend(dest.iter().skip(1).map(format_token));
    tokens.join(" ")
}

fn format_token(object: &Object) -> String {
    match object {
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::Integer(n) => n.to_string(),
        Object::Real(n) => n.to_string(),
        Object::Boolean(b) => b.to_string(),
        _ => "null".to_string(),
    }
}

fn build_page_map(doc: &Document) -> HashMap<ObjectId, u32> {
    doc.get_pages().into_iter().map(|(num, id)| (id, num)).collect()
}

/// Decode a PDF text string: UTF-16BE or UTF-8 when marked with a byte order
/// mark, PDFDocEncoding otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&b| pdf_doc_char(b)).collect()
}

/// PDFDocEncoding agrees with Latin-1 except in 0x18..=0x1F and 0x80..=0xA0.
fn pdf_doc_char(byte: u8) -> char {
    const LOW: [char; 8] = ['\u{02D8}', '\u{02C7}', '\u{02C6}', '\u{02D9}', '\u{02DD}', '\u{02DB}', '\u{02DA}', '\u{02DC}'];
    const HIGH: [char; 33] = [
        '\u{2022}', '\u{2020}', '\u{2021}', '\u{2026}', '\u{2014}', '\u{2013}', '\u{0192}', '\u{2044}',
        '\u{2039}', '\u{203A}', '\u{2212}', '\u{2030}', '\u{201E}', '\u{201C}', '\u{201D}', '\u{2018}',
        '\u{2019}', '\u{201A}', '\u{2122}', '\u{FB01}', '\u{FB02}', '\u{0141}', '\u{0152}', '\u{0160}',
        '\u{0178}', '\u{017D}', '\u{0131}', '\u{0142}', '\u{0153}', '\u{0161}', '\u{017E}', '\u{FFFD}',
        '\u{20AC}',
    ];
    match byte {
        0x18..=0x1F => LOW[usize::from(byte - 0x18)],
        0x80..=0xA0 => HIGH[usize::from(byte - 0x80)],
        0xAD => '\u{FFFD}',
        _ => char::from(byte),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::fixtures::{build_pdf, letter_pages};
    use lopdf::{dictionary, StringFormat};

    #[test]
    fn test_read_flat_outline() {
        let bytes = build_pdf(&letter_pages(5), &[("Cover", 1), ("Body, part 1", 2), ("Back", 5)]);
        let doc = Document::load_mem(&bytes).unwrap();

        let bookmarks = read_bookmarks(&doc).unwrap();
        assert_eq!(
            bookmarks,
            vec![
                Bookmark::new("Cover", "1 XYZ null null null"),
                Bookmark::new("Body, part 1", "2 XYZ null null null"),
                Bookmark::new("Back", "5 XYZ null null null"),
            ]
        );
        assert_eq!(bookmarks[2].start_page().unwrap(), 5);
    }

    #[test]
    fn test_no_outline() {
        let doc = Document::load_mem(&build_pdf(&letter_pages(2), &[])).unwrap();
        assert!(read_bookmarks(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_format_reference() {
        let mut page_map = HashMap::new();
        page_map.insert((7, 0), 11);

        let dest = vec![
            Object::Reference((7, 0)),
            Object::Name(b"XYZ".to_vec()),
            Object::Integer(0),
            Object::Real(792.5),
            Object::Null,
        ];
        assert_eq!(format_reference(&dest, &page_map), "11 XYZ 0 792.5 null");

        let unknown = vec![Object::Reference((8, 0)), Object::Name(b"Fit".to_vec())];
        assert_eq!(format_reference(&unknown, &page_map), "null Fit");

        let remote = vec![Object::Integer(2), Object::Name(b"Fit".to_vec())];
        assert_eq!(format_reference(&remote, &page_map), "3 Fit");
    }

    #[test]
    fn test_named_destination_in_dests_dictionary() {
        let mut doc = Document::load_mem(&build_pdf(&letter_pages(3), &[])).unwrap();
        let page_3 = *doc.get_pages().get(&3).unwrap();

        let dests_id = doc.add_object(dictionary! {
            "chap2" => dictionary! {
                "D" => vec![Object::Reference(page_3), "Fit".into()],
            },
        });
        let item = dictionary! {
            "Title" => Object::String(b"Chapter 2".to_vec(), StringFormat::Literal),
            "A" => dictionary! {
                "S" => "GoTo",
                "D" => Object::String(b"chap2".to_vec(), StringFormat::Literal),
            },
        };

        let dest = destination_of(&doc, &item).map(|d| d.to_vec());
        assert!(dest.is_none(), "catalog has no /Dests yet");

        let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        doc.get_dictionary_mut(catalog_id).unwrap().set("Dests", dests_id);

        let page_map = build_page_map(&doc);
        let dest = destination_of(&doc, &item).unwrap();
        assert_eq!(format_reference(dest, &page_map), "3 Fit");
    }

    #[test]
    fn test_utf16_title() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0xE9];
        assert_eq!(decode_pdf_string(&bytes), "Hé");
    }

    #[test]
    fn test_utf8_title() {
        assert_eq!(decode_pdf_string(b"\xEF\xBB\xBFCaf\xC3\xA9"), "Café");
    }

    #[test]
    fn test_pdf_doc_encoded_title() {
        assert_eq!(decode_pdf_string(b"\x93rst \x84 \xA0 caf\xE9"), "\u{FB01}rst \u{2014} \u{20AC} café");
        assert_eq!(decode_pdf_string(b"Part 2"), "Part 2");
    }
}

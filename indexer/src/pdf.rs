use crate::html::Extracted;
use anyhow::{bail, Context, Result};
use lopdf::{Document, Object};

/// Text of every page, in page order, plus the `Title` entry of the info dictionary.
pub fn extract(bytes: &[u8]) -> Result<Extracted> {
    let doc = Document::load_mem(bytes).context("parsing PDF")?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        bail!("PDF has no pages");
    }
    let text = doc.extract_text(&pages).context("extracting PDF text")?;
    Ok(Extracted { title: title(&doc), text })
}

fn title(doc: &Document) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let raw = info.as_dict().ok()?.get(b"Title").ok()?.as_str().ok()?;
    let title = decode_text_string(raw);
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// PDF text strings are UTF-16BE when they start with a byte-order mark and
/// single-byte otherwise.
fn decode_text_string(raw: &[u8]) -> String {
    match raw.strip_prefix(&[0xfe, 0xff]) {
        Some(utf16) => {
            let units = utf16.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
            char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)).collect()
        }
        None => raw.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    fn sample_pdf(title: Option<Object>) -> Vec<u8> {
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
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("Universidad Europea")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        if let Some(title) = title {
            let info_id = doc.add_object(dictionary! { "Title" => title });
            doc.trailer.set("Info", info_id);
        }
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn extracts_page_text_and_title() {
        let out = extract(&sample_pdf(Some(Object::string_literal("Guia de grados")))).unwrap();
        assert_eq!(out.title.as_deref(), Some("Guia de grados"));
        assert!(out.text.contains("Universidad Europea"), "{:?}", out.text);
    }

    #[test]
    fn missing_info_means_no_title() {
        let out = extract(&sample_pdf(None)).unwrap();
        assert_eq!(out.title, None);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(extract(b"%PDF-1.5 not really").is_err());
        assert!(extract(b"").is_err());
    }

    #[test]
    fn decodes_utf16_titles() {
        let mut raw = vec![0xfe, 0xff];
        for unit in "Título".encode_utf16() {
            raw.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text_string(&raw), "Título");
        assert_eq!(decode_text_string(b"Campus"), "Campus");
    }
}

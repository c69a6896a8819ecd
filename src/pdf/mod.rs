//! Download-time normalization: whatever was stored, serve a valid PDF.
//!
//! Tiers, each tried only when the previous one fails:
//! 1. parse with lopdf and re-serialize
//! 2. render the bytes as sanitized plain text on one page
//! 3. a static error page built without any fallible step
//!
//! Nothing is cached; every download runs the chain again.

pub mod placeholder;
pub mod text;

use lopdf::Document;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Reserialized,
    TextRendering,
    ErrorPlaceholder,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Reserialized => write!(f, "reserialized"),
            Tier::TextRendering => write!(f, "text_rendering"),
            Tier::ErrorPlaceholder => write!(f, "error_placeholder"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub bytes: Vec<u8>,
    pub tier: Tier,
}

pub fn normalize(input: &[u8]) -> Normalized {
    normalize_with(input, text::render_text)
}

fn normalize_with<R>(input: &[u8], render: R) -> Normalized
where
    R: FnOnce(&[u8]) -> Result<Vec<u8>, lopdf::Error>,
{
    match reserialize(input) {
        Ok(bytes) => {
            return Normalized {
                bytes,
                tier: Tier::Reserialized,
            };
        }
        Err(e) => debug!(error = %e, "stored bytes are not a parseable PDF; rendering as text"),
    }

    match render(input) {
        Ok(bytes) => {
            return Normalized {
                bytes,
                tier: Tier::TextRendering,
            };
        }
        Err(e) => warn!(error = %e, "text rendering failed; serving error page"),
    }

    Normalized {
        bytes: placeholder::error_pdf(),
        tier: Tier::ErrorPlaceholder,
    }
}

fn reserialize(input: &[u8]) -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::load_mem(input)?;
    let mut buffer = Vec::with_capacity(input.len());
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Object;

    fn two_page_pdf() -> Vec<u8> {
        let first = text::render_lines(&["page one".to_string()]).unwrap();
        let mut doc = Document::load_mem(&first).unwrap();
        // clone the single page so the document has two
        let pages = doc.get_pages();
        let page_id = *pages.values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().clone();
        let copy_id = doc.add_object(page);
        let pages_id = doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .and_then(|d| d.get(b"Parent"))
            .and_then(|p| p.as_reference())
            .unwrap();
        let pages_dict = doc
            .get_object_mut(pages_id)
            .and_then(|o| o.as_dict_mut())
            .unwrap();
        pages_dict.set(
            "Kids",
            Object::Array(vec![Object::Reference(page_id), Object::Reference(copy_id)]),
        );
        pages_dict.set("Count", Object::Integer(2));
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn valid_pdf_is_reserialized_with_same_page_count() {
        let input = two_page_pdf();
        let out = normalize(&input);
        assert_eq!(out.tier, Tier::Reserialized);
        let doc = Document::load_mem(&out.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn plain_text_falls_back_to_rendering() {
        let out = normalize(b"just some notes\n");
        assert_eq!(out.tier, Tier::TextRendering);
        assert_eq!(Document::load_mem(&out.bytes).unwrap().get_pages().len(), 1);
    }

    #[test]
    fn empty_input_still_yields_a_pdf() {
        let out = normalize(b"");
        assert_eq!(out.tier, Tier::TextRendering);
        assert!(Document::load_mem(&out.bytes).is_ok());
    }

    #[test]
    fn render_failure_falls_back_to_error_page() {
        let out = normalize_with(b"not a pdf", |_| {
            Err(std::io::Error::other("no space left").into())
        });
        assert_eq!(out.tier, Tier::ErrorPlaceholder);
        assert_eq!(out.bytes, placeholder::error_pdf());
        assert!(Document::load_mem(&out.bytes).is_ok());
    }
}

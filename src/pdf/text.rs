//! Plain-text rendering: turns arbitrary bytes into a single-page PDF.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;
pub const MARGIN: i64 = 50;
pub const FONT_SIZE: i64 = 12;
pub const LEADING: i64 = 14;

/// Courier advances 600/1000 em per glyph, so columns are exact.
pub const MAX_COLUMNS: usize = ((PAGE_WIDTH - 2 * MARGIN) * 1000 / (FONT_SIZE * 600)) as usize;
pub const MAX_LINES: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// Decode as UTF-8 (lossy) and keep printable ASCII plus newlines.
pub fn sanitize(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c == '\n' || (' '..='~').contains(c))
        .collect()
}

/// Hard-wrap to the page width and keep only the lines that fit one page.
pub fn layout(text: &str) -> Vec<String> {
    let text = text.trim_end_matches('\n');
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .flat_map(wrap)
        .take(MAX_LINES)
        .collect()
}

// Input is ASCII after `sanitize`, so byte offsets are char boundaries.
fn wrap(line: &str) -> Vec<String> {
    if line.len() <= MAX_COLUMNS {
        return vec![line.to_string()];
    }
    line.as_bytes()
        .chunks(MAX_COLUMNS)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

/// Render `bytes` as text on a single page.
pub fn render_text(bytes: &[u8]) -> Result<Vec<u8>, lopdf::Error> {
    render_lines(&layout(&sanitize(bytes)))
}

pub fn render_lines(lines: &[String]) -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Courier".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(FONT_SIZE)],
        ),
        Operation::new("TL", vec![Object::Integer(LEADING)]),
        Operation::new(
            "Td",
            vec![
                Object::Integer(MARGIN),
                Object::Integer(PAGE_HEIGHT - MARGIN - FONT_SIZE),
            ],
        ),
    ];
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(
                line.as_bytes().to_vec(),
                StringFormat::Literal,
            )],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

    let page_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ]),
        ),
        ("Resources", Object::Reference(resources_id)),
        ("Contents", Object::Reference(content_id)),
    ]));

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(1)),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

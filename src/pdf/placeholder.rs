//! Last-resort PDF assembled by hand. Only formatting into a `Vec` happens
//! here, so it cannot fail.

pub const ERROR_MESSAGE: &str = "This document could not be displayed.";

pub fn error_pdf() -> Vec<u8> {
    minimal_pdf(ERROR_MESSAGE)
}

/// One Letter page showing `message` in Helvetica.
pub fn minimal_pdf(message: &str) -> Vec<u8> {
    let stream = format!("BT /F1 14 Tf 50 720 Td ({}) Tj ET", escape(message));
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    // xref entries are exactly 20 bytes each
    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}

fn escape(text: &str) -> String {
    text.chars()
        .filter(|c| (' '..='~').contains(c))
        .fold(String::with_capacity(text.len()), |mut acc, c| {
            if matches!(c, '(' | ')' | '\\') {
                acc.push('\\');
            }
            acc.push(c);
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Document;

    #[test]
    fn error_pdf_parses_with_one_page() {
        let bytes = error_pdf();
        let doc = Document::load_mem(&bytes).expect("placeholder must parse");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = minimal_pdf("x");
        let text = String::from_utf8(bytes).unwrap();
        let xref_at: usize = text
            .lines()
            .skip_while(|l| *l != "startxref")
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[xref_at..].starts_with("xref\n0 6\n"));

        let first_entry = text[xref_at..].lines().nth(3).unwrap();
        let first_offset: usize = first_entry[..10].parse().unwrap();
        assert!(text[first_offset..].starts_with("1 0 obj"));
    }

    #[test]
    fn message_delimiters_are_escaped() {
        assert_eq!(escape(r"a(b)\c"), r"a\(b\)\\c");
        assert_eq!(escape("tab\there"), "tabhere");
    }
}

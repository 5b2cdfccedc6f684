use anyhow::{anyhow, Result};
use lopdf::{dictionary, Document, Object, Stream};

use super::{CertificateLayout, TextLine};

/// Average Helvetica glyph advance, in ems.
const HELVETICA_ADVANCE: f32 = 0.50;
const HELVETICA_BOLD_ADVANCE: f32 = 0.56;

/// Write the layout as a single-page PDF.
pub fn render_pdf(layout: &CertificateLayout) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();
    let bold_font_id = doc.new_object_id();
    let resources_id = doc.new_object_id();
    let content_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    // Fonts
    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        }),
    );
    doc.objects.insert(
        bold_font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        }),
    );

    // Resources
    doc.objects.insert(
        resources_id,
        Object::Dictionary(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
                "F2" => bold_font_id,
            },
        }),
    );

    // Content stream
    let content = page_content(layout);
    let content_stream = Stream::new(dictionary! {}, content.into_bytes());
    doc.objects
        .insert(content_id, Object::Stream(content_stream));

    // Page
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), layout.width.into(), layout.height.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        }),
    );

    // Pages
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    // Catalog
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| anyhow!("failed to write PDF: {}", e))?;

    Ok(buffer)
}

fn page_content(layout: &CertificateLayout) -> String {
    let (w, h) = (layout.width, layout.height);
    let mut content = String::new();

    // Background and double accent border
    let (br, bg, bb) = layout.background.unit();
    let (ar, ag, ab) = layout.accent.unit();
    content.push_str("q\n");
    content.push_str(&format!("{:.3} {:.3} {:.3} rg\n", br, bg, bb));
    content.push_str(&format!("0 0 {:.1} {:.1} re f\n", w, h));
    content.push_str(&format!("{:.3} {:.3} {:.3} RG\n", ar, ag, ab));
    content.push_str("4 w\n");
    content.push_str(&format!("18 18 {:.1} {:.1} re S\n", w - 36.0, h - 36.0));
    content.push_str("1 w\n");
    content.push_str(&format!("26 26 {:.1} {:.1} re S\n", w - 52.0, h - 52.0));
    content.push_str("Q\n");

    for line in &layout.lines {
        content.push_str(&text_operation(layout, line));
    }

    content
}

fn text_operation(layout: &CertificateLayout, line: &TextLine) -> String {
    let (r, g, b) = layout.color(line.ink).unit();
    let font = if line.bold { "F2" } else { "F1" };
    let x = ((layout.width - approx_text_width(&line.text, line.size, line.bold)) / 2.0).max(36.0);
    let y = layout.height * (1.0 - line.y);

    format!(
        "BT\n{:.3} {:.3} {:.3} rg\n/{} {:.1} Tf\n{:.1} {:.1} Td\n({}) Tj\nET\n",
        r,
        g,
        b,
        font,
        line.size,
        x,
        y,
        escape_pdf_string(&line.text)
    )
}

fn approx_text_width(text: &str, size: f32, bold: bool) -> f32 {
    let advance = if bold {
        HELVETICA_BOLD_ADVANCE
    } else {
        HELVETICA_ADVANCE
    };
    text.chars().count() as f32 * size * advance
}

/// Encode text for a WinAnsi string literal.
///
/// Latin-1 and the WinAnsi extras become octal escapes; anything else is `?`.
fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => match win_ansi_byte(c) {
                Some(byte) => out.push_str(&format!("\\{:03o}", byte)),
                None => out.push('?'),
            },
        }
    }
    out
}

/// WinAnsiEncoding code for a non-ASCII character.
fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\u{00A0}'..='\u{00FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

//! PDF serialization of laid-out pages via `lopdf`.
//!
//! Text is drawn with the standard Type1 fonts in WinAnsiEncoding, so no font
//! programs are embedded. No timestamps or random ids are written: the same
//! pages always serialize to the same bytes.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use crate::render::font_metrics::StandardFont;
use crate::render::page::{DrawOp, Page, PageGeometry, Rgb};
use crate::render::RenderError;

const PRODUCER: &str = "tailor";

pub fn encode_pdf(
    pages: &[Page],
    geometry: &PageGeometry,
    title: &str,
) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in StandardFont::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Serialize(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(geometry.width),
                Object::Real(geometry.height),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(win_ansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal(PRODUCER),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| RenderError::Serialize(e.to_string()))?;
    Ok(out)
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(page.ops.len() * 6);
    for op in &page.ops {
        match op {
            DrawOp::Text {
                font,
                size,
                color,
                x,
                y,
                text,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("rg", rgb_operands(color)));
                ops.push(Operation::new(
                    "Tf",
                    vec![
                        Object::Name(font.resource_name().as_bytes().to_vec()),
                        Object::Real(*size),
                    ],
                ));
                ops.push(Operation::new("Td", vec![Object::Real(*x), Object::Real(*y)]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(win_ansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Line {
                from,
                to,
                width,
                color,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("RG", rgb_operands(color)));
                ops.push(Operation::new("w", vec![Object::Real(*width)]));
                ops.push(Operation::new(
                    "m",
                    vec![Object::Real(from.0), Object::Real(from.1)],
                ));
                ops.push(Operation::new("l", vec![Object::Real(to.0), Object::Real(to.1)]));
                ops.push(Operation::new("S", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            DrawOp::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("rg", rgb_operands(color)));
                ops.push(Operation::new(
                    "re",
                    vec![
                        Object::Real(*x),
                        Object::Real(*y),
                        Object::Real(*width),
                        Object::Real(*height),
                    ],
                ));
                ops.push(Operation::new("f", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    ops
}

fn rgb_operands(color: &Rgb) -> Vec<Object> {
    vec![
        Object::Real(color.r),
        Object::Real(color.g),
        Object::Real(color.b),
    ]
}

/// Encodes text for a WinAnsiEncoding font. Unmappable characters become `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u8,
            '\t' => b' ',
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

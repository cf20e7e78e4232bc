//! Template Dispatcher: four layout strategies selected by template id.
//!
//! Every strategy receives the same inputs: a header (title + optional contact
//! line), the body split into blocks, the resolved palette, and the document
//! type. Resumes keep their line structure; cover-letter blocks are reflowed
//! as paragraphs.

use serde::{Deserialize, Serialize};

use crate::render::font_metrics::StandardFont;
use crate::render::page::{Align, DrawOp, PageWriter, Rgb, TextStyle};

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    #[default]
    Classic,
    Modern,
    Creative,
    Minimalist,
}

impl TemplateId {
    pub const ALL: [TemplateId; 4] = [
        TemplateId::Classic,
        TemplateId::Modern,
        TemplateId::Creative,
        TemplateId::Minimalist,
    ];

    /// Maps a client-supplied id to a template. Unknown or absent ids are `Classic`.
    pub fn resolve(id: Option<&str>) -> Self {
        let id = id.map(|s| s.trim().to_ascii_lowercase());
        match id.as_deref() {
            Some("modern") => TemplateId::Modern,
            Some("creative") => TemplateId::Creative,
            Some("minimalist") => TemplateId::Minimalist,
            _ => TemplateId::Classic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateId::Classic => "classic",
            TemplateId::Modern => "modern",
            TemplateId::Creative => "creative",
            TemplateId::Minimalist => "minimalist",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TemplateId::Classic => "Classic",
            TemplateId::Modern => "Modern",
            TemplateId::Creative => "Creative",
            TemplateId::Minimalist => "Minimalist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    #[default]
    Resume,
    CoverLetter,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Resume => "resume",
            DocumentType::CoverLetter => "coverLetter",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Colors
// ────────────────────────────────────────────────────────────────────────────

/// Client color overrides as `#rrggbb` strings. Unparseable values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleOverrides {
    pub title_color: Option<String>,
    pub section_color: Option<String>,
    pub text_color: Option<String>,
    pub line_color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub title: Rgb,
    pub section: Rgb,
    pub text: Rgb,
    pub line: Rgb,
}

impl Palette {
    pub fn with_overrides(self, styles: &StyleOverrides) -> Self {
        let pick = |value: &Option<String>, fallback: Rgb| {
            value.as_deref().and_then(Rgb::from_hex).unwrap_or(fallback)
        };
        Self {
            title: pick(&styles.title_color, self.title),
            section: pick(&styles.section_color, self.section),
            text: pick(&styles.text_color, self.text),
            line: pick(&styles.line_color, self.line),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Body blocks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Starts with an all-caps heading line.
    Section { heading: String, lines: Vec<String> },
    Prose { lines: Vec<String> },
}

/// Splits body text on blank lines. A block whose first line is all uppercase
/// (with at least one letter) and longer than 3 characters is a section.
pub fn split_blocks(content: &str) -> Vec<Block> {
    let content = content.replace("\r\n", "\n");
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(to_block(std::mem::take(&mut current)));
            }
        } else {
            current.push(line.trim_end().to_string());
        }
    }
    if !current.is_empty() {
        blocks.push(to_block(current));
    }
    blocks
}

fn to_block(mut lines: Vec<String>) -> Block {
    if is_section_heading(&lines[0]) {
        let heading = lines.remove(0).trim().to_string();
        Block::Section { heading, lines }
    } else {
        Block::Prose { lines }
    }
}

fn is_section_heading(line: &str) -> bool {
    let line = line.trim();
    line.chars().count() > 3
        && line.chars().any(char::is_alphabetic)
        && line == line.to_uppercase()
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy trait
// ────────────────────────────────────────────────────────────────────────────

pub struct RenderHeader<'a> {
    pub title: &'a str,
    pub contact: Option<&'a str>,
}

pub trait TemplateStrategy: Send + Sync {
    fn id(&self) -> TemplateId;

    fn default_palette(&self) -> Palette;

    fn render_header(&self, w: &mut PageWriter, header: &RenderHeader<'_>, palette: &Palette);

    fn render_section(
        &self,
        w: &mut PageWriter,
        block: &Block,
        palette: &Palette,
        document_type: DocumentType,
    );
}

pub fn strategy_for(id: TemplateId) -> &'static dyn TemplateStrategy {
    match id {
        TemplateId::Classic => &Classic,
        TemplateId::Modern => &Modern,
        TemplateId::Creative => &Creative,
        TemplateId::Minimalist => &Minimalist,
    }
}

fn block_lines(block: &Block) -> (Option<&str>, &[String]) {
    match block {
        Block::Section { heading, lines } => (Some(heading.as_str()), lines.as_slice()),
        Block::Prose { lines } => (None, lines.as_slice()),
    }
}

/// Resume lines are wrapped one by one; a cover-letter block is one paragraph.
fn write_body(
    w: &mut PageWriter,
    style: &TextStyle,
    lines: &[String],
    document_type: DocumentType,
    indent: f32,
) {
    match document_type {
        DocumentType::Resume => {
            for line in lines {
                w.paragraph(style, line, Align::Left, indent);
            }
        }
        DocumentType::CoverLetter => {
            w.paragraph(style, &lines.join(" "), Align::Left, indent);
        }
    }
}

/// Heading never ends a page on its own.
fn reserve_heading(w: &mut PageWriter, heading: &TextStyle, body: &TextStyle) {
    w.reserve(heading.line_height() + body.line_height());
}

// ────────────────────────────────────────────────────────────────────────────
// Classic: serif, centered header, ruled section headings
// ────────────────────────────────────────────────────────────────────────────

struct Classic;

impl TemplateStrategy for Classic {
    fn id(&self) -> TemplateId {
        TemplateId::Classic
    }

    fn default_palette(&self) -> Palette {
        Palette {
            title: Rgb::from_u8(0x11, 0x11, 0x11),
            section: Rgb::from_u8(0x11, 0x11, 0x11),
            text: Rgb::from_u8(0x22, 0x22, 0x22),
            line: Rgb::from_u8(0x44, 0x44, 0x44),
        }
    }

    fn render_header(&self, w: &mut PageWriter, header: &RenderHeader<'_>, palette: &Palette) {
        let title = TextStyle::new(StandardFont::TimesBold, 22.0, palette.title);
        w.paragraph(&title, header.title, Align::Center, 0.0);
        if let Some(contact) = header.contact {
            let style = TextStyle::new(StandardFont::TimesRoman, 10.0, palette.text);
            w.paragraph(&style, contact, Align::Center, 0.0);
        }
        w.gap(4.0);
        w.rule(palette.line, 0.8);
        w.gap(6.0);
    }

    fn render_section(
        &self,
        w: &mut PageWriter,
        block: &Block,
        palette: &Palette,
        document_type: DocumentType,
    ) {
        let body = TextStyle::new(StandardFont::TimesRoman, 11.0, palette.text);
        let (heading, lines) = block_lines(block);
        w.gap(8.0);
        if let Some(heading) = heading {
            let style = TextStyle::new(StandardFont::TimesBold, 12.0, palette.section);
            reserve_heading(w, &style, &body);
            w.line(&style, heading, Align::Left);
            w.rule(palette.line, 0.5);
            w.gap(2.0);
        }
        write_body(w, &body, lines, document_type, 0.0);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Modern: sans-serif, left-aligned accent header, heavy rule
// ────────────────────────────────────────────────────────────────────────────

struct Modern;

impl TemplateStrategy for Modern {
    fn id(&self) -> TemplateId {
        TemplateId::Modern
    }

    fn default_palette(&self) -> Palette {
        Palette {
            title: Rgb::from_u8(0x1f, 0x4e, 0x79),
            section: Rgb::from_u8(0x1f, 0x4e, 0x79),
            text: Rgb::from_u8(0x33, 0x33, 0x33),
            line: Rgb::from_u8(0x9d, 0xb4, 0xc0),
        }
    }

    fn render_header(&self, w: &mut PageWriter, header: &RenderHeader<'_>, palette: &Palette) {
        let title = TextStyle::new(StandardFont::HelveticaBold, 24.0, palette.title);
        w.paragraph(&title, header.title, Align::Left, 0.0);
        if let Some(contact) = header.contact {
            let style = TextStyle::new(StandardFont::Helvetica, 9.5, palette.text);
            w.paragraph(&style, contact, Align::Left, 0.0);
        }
        w.gap(6.0);
        w.rule(palette.line, 2.0);
        w.gap(8.0);
    }

    fn render_section(
        &self,
        w: &mut PageWriter,
        block: &Block,
        palette: &Palette,
        document_type: DocumentType,
    ) {
        let body = TextStyle::new(StandardFont::Helvetica, 10.5, palette.text);
        let (heading, lines) = block_lines(block);
        w.gap(10.0);
        if let Some(heading) = heading {
            let style = TextStyle::new(StandardFont::HelveticaBold, 11.0, palette.section);
            reserve_heading(w, &style, &body);
            w.line(&style, heading, Align::Left);
            w.rule(palette.line, 0.75);
            w.gap(3.0);
        }
        write_body(w, &body, lines, document_type, 0.0);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Creative: colored title band, square markers, indented body
// ────────────────────────────────────────────────────────────────────────────

struct Creative;

const BAND_HEIGHT: f32 = 100.0;
const MARKER: f32 = 6.0;
const CREATIVE_INDENT: f32 = 14.0;

impl TemplateStrategy for Creative {
    fn id(&self) -> TemplateId {
        TemplateId::Creative
    }

    fn default_palette(&self) -> Palette {
        Palette {
            title: Rgb::from_u8(0x6a, 0x1b, 0x9a),
            section: Rgb::from_u8(0xd8, 0x1b, 0x60),
            text: Rgb::from_u8(0x2b, 0x2b, 0x2b),
            line: Rgb::from_u8(0x6a, 0x1b, 0x9a),
        }
    }

    fn render_header(&self, w: &mut PageWriter, header: &RenderHeader<'_>, palette: &Palette) {
        let geometry = *w.geometry();
        let band_bottom = geometry.height - BAND_HEIGHT;
        // Title color fills the band; header text sits on it in white.
        w.draw(DrawOp::FillRect {
            x: 0.0,
            y: band_bottom,
            width: geometry.width,
            height: BAND_HEIGHT,
            color: palette.title,
        });

        // One line each fits in the band; long text is scaled down to the content width.
        let max_width = w.content_width();
        let title = TextStyle::new(StandardFont::HelveticaBold, 26.0, Rgb::WHITE);
        w.line(&shrink_to_fit(title, header.title, max_width), header.title, Align::Left);
        if let Some(contact) = header.contact {
            let style = TextStyle::new(StandardFont::Helvetica, 10.0, Rgb::WHITE);
            w.line(&shrink_to_fit(style, contact, max_width), contact, Align::Left);
        }
        w.move_below(band_bottom - 10.0);
        w.rule(palette.line, 1.0);
        w.gap(4.0);
    }

    fn render_section(
        &self,
        w: &mut PageWriter,
        block: &Block,
        palette: &Palette,
        document_type: DocumentType,
    ) {
        let body = TextStyle::new(StandardFont::Helvetica, 10.5, palette.text);
        let (heading, lines) = block_lines(block);
        w.gap(10.0);
        if let Some(heading) = heading {
            let style = TextStyle::new(StandardFont::HelveticaBold, 12.0, palette.section);
            reserve_heading(w, &style, &body);
            let baseline = w.cursor_y() - style.size * 0.8;
            let x = w.left();
            w.draw(DrawOp::FillRect {
                x,
                y: baseline,
                width: MARKER,
                height: MARKER,
                color: palette.section,
            });
            w.paragraph(&style, heading, Align::Left, CREATIVE_INDENT);
            w.gap(2.0);
        }
        write_body(w, &body, lines, document_type, CREATIVE_INDENT);
    }
}

/// Text width scales linearly with size, so one division finds the largest
/// size that fits. The leading stays that of the original size.
fn shrink_to_fit(style: TextStyle, text: &str, max_width: f32) -> TextStyle {
    let width = style.font.metrics().measure_str(text, style.size);
    if width <= max_width {
        return style;
    }
    TextStyle {
        size: style.size * max_width / width,
        leading: style.leading * width / max_width,
        ..style
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimalist: light type, small grey headings, hairline under header only
// ────────────────────────────────────────────────────────────────────────────

struct Minimalist;

impl TemplateStrategy for Minimalist {
    fn id(&self) -> TemplateId {
        TemplateId::Minimalist
    }

    fn default_palette(&self) -> Palette {
        Palette {
            title: Rgb::from_u8(0x11, 0x11, 0x11),
            section: Rgb::from_u8(0x77, 0x77, 0x77),
            text: Rgb::from_u8(0x33, 0x33, 0x33),
            line: Rgb::from_u8(0xdd, 0xdd, 0xdd),
        }
    }

    fn render_header(&self, w: &mut PageWriter, header: &RenderHeader<'_>, palette: &Palette) {
        let title = TextStyle::new(StandardFont::Helvetica, 20.0, palette.title);
        w.paragraph(&title, header.title, Align::Left, 0.0);
        if let Some(contact) = header.contact {
            let style = TextStyle::new(StandardFont::Helvetica, 9.0, palette.section);
            w.paragraph(&style, contact, Align::Left, 0.0);
        }
        w.gap(8.0);
        w.rule(palette.line, 0.3);
        w.gap(6.0);
    }

    fn render_section(
        &self,
        w: &mut PageWriter,
        block: &Block,
        palette: &Palette,
        document_type: DocumentType,
    ) {
        let mut body = TextStyle::new(StandardFont::Helvetica, 10.0, palette.text);
        body.leading = 1.4;
        let (heading, lines) = block_lines(block);
        w.gap(12.0);
        if let Some(heading) = heading {
            let style = TextStyle::new(StandardFont::HelveticaBold, 8.5, palette.section);
            reserve_heading(w, &style, &body);
            w.line(&style, heading, Align::Left);
            w.gap(2.0);
        }
        write_body(w, &body, lines, document_type, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::page::LETTER;

    #[test]
    fn test_resolve_known_ids_case_insensitively() {
        assert_eq!(TemplateId::resolve(Some("modern")), TemplateId::Modern);
        assert_eq!(TemplateId::resolve(Some(" Creative ")), TemplateId::Creative);
        assert_eq!(TemplateId::resolve(Some("MINIMALIST")), TemplateId::Minimalist);
        assert_eq!(TemplateId::resolve(Some("classic")), TemplateId::Classic);
    }

    #[test]
    fn test_unknown_or_absent_id_is_classic() {
        assert_eq!(TemplateId::resolve(Some("nonexistent")), TemplateId::Classic);
        assert_eq!(TemplateId::resolve(Some("")), TemplateId::Classic);
        assert_eq!(TemplateId::resolve(None), TemplateId::Classic);
    }

    #[test]
    fn test_strategy_lookup_matches_id() {
        for id in TemplateId::ALL {
            assert_eq!(strategy_for(id).id(), id);
        }
    }

    #[test]
    fn test_document_type_wire_names() {
        let parsed: DocumentType = serde_json::from_str("\"coverLetter\"").unwrap();
        assert_eq!(parsed, DocumentType::CoverLetter);
        assert_eq!(
            serde_json::to_string(&DocumentType::Resume).unwrap(),
            "\"resume\""
        );
    }

    #[test]
    fn test_split_blocks_sections_and_prose() {
        let body = "SUMMARY\nBackend engineer.\n\n\nEXPERIENCE\nAcme Corp\nBuilt things\n\nThanks for reading";
        let blocks = split_blocks(body);
        assert_eq!(
            blocks,
            vec![
                Block::Section {
                    heading: "SUMMARY".to_string(),
                    lines: vec!["Backend engineer.".to_string()],
                },
                Block::Section {
                    heading: "EXPERIENCE".to_string(),
                    lines: vec!["Acme Corp".to_string(), "Built things".to_string()],
                },
                Block::Prose {
                    lines: vec!["Thanks for reading".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_short_or_mixed_case_first_line_is_prose() {
        let blocks = split_blocks("AWS\nCertified\n\nSkills\nRust\n\n2024\nnotes");
        assert!(blocks.iter().all(|b| matches!(b, Block::Prose { .. })));
    }

    #[test]
    fn test_heading_with_symbols_counts() {
        let blocks = split_blocks("SKILLS & TOOLS\nRust, Go");
        assert!(matches!(&blocks[0], Block::Section { heading, .. } if heading == "SKILLS & TOOLS"));
    }

    #[test]
    fn test_split_blocks_blank_content() {
        assert!(split_blocks("").is_empty());
        assert!(split_blocks(" \n\t\n").is_empty());
    }

    #[test]
    fn test_overrides_replace_only_valid_colors() {
        let base = Classic.default_palette();
        let styles = StyleOverrides {
            title_color: Some("#ff0000".to_string()),
            section_color: Some("not-a-color".to_string()),
            text_color: None,
            line_color: Some("#00ff00".to_string()),
        };
        let palette = base.with_overrides(&styles);
        assert_eq!(palette.title, Rgb::from_u8(255, 0, 0));
        assert_eq!(palette.section, base.section);
        assert_eq!(palette.text, base.text);
        assert_eq!(palette.line, Rgb::from_u8(0, 255, 0));
    }

    #[test]
    fn test_cover_letter_reflows_block_into_paragraph() {
        let block = Block::Prose {
            lines: vec!["Dear Hiring Manager,".to_string(), "I am writing.".to_string()],
        };
        let palette = Modern.default_palette();

        let mut resume = PageWriter::new(LETTER);
        Modern.render_section(&mut resume, &block, &palette, DocumentType::Resume);
        let mut letter = PageWriter::new(LETTER);
        Modern.render_section(&mut letter, &block, &palette, DocumentType::CoverLetter);

        assert_eq!(resume.finish()[0].ops.len(), 2);
        let letter_ops = &letter.finish()[0].ops;
        assert_eq!(letter_ops.len(), 1);
        assert!(matches!(
            &letter_ops[0],
            DrawOp::Text { text, .. } if text == "Dear Hiring Manager, I am writing."
        ));
    }

    #[test]
    fn test_creative_header_keeps_long_lines_inside_margins() {
        let mut w = PageWriter::new(LETTER);
        let palette = Creative.default_palette();
        let title = "Maximiliana Alexandrina Bartholomew-Featherstonehaugh Worthington";
        let contact = "Email: maximiliana.featherstonehaugh@example.com | Phone: +1 555 0100 | linkedin.com/in/maximiliana-featherstonehaugh";
        Creative.render_header(
            &mut w,
            &RenderHeader {
                title,
                contact: Some(contact),
            },
            &palette,
        );
        let right = w.right();
        let band_bottom = LETTER.height - BAND_HEIGHT;
        let pages = w.finish();
        assert_eq!(pages.len(), 1);

        let texts: Vec<_> = pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text {
                    font, size, x, y, text, ..
                } => Some((font.metrics().measure_str(text, *size) + x, *y, text.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].2, title);
        assert_eq!(texts[1].2, contact);
        for (end, y, text) in texts {
            assert!(end <= right + 0.01, "{text:?} ends at {end}, margin {right}");
            assert!(y > band_bottom, "{text:?} drawn below the band");
        }
    }

    #[test]
    fn test_creative_header_draws_band_and_white_title() {
        let mut w = PageWriter::new(LETTER);
        let palette = Creative.default_palette();
        Creative.render_header(
            &mut w,
            &RenderHeader {
                title: "Jane Doe",
                contact: Some("jane@x.com"),
            },
            &palette,
        );
        let ops = &w.finish()[0].ops;
        assert!(matches!(ops[0], DrawOp::FillRect { color, .. } if color == palette.title));
        assert!(ops.iter().any(|op| matches!(
            op,
            DrawOp::Text { text, color, .. } if text == "Jane Doe" && *color == Rgb::WHITE
        )));
    }
}

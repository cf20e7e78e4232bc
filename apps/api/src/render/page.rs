//! Page Writer: turns a stream of lines, rules and fills into positioned
//! drawing operations, breaking to a new page when the bottom margin is reached.
//!
//! Coordinates are PDF user space: points, origin at the bottom-left corner.
//! The writer never produces zero pages.

use crate::render::font_metrics::StandardFont;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
        }
    }

    /// Parses `#rrggbb` (the `#` is optional). Anything else is `None`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::from_u8(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    pub size: f32,
    pub color: Rgb,
    /// Line height as a multiple of `size`.
    pub leading: f32,
}

impl TextStyle {
    pub fn new(font: StandardFont, size: f32, color: Rgb) -> Self {
        Self {
            font,
            size,
            color,
            leading: 1.3,
        }
    }

    pub fn line_height(&self) -> f32 {
        self.size * self.leading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        font: StandardFont,
        size: f32,
        color: Rgb,
        x: f32,
        y: f32,
        text: String,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgb,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

/// Paper size and margins, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_x: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

/// US letter, 0.75" side and bottom margins, 0.7" top margin.
pub const LETTER: PageGeometry = PageGeometry {
    width: 612.0,
    height: 792.0,
    margin_x: 54.0,
    margin_top: 50.0,
    margin_bottom: 54.0,
};

// Baseline sits this fraction of the font size below the top of the line box.
const ASCENT: f32 = 0.8;

// ────────────────────────────────────────────────────────────────────────────
// Writer
// ────────────────────────────────────────────────────────────────────────────

pub struct PageWriter {
    geometry: PageGeometry,
    pages: Vec<Page>,
    cursor_y: f32,
}

impl PageWriter {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            cursor_y: geometry.height - geometry.margin_top,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn left(&self) -> f32 {
        self.geometry.margin_x
    }

    pub fn right(&self) -> f32 {
        self.geometry.width - self.geometry.margin_x
    }

    pub fn content_width(&self) -> f32 {
        self.right() - self.left()
    }

    /// Current top of the next line box.
    pub fn cursor_y(&self) -> f32 {
        self.cursor_y
    }

    fn current(&mut self) -> &mut Page {
        // `pages` starts non-empty and only grows.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor_y = self.geometry.height - self.geometry.margin_top;
    }

    /// Breaks to a new page unless `height` more points fit above the bottom
    /// margin. An empty page always accepts, so oversized items cannot loop.
    pub fn reserve(&mut self, height: f32) {
        let fits = self.cursor_y - height >= self.geometry.margin_bottom;
        if !fits && !self.current().ops.is_empty() {
            self.new_page();
        }
    }

    /// Vertical gap. Gaps are dropped at the top of a page.
    pub fn gap(&mut self, points: f32) {
        if self.current().ops.is_empty() {
            return;
        }
        self.cursor_y -= points;
    }

    /// One unwrapped line of text.
    pub fn line(&mut self, style: &TextStyle, text: &str, align: Align) {
        self.line_at(style, text, align, 0.0);
    }

    fn line_at(&mut self, style: &TextStyle, text: &str, align: Align, indent: f32) {
        let height = style.line_height();
        self.reserve(height);

        let x = match align {
            Align::Left => self.left() + indent,
            Align::Center => {
                let w = style.font.metrics().measure_str(text, style.size);
                (self.left() + (self.content_width() - w) / 2.0).max(self.left())
            }
        };
        let y = self.cursor_y - style.size * ASCENT;
        self.current().ops.push(DrawOp::Text {
            font: style.font,
            size: style.size,
            color: style.color,
            x,
            y,
            text: text.to_string(),
        });
        self.cursor_y -= height;
    }

    /// Word-wrapped text. Continuation lines share the first line's indent.
    pub fn paragraph(&mut self, style: &TextStyle, text: &str, align: Align, indent: f32) {
        let width = (self.content_width() - indent).max(style.size);
        for line in style.font.metrics().wrap(text, style.size, width) {
            self.line_at(style, &line, align, indent);
        }
    }

    /// Horizontal rule across the content width at the cursor.
    pub fn rule(&mut self, color: Rgb, thickness: f32) {
        self.reserve(thickness + 2.0);
        let y = self.cursor_y - thickness / 2.0;
        let (left, right) = (self.left(), self.right());
        self.current().ops.push(DrawOp::Line {
            from: (left, y),
            to: (right, y),
            width: thickness,
            color,
        });
        self.cursor_y -= thickness + 2.0;
    }

    /// Raw operation on the current page, outside cursor flow.
    pub fn draw(&mut self, op: DrawOp) {
        self.current().ops.push(op);
    }

    /// Moves the cursor down to `y` if it is currently above it.
    pub fn move_below(&mut self, y: f32) {
        self.cursor_y = self.cursor_y.min(y);
    }

    pub fn finish(self) -> Vec<Page> {
        self.pages
    }
}

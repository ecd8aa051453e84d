//! Surface that records draw commands instead of producing pixels.
//!
//! Used headless (page-start precomputation, tests) and as a reference for
//! backend implementers. Glyphs use fixed metrics derived from the font size.

use journal_book::{FontStyle, ImageAsset, Rgba};

use crate::surface::{
    wrap_text, CompositeOptions, GlyphMetrics, Justify, RenderSurface, WrapBox, WrappedSize,
};

/// Fixed-pitch metrics: every glyph advances half the font size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedMetrics {
    pub size: u16,
}

impl GlyphMetrics for FixedMetrics {
    fn advance(&self, _ch: char) -> i32 {
        (i32::from(self.size) / 2).max(1)
    }

    fn line_height(&self) -> i32 {
        i32::from(self.size).max(1)
    }

    fn ascent(&self) -> i32 {
        i32::from(self.size) * 3 / 4
    }
}

/// One recorded drawing operation.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCommand {
    Clear(Rgba),
    /// A single wrapped line of text.
    Text {
        x: i32,
        y: i32,
        text: String,
        face: String,
        size: u16,
        style: FontStyle,
        color: Rgba,
    },
    Image {
        name: String,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        options: CompositeOptions,
    },
    Flush,
}

#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    face: String,
    size: u16,
    style: FontStyle,
    color: Rgba,
    line_spacing: i16,
    justify: Justify,
    first_line_indent: i32,
    commands: Vec<SurfaceCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            face: "Arial".to_string(),
            size: 24,
            style: FontStyle::Regular,
            color: Rgba::BLACK,
            line_spacing: 0,
            justify: Justify::Left,
            first_line_indent: 0,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    /// Text of every recorded line, in draw order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                SurfaceCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names of every composited image, in draw order.
    pub fn image_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                SurfaceCommand::Image { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn metrics(&self) -> FixedMetrics {
        FixedMetrics { size: self.size }
    }

    fn wrap_box(&self, max_width: i32, max_height: i32) -> WrapBox {
        WrapBox {
            max_width,
            max_height,
            first_line_indent: self.first_line_indent,
            line_spacing: i32::from(self.line_spacing),
            justify: self.justify,
        }
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(512, 512)
    }
}

impl RenderSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_font(&mut self, face: &str, size: u16, style: FontStyle) {
        self.face = face.to_string();
        self.size = size;
        self.style = style;
    }

    fn set_text_color(&mut self, color: Rgba) {
        self.color = color;
    }

    fn set_line_spacing(&mut self, spacing: i16) {
        self.line_spacing = spacing;
    }

    fn set_justify(&mut self, justify: Justify) {
        self.justify = justify;
    }

    fn set_first_line_indent(&mut self, indent: i32) {
        self.first_line_indent = indent;
    }

    fn font_ascent(&self) -> i32 {
        self.metrics().ascent()
    }

    fn calc_wrapped_size(&self, text: &str, max_width: i32, max_height: i32) -> WrappedSize {
        let chars: Vec<char> = text.chars().collect();
        wrap_text(&chars, self.wrap_box(max_width, max_height), &self.metrics()).size
    }

    fn draw_wrapped_string(&mut self, x: i32, y: i32, text: &str, max_width: i32, max_height: i32) {
        let chars: Vec<char> = text.chars().collect();
        let wrapped = wrap_text(&chars, self.wrap_box(max_width, max_height), &self.metrics());
        for line in &wrapped.lines {
            let text: String = chars[line.start..line.end].iter().collect();
            self.commands.push(SurfaceCommand::Text {
                x: x + line.x,
                y: y + line.top,
                text,
                face: self.face.clone(),
                size: self.size,
                style: self.style,
                color: self.color,
            });
        }
    }

    fn composite(
        &mut self,
        image: &dyn ImageAsset,
        x: i32,
        y: i32,
        size: (u32, u32),
        options: &CompositeOptions,
    ) {
        self.commands.push(SurfaceCommand::Image {
            name: image.name().to_string(),
            x,
            y,
            width: size.0,
            height: size.1,
            options: *options,
        });
    }

    fn clear(&mut self, color: Rgba) {
        self.commands.clear();
        self.commands.push(SurfaceCommand::Clear(color));
    }

    fn flush(&mut self) {
        self.commands.push(SurfaceCommand::Flush);
    }

    fn copy_from(&mut self, other: &Self) {
        self.commands.clone_from(&other.commands);
    }
}

//! esHTML compiler: turns markup into a [`ChunkSequence`] plus book-level
//! [`BookSettings`].

use crate::chunk::{
    CheckboxEffect, Chunk, ChunkSequence, DecalChunk, FontChange, GlowEffect, ImageBlend,
    ImageChunk, ImageEffect, MarginChange, MovieChunk, Paragraph, Placement,
};
use crate::color::Rgba;
use crate::image::{ImageHandle, ImageLookup};
use crate::markup::{
    checkbox_color, opaque_color, parse_float, parse_int, parse_point, Attribute, Scanner,
    TagKind,
};
use crate::style::{Alignment, EditStyleSink, FontStyle, PageMargins};

/// Object composited onto the cover instead of flowing with the pages.
#[derive(Clone, Debug, PartialEq)]
pub enum CoverDecal {
    Image(DecalChunk),
    Movie(MovieChunk),
}

/// Book-level settings declared by `<cover>`, `<book>`, `<margin>`,
/// `<decal>` and `<editable>`.
#[derive(Clone, Debug)]
pub struct BookSettings {
    /// `1 - width` from `<book width=..>`; `0.0` is full size.
    pub width_scale: f32,
    /// `1 - height` from `<book height=..>`; `0.0` is full size.
    pub height_scale: f32,
    /// Cover image from `<cover src=..>`, when it resolved.
    pub cover: Option<ImageHandle>,
    /// Opaque cover tint from `<cover tint=..>`.
    pub cover_tint: Option<Rgba>,
    /// Apply the tint before compositing decals.
    pub tint_first: bool,
    pub cover_decals: Vec<CoverDecal>,
    /// Margins after the last `<margin>` tag.
    pub margins: PageMargins,
    /// Source contained `<editable>`.
    pub editable: bool,
}

impl Default for BookSettings {
    fn default() -> Self {
        Self {
            width_scale: 0.0,
            height_scale: 0.0,
            cover: None,
            cover_tint: None,
            tint_first: true,
            cover_decals: Vec::new(),
            margins: PageMargins::default(),
            editable: false,
        }
    }
}

/// Result of a compile.
#[derive(Clone, Debug, Default)]
pub struct CompiledBook {
    pub chunks: ChunkSequence,
    pub settings: BookSettings,
}

/// Markup compiler bound to its collaborators.
pub struct MarkupCompiler<'a> {
    images: &'a dyn ImageLookup,
    hint: Option<&'a str>,
    edit_sink: Option<&'a mut dyn EditStyleSink>,
    default_margins: PageMargins,
}

struct CompileState {
    chunks: ChunkSequence,
    settings: BookSettings,
    book_size: (f32, f32),
    movie_index: u8,
}

impl<'a> MarkupCompiler<'a> {
    pub fn new(images: &'a dyn ImageLookup) -> Self {
        Self {
            images,
            hint: None,
            edit_sink: None,
            default_margins: PageMargins::default(),
        }
    }

    /// Preferred location for image lookups.
    pub fn with_location_hint(mut self, hint: &'a str) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Receive live font/margin updates (bound editable widgets).
    pub fn with_edit_sink(mut self, sink: &'a mut dyn EditStyleSink) -> Self {
        self.edit_sink = Some(sink);
        self
    }

    /// Margins in effect before any `<margin>` tag.
    pub fn with_default_margins(mut self, margins: PageMargins) -> Self {
        self.default_margins = margins;
        self
    }

    /// Compile UTF-16 source, replacing unpaired surrogates.
    pub fn compile_wide(self, source: &[u16]) -> CompiledBook {
        self.compile(&String::from_utf16_lossy(source))
    }

    /// Compile `source`. Never fails; anomalies degrade to text or nothing.
    pub fn compile(mut self, source: &str) -> CompiledBook {
        let src: Vec<char> = source.chars().collect();
        let mut scanner = Scanner::new(&src);
        let mut state = CompileState {
            chunks: ChunkSequence::new(),
            settings: BookSettings {
                margins: self.default_margins,
                ..BookSettings::default()
            },
            book_size: (1.0, 1.0),
            movie_index: 0,
        };

        let mut pending = String::new();
        let mut accumulator = Alignment::Left;

        while !scanner.is_at_end() {
            if let Some(kind) = scanner.tag_here() {
                if !pending.is_empty() {
                    state.chunks.push(Chunk::Paragraph(Paragraph::new(
                        core::mem::take(&mut pending),
                        accumulator,
                    )));
                }
                scanner.enter_tag(kind);
                let attrs = scanner.attributes();
                accumulator = self.handle_tag(kind, &attrs, &mut state);
                continue;
            }
            if let Some(len) = scanner.closing_tag_here() {
                for _ in 0..len {
                    scanner.bump();
                }
                continue;
            }
            if let Some(ch) = scanner.bump() {
                pending.push(ch);
            }
        }
        if !pending.is_empty() {
            state
                .chunks
                .push(Chunk::Paragraph(Paragraph::new(pending, accumulator)));
        }

        log::debug!(
            "compiled book: {} chunks, {} cover decals, editable={}",
            state.chunks.len(),
            state.settings.cover_decals.len(),
            state.settings.editable
        );
        CompiledBook {
            chunks: state.chunks,
            settings: state.settings,
        }
    }

    /// Handle one tag and return the alignment of the next paragraph
    /// accumulator.
    fn handle_tag(
        &mut self,
        kind: TagKind,
        attrs: &[Attribute],
        state: &mut CompileState,
    ) -> Alignment {
        match kind {
            TagKind::Paragraph => {
                let mut alignment = state.chunks.last_paragraph_alignment();
                for attr in attrs.iter().filter(|attr| attr.is("align")) {
                    alignment = Alignment::parse(&attr.value).unwrap_or(alignment);
                }
                return alignment;
            }
            TagKind::Image => {
                if let Some(image) = self.image_chunk(attrs) {
                    state.chunks.push(Chunk::Image(image));
                }
            }
            TagKind::PageBreak => state.chunks.push(Chunk::PageBreak),
            TagKind::Font => {
                let change = self.font_change(attrs);
                state.chunks.push(Chunk::FontChange(change));
            }
            TagKind::Margin => {
                let change = margin_change(attrs);
                state.settings.margins = change.apply(state.settings.margins);
                if let Some(sink) = self.edit_sink.as_deref_mut() {
                    sink.set_margins(state.settings.margins);
                }
                state.chunks.push(Chunk::Margin(change));
            }
            TagKind::Cover => self.cover(attrs, &mut state.settings),
            TagKind::Book => {
                for attr in attrs {
                    if attr.is("width") {
                        state.book_size.0 = parse_float(&attr.value);
                    } else if attr.is("height") {
                        state.book_size.1 = parse_float(&attr.value);
                    }
                }
                state.settings.width_scale = 1.0 - state.book_size.0;
                state.settings.height_scale = 1.0 - state.book_size.1;
            }
            TagKind::Decal => {
                if let Some(decal) = self.decal_chunk(attrs) {
                    state.settings.cover_decals.push(CoverDecal::Image(decal));
                } else {
                    log::warn!("dropping <decal>: image not found");
                }
            }
            TagKind::Movie => {
                let movie = movie_chunk(attrs, state.movie_index);
                state.movie_index = state.movie_index.wrapping_add(1);
                if movie.name.is_empty() {
                    log::warn!("dropping <movie> without src");
                } else if movie.on_cover {
                    state.settings.cover_decals.push(CoverDecal::Movie(movie));
                } else {
                    state.chunks.push(Chunk::Movie(movie));
                }
            }
            TagKind::Editable => {
                state.settings.editable = true;
                state.chunks.push(Chunk::Editable);
            }
        }
        state.chunks.last_paragraph_alignment()
    }

    fn lookup(&self, name: &str) -> Option<ImageHandle> {
        let found = self.images.lookup_image(name, self.hint);
        if found.is_none() {
            log::warn!("image '{}' not found", name);
        }
        found
    }

    fn image_chunk(&self, attrs: &[Attribute]) -> Option<ImageChunk> {
        let mut image = None;
        let mut alignment = Alignment::Left;
        let mut position = None;
        let mut blend = ImageBlend::Opaque;
        let mut link = None;
        let mut no_resize = false;
        let mut translucent = false;
        let mut opacity = 1.0;
        let mut effect = ImageEffect::None;

        for attr in attrs {
            if attr.is("align") {
                alignment = Alignment::parse(&attr.value).unwrap_or(alignment);
            } else if attr.is("src") {
                image = self.lookup(&attr.value);
            } else if attr.is("link") {
                link = Some(parse_int(&attr.value) as u32);
            } else if attr.is("blend") {
                if attr.value_is("alpha") {
                    blend = ImageBlend::Alpha;
                }
            } else if attr.is("pos") {
                position = Some(parse_point(&attr.value));
            } else if attr.is("glow") {
                effect = ImageEffect::Glow(glow_effect(&attr.value));
            } else if attr.is("opacity") {
                translucent = true;
                opacity = parse_float(&attr.value);
            } else if attr.is("check") {
                effect = ImageEffect::Checkbox(checkbox_effect(&attr.value));
            } else if attr.is("resize") && attr.value_is("no") {
                no_resize = true;
            }
        }

        let mut chunk = ImageChunk::new(image?);
        chunk.placement = placement(alignment, position);
        chunk.blend = blend;
        chunk.link = link;
        chunk.no_resize = no_resize;
        chunk.translucent = translucent;
        chunk.opacity = opacity;
        chunk.effect = effect;
        Some(chunk)
    }

    fn decal_chunk(&self, attrs: &[Attribute]) -> Option<DecalChunk> {
        let mut image = None;
        let mut alignment = Alignment::Left;
        let mut position = None;
        let mut no_resize = false;
        let mut tint = false;
        for attr in attrs {
            if attr.is("align") {
                alignment = Alignment::parse(&attr.value).unwrap_or(alignment);
            } else if attr.is("src") {
                image = self.lookup(&attr.value);
            } else if attr.is("pos") {
                position = Some(parse_point(&attr.value));
            } else if attr.is("resize") && attr.value_is("no") {
                no_resize = true;
            } else if attr.is("tint") && attr.value_is("yes") {
                tint = true;
            }
        }
        Some(DecalChunk {
            image: image?,
            placement: placement(alignment, position),
            no_resize,
            tint,
        })
    }

    fn font_change(&mut self, attrs: &[Attribute]) -> FontChange {
        let mut change = FontChange::default();
        for attr in attrs {
            if attr.is("style") {
                let style = FontStyle::parse(&attr.value);
                change.style = Some(style);
                if let Some(sink) = self.edit_sink.as_deref_mut() {
                    sink.set_font_style(style);
                }
            } else if attr.is("face") {
                change.face = Some(attr.value.clone());
                if let Some(sink) = self.edit_sink.as_deref_mut() {
                    sink.set_font_face(&attr.value);
                }
            } else if attr.is("size") {
                let size = parse_int(&attr.value).clamp(0, i32::from(u16::MAX)) as u16;
                change.size = Some(size);
                if let Some(sink) = self.edit_sink.as_deref_mut() {
                    sink.set_font_size(size);
                }
            } else if attr.is("color") {
                let color = opaque_color(&attr.value);
                change.color = Some(color);
                if let Some(sink) = self.edit_sink.as_deref_mut() {
                    sink.set_font_color(color);
                }
            } else if attr.is("spacing") {
                let spacing = parse_int(&attr.value).clamp(i32::from(i16::MIN), i32::from(i16::MAX));
                change.line_spacing = Some(spacing as i16);
            }
        }
        change
    }

    fn cover(&self, attrs: &[Attribute], settings: &mut BookSettings) {
        for attr in attrs {
            if attr.is("src") {
                if let Some(image) = self.lookup(&attr.value) {
                    settings.cover = Some(image);
                }
            } else if attr.is("tint") {
                settings.cover_tint = Some(opaque_color(&attr.value));
            } else if attr.is("tintfirst") && attr.value_is("no") {
                settings.tint_first = false;
            }
        }
    }
}

/// Compile `source` with no location hint and no edit widgets bound.
pub fn compile(source: &str, images: &dyn ImageLookup) -> CompiledBook {
    MarkupCompiler::new(images).compile(source)
}

fn placement(alignment: Alignment, position: Option<(i32, i32)>) -> Placement {
    match position {
        Some((x, y)) => Placement::Floating { x, y },
        None => Placement::Flow(alignment),
    }
}

fn glow_effect(value: &str) -> GlowEffect {
    let mut parts = value.splitn(3, ',');
    let period = parts.next().map(parse_float).unwrap_or(0.0);
    let min_opacity = parts.next().map(parse_float).unwrap_or(0.0);
    let max_opacity = parts.next().map(parse_float).unwrap_or(1.0);
    GlowEffect {
        period,
        min_opacity,
        max_opacity,
    }
}

fn checkbox_effect(value: &str) -> CheckboxEffect {
    let mut parts = value.splitn(3, ',');
    let on_color = parts.next().map(checkbox_color).unwrap_or(Rgba::WHITE);
    let off_color = parts.next().map(checkbox_color).unwrap_or(Rgba::WHITE);
    let checked = parts.next().is_some_and(|flag| parse_int(flag) != 0);
    CheckboxEffect::new(on_color, off_color, checked)
}

fn margin_change(attrs: &[Attribute]) -> MarginChange {
    let mut change = MarginChange::default();
    for attr in attrs {
        let value = Some(parse_int(&attr.value));
        if attr.is("top") {
            change.top = value;
        } else if attr.is("left") {
            change.left = value;
        } else if attr.is("bottom") {
            change.bottom = value;
        } else if attr.is("right") {
            change.right = value;
        }
    }
    change
}

fn movie_chunk(attrs: &[Attribute], movie_index: u8) -> MovieChunk {
    let mut movie = MovieChunk::new(String::new(), movie_index);
    let mut alignment = Alignment::Left;
    let mut position = None;
    for attr in attrs {
        if attr.is("align") {
            alignment = Alignment::parse(&attr.value).unwrap_or(alignment);
        } else if attr.is("src") {
            movie.name = attr.value.clone();
        } else if attr.is("link") {
            movie.link = Some(parse_int(&attr.value) as u32);
        } else if attr.is("pos") {
            position = Some(parse_point(&attr.value));
        } else if attr.is("resize") && attr.value_is("no") {
            movie.no_resize = true;
        } else if attr.is("oncover") && attr.value_is("yes") {
            movie.on_cover = true;
        } else if attr.is("loop") && attr.value_is("no") {
            movie.looping = false;
        }
    }
    movie.placement = placement(alignment, position);
    movie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageLibrary, NoImages, SolidImage, SHARED_IMAGE_LOCATION};
    use crate::style::FontStyle;

    fn library() -> ImageLibrary {
        let mut lib = ImageLibrary::new();
        lib.insert(
            SHARED_IMAGE_LOCATION,
            SolidImage::new("xJournalMap", 64, 48, Rgba::WHITE).handle(),
        );
        lib.insert(
            SHARED_IMAGE_LOCATION,
            SolidImage::new("xCheck", 16, 16, Rgba::WHITE).handle(),
        );
        lib
    }

    fn paragraph(chunk: &Chunk) -> (&str, Alignment) {
        match chunk {
            Chunk::Paragraph(p) => (p.text.as_str(), p.alignment),
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[derive(Default)]
    struct SinkLog {
        calls: Vec<String>,
    }

    impl EditStyleSink for SinkLog {
        fn set_font_style(&mut self, style: FontStyle) {
            self.calls.push(format!("style {style:?}"));
        }
        fn set_font_face(&mut self, face: &str) {
            self.calls.push(format!("face {face}"));
        }
        fn set_font_size(&mut self, size: u16) {
            self.calls.push(format!("size {size}"));
        }
        fn set_font_color(&mut self, color: Rgba) {
            self.calls.push(format!("color {:08x}", color.to_argb32()));
        }
        fn set_margins(&mut self, m: PageMargins) {
            self.calls
                .push(format!("margins {} {} {} {}", m.top, m.left, m.bottom, m.right));
        }
    }

    #[test]
    fn closing_tags_and_inherited_alignment() {
        let book = compile("<p align=center>Hello</p><pb><p>World</p>", &NoImages);
        assert_eq!(book.chunks.len(), 3);
        assert_eq!(paragraph(&book.chunks[0]), ("Hello", Alignment::Center));
        assert_eq!(book.chunks[1], Chunk::PageBreak);
        assert_eq!(paragraph(&book.chunks[2]), ("World", Alignment::Center));
    }

    #[test]
    fn text_before_first_tag_and_trailing_text_are_paragraphs() {
        let book = compile("Intro<pb>tail text", &NoImages);
        assert_eq!(book.chunks.len(), 3);
        assert_eq!(paragraph(&book.chunks[0]), ("Intro", Alignment::Left));
        assert_eq!(paragraph(&book.chunks[2]), ("tail text", Alignment::Left));
    }

    #[test]
    fn unknown_tags_stay_literal_text() {
        let book = compile("a <b>bold</b> claim", &NoImages);
        assert_eq!(book.chunks.len(), 1);
        assert_eq!(paragraph(&book.chunks[0]).0, "a <b>bold</b> claim");
    }

    #[test]
    fn empty_paragraph_tag_only_sets_alignment_for_its_text() {
        let book = compile("<p align=right><p>x", &NoImages);
        assert_eq!(book.chunks.len(), 1);
        assert_eq!(paragraph(&book.chunks[0]), ("x", Alignment::Left));
    }

    #[test]
    fn image_attributes_are_decoded() {
        let lib = library();
        let book = compile(
            "<img src=xJournalMap align=right link=7 blend=alpha opacity=0.5 resize=no>",
            &lib,
        );
        let Some(Chunk::Image(image)) = book.chunks.get(0) else {
            panic!("expected image chunk");
        };
        assert_eq!(image.placement, Placement::Flow(Alignment::Right));
        assert_eq!(image.link, Some(7));
        assert_eq!(image.blend, ImageBlend::Alpha);
        assert!(image.translucent);
        assert_eq!(image.opacity, 0.5);
        assert!(image.no_resize);
        assert_eq!(image.image.width(), 64);
    }

    #[test]
    fn glow_and_check_are_mutually_exclusive_last_wins() {
        let lib = library();
        let book = compile(
            "<img src=xCheck glow=2,0.2,0.9 check=00ff00,ff0000,1 pos=10,20>",
            &lib,
        );
        let Some(Chunk::Image(image)) = book.chunks.get(0) else {
            panic!("expected image chunk");
        };
        let ImageEffect::Checkbox(check) = image.effect else {
            panic!("expected checkbox effect");
        };
        assert!(check.checked);
        assert_eq!(check.on_color.to_argb32(), 0xff00_ff00);
        assert_eq!(check.off_color.to_argb32(), 0xffff_0000);
        assert_eq!(check.current_color, check.on_color);
        assert_eq!(image.placement, Placement::Floating { x: 10, y: 20 });

        let book = compile("<img src=xCheck check=00ff00,ff0000,0 glow=2,0.2>", &lib);
        let Some(Chunk::Image(image)) = book.chunks.get(0) else {
            panic!("expected image chunk");
        };
        assert_eq!(
            image.effect,
            ImageEffect::Glow(GlowEffect {
                period: 2.0,
                min_opacity: 0.2,
                max_opacity: 1.0
            })
        );
    }

    #[test]
    fn missing_images_and_movies_are_dropped() {
        let book = compile("a<img src=nope>b<movie loop=no>c<decal src=nope>d", &NoImages);
        let texts: Vec<&str> = book.chunks.iter().map(|c| paragraph(c).0).collect();
        assert_eq!(texts, ["a", "b", "c", "d"]);
        assert!(book.settings.cover_decals.is_empty());
    }

    #[test]
    fn movies_count_every_tag_and_cover_movies_become_decals() {
        let book = compile(
            "<movie src=intro.bik oncover=yes><movie><movie src=clip.bik link=3 loop=no>",
            &NoImages,
        );
        assert_eq!(book.chunks.len(), 1);
        let Chunk::Movie(movie) = &book.chunks[0] else {
            panic!("expected movie");
        };
        assert_eq!(movie.movie_index, 2);
        assert_eq!(movie.link, Some(3));
        assert!(!movie.looping);
        assert!(matches!(
            book.settings.cover_decals.as_slice(),
            [CoverDecal::Movie(m)] if m.name == "intro.bik" && m.movie_index == 0
        ));
    }

    #[test]
    fn book_cover_and_margin_settings() {
        let lib = library();
        let book = compile(
            "<book width=0.8 height=0.5><cover src=xJournalMap tint=336699 tintfirst=no>\
             <margin top=40 left=24><decal src=xCheck pos=5,6 tint=yes>",
            &lib,
        );
        assert!(book.chunks.iter().all(|c| matches!(c, Chunk::Margin(_))));
        let s = &book.settings;
        assert!((s.width_scale - 0.2).abs() < 1e-6);
        assert!((s.height_scale - 0.5).abs() < 1e-6);
        assert_eq!(s.cover.as_ref().map(|c| c.name().to_string()), Some("xJournalMap".into()));
        assert_eq!(s.cover_tint.map(Rgba::to_argb32), Some(0xff33_6699));
        assert!(!s.tint_first);
        assert_eq!(s.margins, PageMargins { top: 40, left: 24, bottom: 16, right: 16 });
        assert!(matches!(
            s.cover_decals.as_slice(),
            [CoverDecal::Image(d)] if d.tint && d.placement == Placement::Floating { x: 5, y: 6 }
        ));
    }

    #[test]
    fn editable_marks_settings_and_emits_marker() {
        let book = compile("<editable>notes", &NoImages);
        assert!(book.settings.editable);
        assert_eq!(book.chunks[0], Chunk::Editable);
        assert_eq!(paragraph(&book.chunks[1]).0, "notes");
    }

    #[test]
    fn font_and_margin_tags_reach_edit_sink_only() {
        let mut sink = SinkLog::default();
        let book = MarkupCompiler::new(&NoImages)
            .with_edit_sink(&mut sink)
            .compile("<font style=bi face=\"Sharper Text\" size=18 color=ff0000 spacing=-2><margin top=30>x");
        assert_eq!(
            sink.calls,
            [
                "style BoldItalic",
                "face Sharper Text",
                "size 18",
                "color ffff0000",
                "margins 30 16 16 16",
            ]
        );
        let Chunk::FontChange(change) = &book.chunks[0] else {
            panic!("expected font change");
        };
        assert_eq!(change.line_spacing, Some(-2));
        assert_eq!(change.style, Some(FontStyle::BoldItalic));
    }

    #[test]
    fn wide_input_matches_utf8_input() {
        let text = "<p align=right>Grüße<pb>€";
        let wide: Vec<u16> = text.encode_utf16().collect();
        let a = compile(text, &NoImages);
        let b = MarkupCompiler::new(&NoImages).compile_wide(&wide);
        assert_eq!(a.chunks, b.chunks);
    }

    #[test]
    fn malformed_input_never_panics() {
        for src in ["<", "<p", "<img src=", "<font size=\"12", "</p", "<<p>>", "<p align=>x"] {
            let _ = compile(src, &NoImages);
        }
    }
}

use journal_book::{
    compile, Alignment, Chunk, ChunkKind, CoverDecal, FontStyle, ImageEffect, ImageLibrary, MarkupCompiler, Placement,
    Rgba, SolidImage, SHARED_IMAGE_LOCATION,
};
use journal_book_render::{LayoutConfig, PageSlot, Paginator, RecordingSurface, RenderTarget};

const AUNT_JOURNAL: &str = "\
<cover src=leather tint=704030><decal src=clasp pos=400,240>\
<margin left=24 right=24>\
<font style=b size=28><p align=center>Aunt Sophie's Journal\
<font style=n size=20><p align=left>The lighthouse keeper never answered my letters.\
<img src=map align=right link=1 resize=no>\
<pb>\
<p>Two things I am sure of:\
<img src=box check=00ff00,808080,1 link=2><p>the lamp was lit\
<img src=box check=00ff00,808080 link=3><p>nobody lit it\
<movie src=waves.bik loop=no>";

fn library() -> ImageLibrary {
    let mut library = ImageLibrary::new();
    library.insert(SHARED_IMAGE_LOCATION, SolidImage::new("leather", 512, 512, Rgba::BLACK).handle());
    library.insert(SHARED_IMAGE_LOCATION, SolidImage::new("clasp", 40, 60, Rgba::WHITE).handle());
    library.insert(SHARED_IMAGE_LOCATION, SolidImage::new("map", 160, 120, Rgba::WHITE).handle());
    library.insert(SHARED_IMAGE_LOCATION, SolidImage::new("box", 20, 20, Rgba::WHITE).handle());
    library.insert("Journals/Sophie", SolidImage::new("map", 300, 200, Rgba::WHITE).handle());
    library
}

#[test]
fn journal_compiles_to_expected_chunk_kinds() {
    let book = compile(AUNT_JOURNAL, &library());
    let kinds: Vec<ChunkKind> = book.chunks.iter().map(Chunk::kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChunkKind::Margin,
            ChunkKind::FontChange,
            ChunkKind::Paragraph,
            ChunkKind::FontChange,
            ChunkKind::Paragraph,
            ChunkKind::Image,
            ChunkKind::PageBreak,
            ChunkKind::Paragraph,
            ChunkKind::Image,
            ChunkKind::Paragraph,
            ChunkKind::Image,
            ChunkKind::Paragraph,
            ChunkKind::Movie,
        ]
    );

    assert_eq!(book.chunks[2].as_paragraph().map(|p| p.alignment), Some(Alignment::Center));
    assert_eq!(book.chunks[4].as_paragraph().map(|p| p.alignment), Some(Alignment::Left));
    let Chunk::FontChange(title_font) = &book.chunks[1] else {
        panic!("expected the title font change");
    };
    assert_eq!(title_font.style, Some(FontStyle::Bold));
    assert_eq!(title_font.size, Some(28));

    let settings = &book.settings;
    assert!(settings.cover.is_some());
    assert_eq!(settings.cover_tint.map(Rgba::to_argb32), Some(0xff70_4030));
    assert!(matches!(
        settings.cover_decals.as_slice(),
        [CoverDecal::Image(decal)] if decal.placement == Placement::Floating { x: 400, y: 240 }
    ));
    assert_eq!(settings.margins.left, 24);
}

#[test]
fn checkboxes_start_in_their_declared_state() {
    let book = compile(AUNT_JOURNAL, &library());
    let checks: Vec<(bool, bool, Option<u32>)> = book
        .chunks
        .iter()
        .filter_map(Chunk::as_image)
        .filter_map(|image| match image.effect {
            ImageEffect::Checkbox(check) => Some((check.checked, check.is_settled(), image.link)),
            _ => None,
        })
        .collect();
    assert_eq!(checks, vec![(true, true, Some(2)), (false, true, Some(3))]);
}

#[test]
fn location_hint_prefers_the_journal_folder() {
    let library = library();
    let shared = compile(AUNT_JOURNAL, &library);
    let hinted = MarkupCompiler::new(&library)
        .with_location_hint("Journals/Sophie")
        .compile(AUNT_JOURNAL);

    let map_width = |chunks: &journal_book::ChunkSequence| {
        chunks
            .iter()
            .filter_map(Chunk::as_image)
            .find(|image| image.no_resize)
            .map(|image| image.image.width())
    };
    assert_eq!(map_width(&shared.chunks), Some(160));
    assert_eq!(map_width(&hinted.chunks), Some(300));
}

#[test]
fn compiled_journal_paginates_to_two_pages() {
    let mut chunks = compile(AUNT_JOURNAL, &library()).chunks;
    let mut paginator = Paginator::new(LayoutConfig::default());
    let mut surface = RecordingSurface::default();

    let first = paginator.render_page(
        0,
        &mut chunks,
        &mut RenderTarget {
            surface: &mut surface,
            slot: PageSlot::Left,
            suppress_draw: false,
            movies: None,
        },
    );
    assert_eq!(first.links.len(), 1);
    assert_eq!(surface.image_names(), vec!["map"]);

    let second = paginator.render_page(
        1,
        &mut chunks,
        &mut RenderTarget {
            surface: &mut surface,
            slot: PageSlot::Right,
            suppress_draw: false,
            movies: None,
        },
    );
    assert_eq!(second.links.len(), 2);
    assert!(!second.needs_sfx);
    assert_eq!(paginator.last_page(), Some(1));
    assert_eq!(
        surface.text_lines(),
        vec!["Two things I am sure of:", "the lamp was lit", "nobody lit it"]
    );
}

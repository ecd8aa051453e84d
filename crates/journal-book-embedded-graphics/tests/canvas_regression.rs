use journal_book::{compile, ImageLibrary, Rgba, SolidImage, SHARED_IMAGE_LOCATION};
use journal_book_embedded_graphics::{page_surfaces, Bitmap, EgSurface, PageCanvas};
use journal_book_render::{
    AnimationCue, Animator, BookConfig, BookDialog, BookGui, BookGuiRegistry, BookId, CoverAnimation,
    FlipDirection, FrameClock, JournalBook, LayoutConfig, PageSide, PageSlot, Paginator, RenderSurface,
    RenderTarget,
    DEFAULT_GUI,
};

const RED: u32 = 0xffff_0000;
const GREEN: u32 = 0xff00_ff00;

struct Quiet;

impl BookDialog for Quiet {
    fn set_visible(&mut self, _visible: bool) {}
    fn set_turn_page_visible(&mut self, _visible: bool) {}
    fn set_corner_visible(&mut self, _side: PageSide, _visible: bool) {}
    fn set_book_size(&mut self, _width_scale: f32, _height_scale: f32) {}
}

impl Animator for Quiet {
    fn play_cover(&mut self, _animation: CoverAnimation) {}
    fn play_flip(&mut self, _direction: FlipDirection) {}
}

impl FrameClock for Quiet {
    fn subscribe_ticks(&mut self) {}
    fn unsubscribe_ticks(&mut self) {}
}

fn library() -> ImageLibrary {
    let mut library = ImageLibrary::new();
    library.insert(SHARED_IMAGE_LOCATION, SolidImage::new("stamp", 40, 30, Rgba::from_argb32(RED)).handle());
    library.insert(SHARED_IMAGE_LOCATION, SolidImage::new("box", 20, 20, Rgba::WHITE).handle());
    library
}

fn render(source: &str, page: usize) -> EgSurface {
    let mut chunks = compile(source, &library()).chunks;
    let mut paginator = Paginator::new(LayoutConfig::default());
    let mut surface = EgSurface::new(512, 512);
    paginator.render_page(
        page,
        &mut chunks,
        &mut RenderTarget {
            surface: &mut surface,
            slot: PageSlot::Left,
            suppress_draw: false,
            movies: None,
        },
    );
    surface
}

/// Bounding box `(min_x, min_y, max_x, max_y)` of pixels equal to `argb`.
fn bounds_of(canvas: &PageCanvas, argb: u32) -> Option<(i32, i32, i32, i32)> {
    let mut out: Option<(i32, i32, i32, i32)> = None;
    for y in 0..canvas.height() as i32 {
        for x in 0..canvas.width() as i32 {
            if canvas.pixel(x, y).map(Rgba::to_argb32) != Some(argb) {
                continue;
            }
            out = Some(match out {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    out
}

#[test]
fn first_line_is_inked_inside_the_margins() {
    let surface = render("<p>page 1", 0);
    let (x0, y0, x1, y1) = bounds_of(surface.canvas(), 0xff00_0000).unwrap();
    assert!(x0 >= 16 && x1 < 16 + 60, "ink spans x {x0}..={x1}");
    assert!(y0 >= 16 && y1 < 16 + 20, "ink spans y {y0}..={y1}");
    assert_eq!(surface.flush_count(), 1);
}

#[test]
fn images_are_composited_at_their_flow_position() {
    let surface = render("<img src=stamp>", 0);
    let canvas = surface.canvas();
    assert_eq!(canvas.count_color(Rgba::from_argb32(RED)), 40 * 30);
    assert_eq!(bounds_of(canvas, RED), Some((16, 16, 16 + 39, 16 + 29)));
    assert_eq!(canvas.pixel(0, 0), Some(Rgba::TRANSPARENT));
}

#[test]
fn checked_boxes_are_tinted_with_their_checked_color() {
    let surface = render("<img src=box check=00ff00,808080,1 link=4>", 0);
    assert_eq!(surface.canvas().count_color(Rgba::from_argb32(GREEN)), 20 * 20);
}

#[test]
fn second_page_starts_clean() {
    let surface = render("<img src=stamp><pb><p>later", 1);
    assert_eq!(surface.canvas().count_color(Rgba::from_argb32(RED)), 0);
    assert!(bounds_of(surface.canvas(), 0xff00_0000).is_some());
}

#[test]
fn surface_snapshots_can_be_placed_as_images() {
    let mut thumb = EgSurface::new(30, 20);
    thumb.clear(Rgba::from_argb32(GREEN));
    let mut library = library();
    library.insert(SHARED_IMAGE_LOCATION, Bitmap::from_canvas("thumb", thumb.canvas()).handle());

    let mut chunks = compile("<img src=thumb align=right>", &library).chunks;
    let mut surface = EgSurface::new(512, 512);
    Paginator::new(LayoutConfig::default()).render_page(
        0,
        &mut chunks,
        &mut RenderTarget {
            surface: &mut surface,
            slot: PageSlot::Right,
            suppress_draw: false,
            movies: None,
        },
    );
    assert_eq!(bounds_of(surface.canvas(), GREEN), Some((512 - 16 - 30, 16, 512 - 16 - 1, 16 + 19)));
}

#[test]
fn forward_flip_moves_the_turned_page_onto_the_left() {
    let mut guis = BookGuiRegistry::new();
    guis.init(BookGui::new(page_surfaces(512, 512), Box::new(Quiet), Box::new(Quiet), Box::new(Quiet)));
    let source = (1..=4).map(|n| format!("<p>page {n}")).collect::<Vec<_>>().join("<pb>");
    let mut book = JournalBook::new(BookId(1), source, Box::new(library()), BookConfig::default(), &mut guis).unwrap();

    book.show(true, &mut guis);
    book.handle_cue(AnimationCue::CoverSettled { opened: true }, &mut guis);
    let canvas = |guis: &BookGuiRegistry<EgSurface>, slot: PageSlot| {
        guis.get(DEFAULT_GUI).map(|gui| gui.surface(slot).canvas().clone()).unwrap()
    };
    let first_left = canvas(&guis, PageSlot::Left);
    assert!(bounds_of(&first_left, 0xff00_0000).is_some());

    book.next_page(&mut guis);
    book.handle_cue(AnimationCue::FlipBegin(FlipDirection::Forward), &mut guis);
    let turn_back = canvas(&guis, PageSlot::TurnBack);
    book.handle_cue(AnimationCue::FlipStop(FlipDirection::Forward), &mut guis);

    assert_eq!(book.current_page(), 2);
    let left = canvas(&guis, PageSlot::Left);
    assert_eq!(left, turn_back);
    assert_ne!(left, first_left);
}

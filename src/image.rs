//! Image collaborator boundary: shared image handles and name lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::color::Rgba;

/// Location searched after the hinted one when resolving image names.
pub const SHARED_IMAGE_LOCATION: &str = "GUI/BkBookImages";

/// Decoded image owned by the resource collaborator.
pub trait ImageAsset: fmt::Debug + Send + Sync {
    /// Resource name the image was registered under.
    fn name(&self) -> &str;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Color at `(x, y)`, or `None` outside the image.
    fn pixel(&self, x: u32, y: u32) -> Option<Rgba>;
}

/// Shared, never-exclusive reference to an image asset.
pub type ImageHandle = Arc<dyn ImageAsset>;

/// Resolves image names referenced by markup.
pub trait ImageLookup {
    /// Look `name` up, treating `hint` as the preferred location.
    ///
    /// A miss is `None`, never an error.
    fn lookup_image(&self, name: &str, hint: Option<&str>) -> Option<ImageHandle>;
}

impl<F> ImageLookup for F
where
    F: Fn(&str, Option<&str>) -> Option<ImageHandle>,
{
    fn lookup_image(&self, name: &str, hint: Option<&str>) -> Option<ImageHandle> {
        self(name, hint)
    }
}

/// Lookup that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoImages;

impl ImageLookup for NoImages {
    fn lookup_image(&self, _name: &str, _hint: Option<&str>) -> Option<ImageHandle> {
        None
    }
}

/// In-memory image registry grouped by location.
///
/// Resolution order: exact name in the hinted location, then the shared
/// book-image location, then a case-insensitive name match in any location.
#[derive(Clone, Debug, Default)]
pub struct ImageLibrary {
    locations: BTreeMap<String, BTreeMap<String, ImageHandle>>,
}

impl ImageLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `image` under its own name at `location`, replacing any
    /// previous entry with the same name.
    pub fn insert(&mut self, location: &str, image: ImageHandle) {
        self.locations
            .entry(location.to_string())
            .or_default()
            .insert(image.name().to_string(), image);
    }

    pub fn len(&self) -> usize {
        self.locations.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn exact(&self, location: &str, name: &str) -> Option<ImageHandle> {
        self.locations
            .get(location)
            .and_then(|images| images.get(name))
            .cloned()
    }
}

impl ImageLookup for ImageLibrary {
    fn lookup_image(&self, name: &str, hint: Option<&str>) -> Option<ImageHandle> {
        if let Some(found) = hint.and_then(|location| self.exact(location, name)) {
            return Some(found);
        }
        if let Some(found) = self.exact(SHARED_IMAGE_LOCATION, name) {
            return Some(found);
        }
        self.locations
            .values()
            .flat_map(|images| images.iter())
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, image)| Arc::clone(image))
    }
}

/// Single-color image, handy for hosts without decoded assets.
#[derive(Clone, Debug, PartialEq)]
pub struct SolidImage {
    name: String,
    width: u32,
    height: u32,
    color: Rgba,
}

impl SolidImage {
    pub fn new(name: impl Into<String>, width: u32, height: u32, color: Rgba) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            color,
        }
    }

    /// Wrap into a shareable handle.
    pub fn handle(self) -> ImageHandle {
        Arc::new(self)
    }
}

impl ImageAsset for SolidImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        (x < self.width && y < self.height).then_some(self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(name: &str, width: u32) -> ImageHandle {
        SolidImage::new(name, width, 8, Rgba::WHITE).handle()
    }

    #[test]
    fn hinted_location_wins_over_shared() {
        let mut library = ImageLibrary::new();
        library.insert("Ages/Teledahn", solid("map", 10));
        library.insert(SHARED_IMAGE_LOCATION, solid("map", 20));

        let hinted = library.lookup_image("map", Some("Ages/Teledahn"));
        assert_eq!(hinted.map(|img| img.width()), Some(10));

        let unhinted = library.lookup_image("map", None);
        assert_eq!(unhinted.map(|img| img.width()), Some(20));
    }

    #[test]
    fn fuzzy_search_ignores_case_and_location() {
        let mut library = ImageLibrary::new();
        library.insert("Ages/Gahreesen", solid("Linking_Panel", 4));
        let found = library.lookup_image("linking_panel", Some("Ages/Other"));
        assert_eq!(found.map(|img| img.name().to_string()), Some("Linking_Panel".into()));
        assert!(library.lookup_image("missing", None).is_none());
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn closures_act_as_lookups() {
        let lookup = |name: &str, _hint: Option<&str>| (name == "x").then(|| solid("x", 1));
        assert!(lookup.lookup_image("x", None).is_some());
        assert!(lookup.lookup_image("y", None).is_none());
    }
}

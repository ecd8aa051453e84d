//! Movie layers: host boundary and the per-book loaded-movie cache.

use heapless::Deque;
use journal_book::MovieChunk;
use log::{debug, warn};

use crate::config::MOVIE_CACHE_CAPACITY;
use crate::gui::PageSlot;

/// Identity of a loaded movie: asset name plus its ordinal in the source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MovieKey {
    pub name: String,
    pub movie_index: u8,
}

impl MovieKey {
    pub fn of(movie: &MovieChunk) -> Self {
        Self {
            name: movie.name.clone(),
            movie_index: movie.movie_index,
        }
    }
}

/// Pixel size of an opened movie layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovieLayer {
    pub width: u32,
    pub height: u32,
}

/// Host-side movie playback.
pub trait MovieHost {
    /// Load `movie` and report its layer size; `None` when it cannot play.
    fn open(&mut self, movie: &MovieChunk) -> Option<MovieLayer>;
    /// Attach the loaded layer to the page shown in `slot`.
    fn place(&mut self, movie: &MovieChunk, slot: PageSlot, x: i32, y: i32);
    /// Attach the loaded layer to the closed cover.
    fn place_on_cover(&mut self, _movie: &MovieChunk) {}
    /// Detach every layer from `slot`.
    fn detach_all(&mut self, slot: PageSlot);
    /// Re-home `from`'s layers onto `to` (turn buffers become visible pages).
    fn move_layers(&mut self, from: PageSlot, to: PageSlot);
    fn release(&mut self, key: &MovieKey);
}

/// Loaded movie plus its layer size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedMovie {
    pub key: MovieKey,
    pub layer: MovieLayer,
}

/// Bounded FIFO of loaded movies; the oldest is released when full.
#[derive(Debug, Default)]
pub struct MovieCache {
    loaded: Deque<LoadedMovie, MOVIE_CACHE_CAPACITY>,
}

impl MovieCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn get(&self, movie: &MovieChunk) -> Option<&LoadedMovie> {
        self.loaded
            .iter()
            .find(|loaded| loaded.key.name == movie.name && loaded.key.movie_index == movie.movie_index)
    }

    /// Loaded movie with the given source ordinal.
    pub fn by_index(&self, movie_index: u8) -> Option<&LoadedMovie> {
        self.loaded.iter().find(|loaded| loaded.key.movie_index == movie_index)
    }

    /// Layer for `movie`, opening it through `host` on first use.
    pub fn get_or_open(&mut self, movie: &MovieChunk, host: &mut dyn MovieHost) -> Option<MovieLayer> {
        if let Some(loaded) = self.get(movie) {
            return Some(loaded.layer);
        }
        let Some(layer) = host.open(movie) else {
            warn!("movie '{}' could not be opened", movie.name);
            return None;
        };
        if self.loaded.is_full() {
            if let Some(evicted) = self.loaded.pop_front() {
                debug!("movie cache full; releasing '{}'", evicted.key.name);
                host.release(&evicted.key);
            }
        }
        let entry = LoadedMovie {
            key: MovieKey::of(movie),
            layer,
        };
        if self.loaded.push_back(entry).is_err() {
            return None;
        }
        Some(layer)
    }

    /// Release every loaded movie.
    pub fn release_all(&mut self, host: &mut dyn MovieHost) {
        while let Some(loaded) = self.loaded.pop_front() {
            host.release(&loaded.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Host {
        opened: Vec<String>,
        released: Vec<String>,
    }

    impl MovieHost for Host {
        fn open(&mut self, movie: &MovieChunk) -> Option<MovieLayer> {
            if movie.name == "missing" {
                return None;
            }
            self.opened.push(movie.name.clone());
            Some(MovieLayer {
                width: 64,
                height: 48,
            })
        }
        fn place(&mut self, _movie: &MovieChunk, _slot: PageSlot, _x: i32, _y: i32) {}
        fn detach_all(&mut self, _slot: PageSlot) {}
        fn move_layers(&mut self, _from: PageSlot, _to: PageSlot) {}
        fn release(&mut self, key: &MovieKey) {
            self.released.push(key.name.clone());
        }
    }

    #[test]
    fn opens_once_per_key() {
        let mut host = Host::default();
        let mut cache = MovieCache::new();
        let movie = MovieChunk::new("fire", 0);
        assert!(cache.get_or_open(&movie, &mut host).is_some());
        assert!(cache.get_or_open(&movie, &mut host).is_some());
        assert_eq!(host.opened, vec!["fire"]);
        assert_eq!(cache.by_index(0).map(|m| m.layer.width), Some(64));
    }

    #[test]
    fn full_cache_evicts_oldest() {
        let mut host = Host::default();
        let mut cache = MovieCache::new();
        for i in 0..=MOVIE_CACHE_CAPACITY as u8 {
            let movie = MovieChunk::new(format!("m{i}"), i);
            cache.get_or_open(&movie, &mut host);
        }
        assert_eq!(cache.len(), MOVIE_CACHE_CAPACITY);
        assert_eq!(host.released, vec!["m0"]);
        assert!(cache.by_index(0).is_none());

        cache.release_all(&mut host);
        assert!(cache.is_empty());
        assert_eq!(host.released.len(), MOVIE_CACHE_CAPACITY + 1);
    }

    #[test]
    fn unopenable_movies_are_not_cached() {
        let mut host = Host::default();
        let mut cache = MovieCache::new();
        assert!(cache.get_or_open(&MovieChunk::new("missing", 0), &mut host).is_none());
        assert!(cache.is_empty());
    }
}

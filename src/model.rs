// Catalog data model
//
// Value types produced by one sync pass against the remote server. A
// Catalog is an immutable snapshot: a new sync replaces it wholesale,
// nothing updates it in place.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An artist as listed by the server's artist index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    /// Album count reported by the index. Diagnostic only — the paginated
    /// album listing is the source of truth.
    pub album_count: Option<u32>,
}

/// An album from the paginated album listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    /// Artist display name. Not a foreign key — albums belong to an artist
    /// by name only.
    pub artist: String,
    pub year: Option<i32>,
}

/// A single track. `artist` and `album` are denormalized display strings;
/// grouping by them relies on identical spelling, never on ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: Option<i32>,
    /// Duration in seconds, when the server reports one.
    pub duration: Option<u32>,
}

/// Full synchronized library snapshot. Track order is deterministic:
/// albums in listing order, tracks in album order within each album.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub tracks: Vec<Track>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.albums.is_empty() && self.tracks.is_empty()
    }

    /// Lookup table from track id to track, used to map model-returned ids
    /// back onto catalog records.
    pub fn track_index(&self) -> HashMap<&str, &Track> {
        self.tracks.iter().map(|t| (t.id.as_str(), t)).collect()
    }
}

/// An ordered list of catalog tracks in the order the model returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("Title {}", id),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            year: Some(2001),
            duration: Some(180),
        }
    }

    #[test]
    fn test_track_index_covers_all_ids() {
        let catalog = Catalog {
            artists: vec![],
            albums: vec![],
            tracks: vec![track("a"), track("b"), track("c")],
        };

        let index = catalog.track_index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("b").unwrap().title, "Title b");
        assert!(!index.contains_key("z"));
    }
}

// Selection context consumed from the UI collaborator
//
// A closed tagged union describing what the user had selected when they
// asked for a playlist. How a selection is detected is entirely the
// collaborator's business — this crate only consumes the normalized value,
// so none of its logic ever needs a rendered page.

use serde::{Deserialize, Serialize};

/// A selected song. Title/artist/album are display strings as shown in the
/// UI, not catalog references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedSong {
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedAlbum {
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedArtist {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// What the user had selected when generation was triggered.
///
/// Each variant carries only its own identifying fields; consumers must
/// match on the tag and never assume another variant's fields exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "items", rename_all = "lowercase")]
pub enum SelectionContext {
    Song(SelectedSong),
    Songs(Vec<SelectedSong>),
    Album(SelectedAlbum),
    Albums(Vec<SelectedAlbum>),
    Artist(SelectedArtist),
    Artists(Vec<SelectedArtist>),
    Unknown,
}

impl SelectionContext {
    /// The variant tag, for logging and context descriptions.
    pub fn tag(&self) -> &'static str {
        match self {
            SelectionContext::Song(_) => "song",
            SelectionContext::Songs(_) => "songs",
            SelectionContext::Album(_) => "album",
            SelectionContext::Albums(_) => "albums",
            SelectionContext::Artist(_) => "artist",
            SelectionContext::Artists(_) => "artists",
            SelectionContext::Unknown => "unknown",
        }
    }
}

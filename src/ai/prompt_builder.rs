// Prompt compilation for playlist generation
//
// Turns a selection context and a candidate set into one prompt string:
// a context description, a target-size instruction, summary statistics,
// and the candidates grouped by album so artist/album/year are not
// repeated per track. Pure string assembly, no I/O.

use std::collections::{HashMap, HashSet};

use crate::context::SelectionContext;
use crate::model::Track;

/// How many of a multi-selection's items are named in the description.
const LISTED_ITEM_LIMIT: usize = 5;

/// Artists named in the overview's top-artists line.
const TOP_ARTIST_COUNT: usize = 20;

/// A compiled prompt, ready for the generation call.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
}

/// Compile the prompt for one generation request.
pub fn compile(context: &SelectionContext, candidates: &[Track]) -> Prompt {
    let (context_description, base_prompt) = context_lines(context);

    // Group by (artist, album, year) in first-seen order. The grouping is
    // a token-economy measure only; it has no effect on relevance.
    let mut index: HashMap<(&str, &str, Option<i32>), usize> = HashMap::new();
    let mut groups: Vec<(&Track, Vec<&Track>)> = Vec::new();
    for track in candidates {
        let key = (track.artist.as_str(), track.album.as_str(), track.year);
        if let Some(&i) = index.get(&key) {
            groups[i].1.push(track);
        } else {
            index.insert(key, groups.len());
            groups.push((track, vec![track]));
        }
    }

    let database: Vec<String> = groups
        .iter()
        .map(|(first, tracks)| {
            let year = first
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let songs: Vec<String> = tracks
                .iter()
                .map(|t| format!("{}:{}", t.id, t.title))
                .collect();
            format!("{}::{}::{}::{}", first.artist, first.album, year, songs.join("|"))
        })
        .collect();
    let compact_database = database.join("\n");

    // Library overview: orientation for the model without listing the
    // whole library twice.
    let total = candidates.len();
    let artist_count = candidates
        .iter()
        .map(|t| t.artist.as_str())
        .collect::<HashSet<_>>()
        .len();
    let album_count = groups.len();
    let min_year = candidates
        .iter()
        .map(|t| t.year.unwrap_or(9999))
        .min()
        .unwrap_or(9999);
    let max_year = candidates
        .iter()
        .map(|t| t.year.unwrap_or(0))
        .max()
        .unwrap_or(0);

    let mut artist_counts: HashMap<&str, usize> = HashMap::new();
    for track in candidates {
        *artist_counts.entry(track.artist.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, usize)> = artist_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_artists = ranked
        .iter()
        .take(TOP_ARTIST_COUNT)
        .map(|(artist, count)| format!("{} ({} songs)", artist, count))
        .collect::<Vec<_>>()
        .join(", ");

    let text = format!(
        "{context_description}\n\
         \n\
         {base_prompt}\n\
         \n\
         LIBRARY OVERVIEW:\n\
         - Total songs: {total}\n\
         - Total artists: {artist_count}\n\
         - Total albums: {album_count}\n\
         - Year range: {min_year} - {max_year}\n\
         - Top artists: {top_artists}\n\
         \n\
         SONG DATABASE (grouped by album to save space):\n\
         Format: Artist::Album::Year::SongID1:Title1|SongID2:Title2|...\n\
         \n\
         {compact_database}\n\
         \n\
         Please analyze the library and return a JSON array containing ONLY the song IDs for the playlist. Format:\n\
         [\"song-id-1\", \"song-id-2\", \"song-id-3\", ...]\n\
         \n\
         Return ONLY the JSON array, no additional text or explanation."
    );

    Prompt { text }
}

/// The context description and size instruction for each tag. Target
/// sizes scale with context breadth and are always capped at 200.
fn context_lines(context: &SelectionContext) -> (String, String) {
    match context {
        SelectionContext::Song(song) => (
            format!(
                "User selected a single song: \"{}\" by {} from the album \"{}\".",
                song.title, song.artist, song.album
            ),
            "Create a playlist of 30-50 songs that would go well with this song. \
             Consider similar genre, mood, era, and artist style. Maximum 200 songs."
                .to_string(),
        ),

        SelectionContext::Songs(items) => {
            let listed: Vec<String> = items
                .iter()
                .take(LISTED_ITEM_LIMIT)
                .map(|s| format!("\"{}\" by {}", s.title, s.artist))
                .collect();
            (
                format!(
                    "User selected {} songs: {}{}.",
                    items.len(),
                    listed.join(", "),
                    and_more(items.len())
                ),
                "Create a playlist of 50-100 songs that complement these selected songs. \
                 Analyze the common themes, genres, and moods. Maximum 200 songs."
                    .to_string(),
            )
        }

        SelectionContext::Album(album) => {
            let by_artist = album
                .artist
                .as_ref()
                .map(|a| format!(" by {}", a))
                .unwrap_or_default();
            (
                format!("User selected an album: \"{}\"{}.", album.name, by_artist),
                "Create a playlist of 50-100 songs that would appeal to someone who enjoys \
                 this album. Include similar artists and complementary styles. Maximum 200 songs."
                    .to_string(),
            )
        }

        SelectionContext::Albums(items) => {
            let listed: Vec<String> = items
                .iter()
                .take(LISTED_ITEM_LIMIT)
                .map(|a| format!("\"{}\"", a.name))
                .collect();
            (
                format!(
                    "User selected {} albums: {}{}.",
                    items.len(),
                    listed.join(", "),
                    and_more(items.len())
                ),
                "Create a playlist of 100-150 songs that would appeal to fans of these albums. \
                 Find common themes and complementary music. Maximum 200 songs."
                    .to_string(),
            )
        }

        SelectionContext::Artist(artist) => (
            format!("User selected an artist: {}.", artist.name),
            "Create a playlist of 100-150 songs for fans of this artist. Include their best \
             work and similar artists with comparable style. Maximum 200 songs."
                .to_string(),
        ),

        SelectionContext::Artists(items) => {
            let listed: Vec<String> = items
                .iter()
                .take(LISTED_ITEM_LIMIT)
                .map(|a| a.name.clone())
                .collect();
            (
                format!(
                    "User selected {} artists: {}{}.",
                    items.len(),
                    listed.join(", "),
                    and_more(items.len())
                ),
                "Create a playlist of 100-150 songs for fans of these artists. Include their \
                 best work and find common musical themes. Maximum 200 songs."
                    .to_string(),
            )
        }

        SelectionContext::Unknown => (
            "User wants a general playlist recommendation.".to_string(),
            "Create a diverse playlist of 50-100 songs showcasing variety from the music \
             library. Maximum 200 songs."
                .to_string(),
        ),
    }
}

fn and_more(item_count: usize) -> &'static str {
    if item_count > LISTED_ITEM_LIMIT {
        ", and more"
    } else {
        ""
    }
}

// Relevance filtering for the model's context budget
//
// Cuts a synchronized catalog down to a bounded candidate set using
// rule-based heuristics keyed on the selection context. Filtering exists
// only to fit a context window: a catalog already within budget is passed
// through untouched, and narrow rule results are topped up with a random
// slice of the rest of the library so the model always sees a reasonably
// large sample.

use std::collections::HashSet;

use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::context::SelectionContext;
use crate::model::{Catalog, Track};

/// Hard cap on candidate-set size.
pub const CANDIDATE_BUDGET: usize = 8000;

/// Year distance still considered "same era" for single-song contexts.
const YEAR_WINDOW: i32 = 10;

/// Select the candidate tracks for one generation request.
///
/// Deterministic except for the sampling steps; repeated calls with the
/// same inputs may return different contents, but the size bound and
/// id-uniqueness always hold.
pub fn select_candidates(context: &SelectionContext, catalog: &Catalog) -> Vec<Track> {
    if catalog.tracks.len() <= CANDIDATE_BUDGET {
        return catalog.tracks.clone();
    }

    let mut candidates = rule_candidates(context, catalog);
    let mut rng = thread_rng();

    if candidates.len() > CANDIDATE_BUDGET {
        // Uniform down-sample; order after this point carries no meaning.
        candidates.shuffle(&mut rng);
        candidates.truncate(CANDIDATE_BUDGET);
    } else if candidates.len() < CANDIDATE_BUDGET {
        top_up(&mut candidates, catalog, &mut rng);
    }

    tracing::debug!(
        tag = context.tag(),
        candidates = candidates.len(),
        "candidate set selected"
    );
    candidates
}

/// Context-rule selection, before any size bounding.
fn rule_candidates(context: &SelectionContext, catalog: &Catalog) -> Vec<Track> {
    match context {
        SelectionContext::Song(song) => {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut out = Vec::new();
            for track in &catalog.tracks {
                let same_artist = track.artist == song.artist;
                let same_era = match (song.year, track.year) {
                    (Some(selected), Some(candidate)) => {
                        (candidate - selected).abs() <= YEAR_WINDOW
                    }
                    _ => false,
                };
                if (same_artist || same_era) && seen.insert(track.id.as_str()) {
                    out.push(track.clone());
                }
            }
            out
        }

        SelectionContext::Songs(items) => {
            let artists: HashSet<&str> = items.iter().map(|s| s.artist.as_str()).collect();
            by_artists(catalog, &artists)
        }

        SelectionContext::Album(album) => match album.artist.as_deref() {
            Some(artist) => by_artists(catalog, &HashSet::from([artist])),
            // No resolvable artist: fall back to the whole catalog and let
            // sampling bound the size.
            None => catalog.tracks.clone(),
        },

        SelectionContext::Albums(items) => {
            let artists: HashSet<&str> = items.iter().filter_map(|a| a.artist.as_deref()).collect();
            if artists.is_empty() {
                catalog.tracks.clone()
            } else {
                by_artists(catalog, &artists)
            }
        }

        SelectionContext::Artist(artist) => by_artists(catalog, &HashSet::from([artist.name.as_str()])),

        SelectionContext::Artists(items) => {
            let artists: HashSet<&str> = items.iter().map(|a| a.name.as_str()).collect();
            by_artists(catalog, &artists)
        }

        SelectionContext::Unknown => Vec::new(),
    }
}

fn by_artists(catalog: &Catalog, artists: &HashSet<&str>) -> Vec<Track> {
    catalog
        .tracks
        .iter()
        .filter(|t| artists.contains(t.artist.as_str()))
        .cloned()
        .collect()
}

/// Top up with a uniform sample from the rest of the catalog, excluding
/// ids already present, until the budget is reached or the catalog is
/// exhausted.
fn top_up(candidates: &mut Vec<Track>, catalog: &Catalog, rng: &mut ThreadRng) {
    let present: HashSet<&str> = candidates.iter().map(|t| t.id.as_str()).collect();
    let mut remainder: Vec<&Track> = catalog
        .tracks
        .iter()
        .filter(|t| !present.contains(t.id.as_str()))
        .collect();
    remainder.shuffle(rng);

    let needed = CANDIDATE_BUDGET - candidates.len();
    let fill: Vec<Track> = remainder.into_iter().take(needed).cloned().collect();
    candidates.extend(fill);
}

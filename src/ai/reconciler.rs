// Reply reconciliation
//
// Maps the model's free-form reply back onto catalog tracks. The reply is
// supposed to be a bare JSON array of ids, but models wrap output in prose
// or fences often enough that only the widest [...] span is considered.
// Ids unknown to the catalog are dropped silently; output order is the
// model's order with dropped ids simply absent.

use serde_json::Value;

use crate::error::Error;
use crate::model::{Catalog, Playlist};

/// Reconcile a raw model reply against the full catalog.
///
/// The lookup deliberately uses the whole catalog, not the candidate set:
/// the model may reference any id it was shown.
pub fn reconcile(raw_reply: &str, catalog: &Catalog) -> Result<Playlist, Error> {
    let span = extract_id_array(raw_reply)?;
    let values: Vec<Value> =
        serde_json::from_str(span).map_err(|e| Error::Parse(format!("invalid id array: {}", e)))?;

    let index = catalog.track_index();
    let mut tracks = Vec::new();
    let mut dropped = 0usize;

    for value in &values {
        let id = match value {
            Value::String(s) => s.clone(),
            // Some models return numeric ids unquoted.
            Value::Number(n) => n.to_string(),
            _ => {
                dropped += 1;
                continue;
            }
        };
        match index.get(id.as_str()) {
            Some(track) => tracks.push((*track).clone()),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(
            kept = tracks.len(),
            dropped,
            "dropped reply ids not present in the catalog"
        );
    }

    Ok(Playlist { tracks })
}

/// The widest bracketed span: first '[' to last ']'.
fn extract_id_array(reply: &str) -> Result<&str, Error> {
    match (reply.find('['), reply.rfind(']')) {
        (Some(start), Some(end)) if start < end => Ok(&reply[start..=end]),
        _ => Err(Error::Parse("no id array found in reply".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Track;

    fn catalog_with(ids: &[&str]) -> Catalog {
        let tracks = ids
            .iter()
            .map(|id| Track {
                id: id.to_string(),
                title: format!("Title {}", id),
                artist: "Artist".to_string(),
                album: "Album".to_string(),
                year: Some(2001),
                duration: Some(180),
            })
            .collect();
        Catalog {
            artists: vec![],
            albums: vec![],
            tracks,
        }
    }

    #[test]
    fn test_unknown_ids_are_dropped_order_preserved() {
        let catalog = catalog_with(&["a", "b"]);
        let playlist = reconcile(r#"["a","b","z"]"#, &catalog).unwrap();

        let ids: Vec<&str> = playlist.tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_playlist_order_is_reply_order() {
        let catalog = catalog_with(&["a", "b", "c"]);
        let playlist = reconcile(r#"["c","a"]"#, &catalog).unwrap();

        let ids: Vec<&str> = playlist.tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_prose_around_the_array_is_tolerated() {
        let catalog = catalog_with(&["a", "b"]);
        let reply = "Here is your playlist:\n```json\n[\"b\", \"a\"]\n```\nEnjoy!";
        let playlist = reconcile(reply, &catalog).unwrap();

        let ids: Vec<&str> = playlist.tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_numeric_ids_are_coerced() {
        let catalog = catalog_with(&["17", "42"]);
        let playlist = reconcile("[17, 42, true]", &catalog).unwrap();

        let ids: Vec<&str> = playlist.tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["17", "42"]);
    }

    #[test]
    fn test_missing_span_is_a_parse_error() {
        let catalog = catalog_with(&["a"]);
        let result = reconcile("Sorry, I cannot build a playlist today.", &catalog);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_invalid_json_in_span_is_a_parse_error() {
        let catalog = catalog_with(&["a"]);
        let result = reconcile("[not json at all]", &catalog);
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}

// Playlist generation pipeline
//
// Wires the stages together: catalog sync → relevance filtering → prompt
// compilation → generation call → reply reconciliation. A pipeline value
// is a short-lived session owned by the caller; every run builds its own
// catalog snapshot and nothing is shared between concurrent runs.

use thiserror::Error;

use crate::ai::{self, OpenAiClient};
use crate::context::SelectionContext;
use crate::error;
use crate::model::Playlist;
use crate::subsonic::{ServerCredentials, SubsonicClient};

/// A stage-labelled pipeline failure. Filtering and compilation are pure
/// and cannot fail; the fallible stages are the two network calls and the
/// reply reconciliation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("catalog sync failed: {0}")]
    Sync(#[source] error::Error),

    #[error("playlist generation failed: {0}")]
    Generation(#[source] error::Error),

    /// The generation call itself succeeded, but its reply contained no
    /// usable id array.
    #[error("response reconciliation failed: {0}")]
    Reconciliation(#[source] error::Error),
}

pub struct PlaylistPipeline {
    subsonic: SubsonicClient,
    openai: OpenAiClient,
}

impl PlaylistPipeline {
    /// Build a pipeline from server credentials and a decrypted API key,
    /// both supplied by the caller's credential store.
    pub fn new(
        credentials: ServerCredentials,
        api_key: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let subsonic = SubsonicClient::new(credentials).map_err(PipelineError::Sync)?;
        let openai = OpenAiClient::new(api_key).map_err(PipelineError::Generation)?;
        Ok(PlaylistPipeline { subsonic, openai })
    }

    /// Build a pipeline from preconfigured clients, e.g. with a gateway
    /// endpoint override.
    pub fn with_clients(subsonic: SubsonicClient, openai: OpenAiClient) -> Self {
        PlaylistPipeline { subsonic, openai }
    }

    /// Run one full generation flow for the given selection context.
    pub async fn run(&self, context: &SelectionContext) -> Result<Playlist, PipelineError> {
        tracing::info!(tag = context.tag(), "starting playlist generation");

        let catalog = self
            .subsonic
            .fetch_catalog()
            .await
            .map_err(PipelineError::Sync)?;

        let candidates = ai::select_candidates(context, &catalog);
        let prompt = ai::compile(context, &candidates);
        tracing::debug!(
            candidates = candidates.len(),
            prompt_chars = prompt.text.len(),
            "prompt compiled"
        );

        let reply = self
            .openai
            .generate(&prompt)
            .await
            .map_err(PipelineError::Generation)?;

        let playlist = ai::reconcile(&reply, &catalog).map_err(PipelineError::Reconciliation)?;
        tracing::info!(tracks = playlist.len(), "playlist generated");
        Ok(playlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SelectedArtist;
    use axum::extract::Query;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    // A tiny simulated server pair: a two-album Subsonic library and a
    // chat endpoint that always answers with a fixed reply.

    async fn artists_handler() -> Json<serde_json::Value> {
        Json(json!({
            "subsonic-response": {
                "status": "ok",
                "artists": { "index": [ { "name": "M", "artist": [
                    { "id": "ar-1", "name": "Mock Artist", "albumCount": 2 }
                ] } ] }
            }
        }))
    }

    async fn albums_handler(
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        let offset: usize = params
            .get("offset")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let albums = if offset == 0 {
            vec![
                json!({ "id": "al-0", "name": "First", "artist": "Mock Artist", "year": 1999 }),
                json!({ "id": "al-1", "name": "Second", "artist": "Mock Artist", "year": 2004 }),
            ]
        } else {
            vec![]
        };
        Json(json!({
            "subsonic-response": { "status": "ok", "albumList2": { "album": albums } }
        }))
    }

    async fn album_handler(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        let id = params.get("id").cloned().unwrap_or_default();
        let songs: Vec<_> = (0..2)
            .map(|i| {
                json!({
                    "id": format!("{}-s{}", id, i),
                    "title": format!("Song {}", i),
                    "artist": "Mock Artist",
                    "album": id.clone(),
                    "year": 2000,
                    "duration": 180,
                })
            })
            .collect();
        Json(json!({
            "subsonic-response": { "status": "ok", "album": { "song": songs } }
        }))
    }

    async fn chat_handler() -> Json<serde_json::Value> {
        let reply = "Here you go:\n[\"al-1-s1\", \"al-0-s0\", \"missing\"]";
        Json(json!({
            "choices": [ { "message": { "role": "assistant", "content": reply } } ],
            "usage": { "prompt_tokens": 40, "completion_tokens": 12, "total_tokens": 52 }
        }))
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_full_flow_yields_reply_ordered_playlist() {
        let library = Router::new()
            .route("/rest/getArtists.view", get(artists_handler))
            .route("/rest/getAlbumList2.view", get(albums_handler))
            .route("/rest/getAlbum.view", get(album_handler));
        let chat = Router::new().route("/v1/chat/completions", post(chat_handler));

        let library_base = spawn(library).await;
        let chat_base = spawn(chat).await;

        let subsonic = SubsonicClient::new(ServerCredentials::new(
            library_base.as_str(),
            "u=demo&p=demo",
            "demo",
        ))
        .unwrap();
        let openai = OpenAiClient::with_endpoint(
            "sk-test",
            format!("{}/v1/chat/completions", chat_base),
        )
        .unwrap();

        let pipeline = PlaylistPipeline::with_clients(subsonic, openai);
        let context = SelectionContext::Artist(SelectedArtist {
            name: "Mock Artist".to_string(),
            id: Some("ar-1".to_string()),
        });

        let playlist = pipeline.run(&context).await.unwrap();
        let ids: Vec<&str> = playlist.tracks.iter().map(|t| t.id.as_str()).collect();

        // Reply order, unknown id dropped.
        assert_eq!(ids, vec!["al-1-s1", "al-0-s0"]);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_in_sync_stage() {
        let subsonic = SubsonicClient::new(ServerCredentials::new(
            // Nothing listens here.
            "http://127.0.0.1:9",
            "u=demo&p=demo",
            "demo",
        ))
        .unwrap();
        let openai = OpenAiClient::with_endpoint("sk-test", "http://127.0.0.1:9").unwrap();

        let pipeline = PlaylistPipeline::with_clients(subsonic, openai);
        let result = pipeline.run(&SelectionContext::Unknown).await;

        assert!(matches!(result, Err(PipelineError::Sync(_))));
    }
}

// Subsonic catalog client
//
// Synchronizes the full remote library in three passes:
// - one artist index call, flattened across the per-letter groups
// - album pages of 500, fetched sequentially until a short or empty page
// - per-album track fetches, up to 500 requests in flight per window
//
// A failing album contributes zero tracks instead of aborting the sync;
// auth and protocol failures on the index or the album listing abort it.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{Album, Artist, Catalog, Track};

const API_VERSION: &str = "1.13.0";
const CLIENT_NAME: &str = "mixtape";
const ALBUM_PAGE_SIZE: usize = 500;
const TRACK_FETCH_WINDOW: usize = 500;

/// Connection details for one server, supplied decrypted by the credential
/// collaborator. `auth_query` is the ready-made auth fragment, either
/// `u=<user>&p=<pass>` or `u=<user>&t=<token>&s=<salt>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCredentials {
    pub base_url: String,
    pub auth_query: String,
    pub username: String,
}

impl ServerCredentials {
    /// Build credentials, trimming any trailing slashes off the base URL.
    pub fn new(
        base_url: impl Into<String>,
        auth_query: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        ServerCredentials {
            base_url,
            auth_query: auth_query.into(),
            username: username.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.base_url.trim().is_empty()
            && !self.auth_query.trim().is_empty()
            && !self.username.trim().is_empty()
    }
}

// ---- Response envelope ----
// Every reply is wrapped in a "subsonic-response" object. Missing nested
// fields mean "empty", never an error; only an explicit failed status or
// an undecodable body is a protocol problem.

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "subsonic-response")]
    body: ResponseBody,
}

fn ok_status() -> String {
    "ok".to_string()
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default = "ok_status")]
    status: String,
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default)]
    artists: Option<ArtistIndexes>,
    #[serde(rename = "albumList2", default)]
    album_list: Option<AlbumList>,
    #[serde(default)]
    album: Option<AlbumDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ArtistIndexes {
    #[serde(default)]
    index: Vec<ArtistIndexGroup>,
}

/// One per-letter group of the artist index.
#[derive(Debug, Deserialize)]
struct ArtistIndexGroup {
    #[serde(default)]
    artist: Vec<ArtistEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtistEntry {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "albumCount", default)]
    album_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AlbumList {
    #[serde(default)]
    album: Vec<AlbumListEntry>,
}

#[derive(Debug, Deserialize)]
struct AlbumListEntry {
    id: String,
    // Servers disagree on the field name for the album title.
    #[serde(default, alias = "title")]
    name: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct AlbumDetail {
    #[serde(default)]
    song: Vec<SongEntry>,
}

#[derive(Debug, Deserialize)]
struct SongEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    duration: Option<u32>,
}

fn or_unknown(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

impl From<ArtistEntry> for Artist {
    fn from(entry: ArtistEntry) -> Self {
        Artist {
            id: entry.id,
            name: or_unknown(entry.name, "Unknown Artist"),
            album_count: entry.album_count,
        }
    }
}

impl From<AlbumListEntry> for Album {
    fn from(entry: AlbumListEntry) -> Self {
        Album {
            id: entry.id,
            name: or_unknown(entry.name, "Unknown Album"),
            artist: or_unknown(entry.artist, "Unknown Artist"),
            year: entry.year,
        }
    }
}

impl From<SongEntry> for Track {
    fn from(entry: SongEntry) -> Self {
        Track {
            id: entry.id,
            title: or_unknown(entry.title, "Unknown Title"),
            artist: or_unknown(entry.artist, "Unknown Artist"),
            album: or_unknown(entry.album, "Unknown Album"),
            year: entry.year,
            duration: entry.duration,
        }
    }
}

/// Client for one Subsonic-compatible server.
pub struct SubsonicClient {
    http: reqwest::Client,
    credentials: ServerCredentials,
}

impl SubsonicClient {
    /// Create a client for the given server. Fails with an auth error when
    /// any credential component is missing.
    pub fn new(credentials: ServerCredentials) -> Result<Self, Error> {
        if !credentials.is_complete() {
            return Err(Error::Auth("missing server credentials".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(SubsonicClient { http, credentials })
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/rest/{}.view?{}&v={}&c={}&f=json",
            self.credentials.base_url, method, self.credentials.auth_query, API_VERSION, CLIENT_NAME
        )
    }

    async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<ResponseBody, Error> {
        let response = self
            .http
            .get(self.api_url(method))
            .query(params)
            .send()
            .await
            .map_err(|e| Error::Network(format!("{}: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("{}: server returned HTTP {}", method, status)));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| Error::Protocol(format!("{}: {}", method, e)))?;

        let body = envelope.body;
        if body.status != "ok" {
            let (code, message) = body
                .error
                .map(|e| (e.code, e.message))
                .unwrap_or((0, "server reported failure".to_string()));
            // Codes 40/41 are credential rejections, 50 is "not authorized".
            return Err(match code {
                40 | 41 | 50 => Error::Auth(format!("{}: {} (code {})", method, message, code)),
                _ => Error::Protocol(format!("{}: {} (code {})", method, message, code)),
            });
        }

        Ok(body)
    }

    /// Probe the connection without touching the library.
    pub async fn ping(&self) -> Result<(), Error> {
        self.call("ping", &[]).await.map(|_| ())
    }

    /// Synchronize the whole library into an immutable snapshot.
    ///
    /// An empty artist index yields an empty catalog, not an error.
    pub async fn fetch_catalog(&self) -> Result<Catalog, Error> {
        let started = Instant::now();
        tracing::info!(server = %self.credentials.base_url, "starting catalog sync");

        let artists = self.fetch_artists().await?;
        if artists.is_empty() {
            tracing::warn!("artist index is empty, returning empty catalog");
            return Ok(Catalog::default());
        }

        let albums = self.fetch_albums().await?;

        // The index's album counts are diagnostic only and never validate
        // the paginated listing.
        let indexed_albums: u32 = artists.iter().filter_map(|a| a.album_count).sum();
        if indexed_albums as usize != albums.len() {
            tracing::debug!(
                indexed = indexed_albums,
                listed = albums.len(),
                "artist index and album listing disagree on album count"
            );
        }

        let tracks = self.fetch_tracks(&albums).await;

        let elapsed_s = started.elapsed().as_secs_f64();
        tracing::info!(
            artists = artists.len(),
            albums = albums.len(),
            tracks = tracks.len(),
            elapsed_s,
            "catalog sync complete"
        );

        Ok(Catalog { artists, albums, tracks })
    }

    /// Fetch the artist index and flatten its per-letter groups.
    async fn fetch_artists(&self) -> Result<Vec<Artist>, Error> {
        let body = self.call("getArtists", &[]).await?;
        let groups = body.artists.map(|a| a.index).unwrap_or_default();
        Ok(groups
            .into_iter()
            .flat_map(|group| group.artist)
            .map(Artist::from)
            .collect())
    }

    /// Fetch all albums in sequential pages of `ALBUM_PAGE_SIZE`.
    ///
    /// The offset advances by the number of records actually returned.
    /// Stops on an empty page or a short page, whichever comes first — a
    /// short final page is never followed by an empty confirmation call.
    async fn fetch_albums(&self) -> Result<Vec<Album>, Error> {
        let mut albums: Vec<Album> = Vec::new();
        let mut offset = 0usize;

        loop {
            let body = self
                .call(
                    "getAlbumList2",
                    &[
                        ("type", "alphabeticalByName".to_string()),
                        ("size", ALBUM_PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;

            let page = body.album_list.map(|l| l.album).unwrap_or_default();
            if page.is_empty() {
                break;
            }

            offset += page.len();
            let last_page = page.len() < ALBUM_PAGE_SIZE;
            albums.extend(page.into_iter().map(Album::from));
            tracing::debug!(fetched = offset, "album page received");

            if last_page {
                break;
            }
        }

        Ok(albums)
    }

    /// Fetch tracks for every album, `TRACK_FETCH_WINDOW` requests in
    /// flight at a time. Each window is awaited in full before the next
    /// starts; results are appended in album-submission order, so the
    /// final track order does not depend on completion timing.
    async fn fetch_tracks(&self, albums: &[Album]) -> Vec<Track> {
        let mut tracks: Vec<Track> = Vec::new();
        let mut processed = 0usize;

        for window in albums.chunks(TRACK_FETCH_WINDOW) {
            let requests = window.iter().map(|album| self.fetch_album_tracks(&album.id));
            let results = futures::future::join_all(requests).await;

            for (album, result) in window.iter().zip(results) {
                match result {
                    Ok(mut album_tracks) => tracks.append(&mut album_tracks),
                    Err(error) => tracing::warn!(
                        album_id = %album.id,
                        %error,
                        "album track fetch failed, contributing zero tracks"
                    ),
                }
            }

            processed += window.len();
            tracing::debug!(
                processed,
                total = albums.len(),
                tracks = tracks.len(),
                "track fetch window complete"
            );
        }

        tracks
    }

    async fn fetch_album_tracks(&self, album_id: &str) -> Result<Vec<Track>, Error> {
        let body = self.call("getAlbum", &[("id", album_id.to_string())]).await?;
        let songs = body.album.map(|a| a.song).unwrap_or_default();
        Ok(songs.into_iter().map(Track::from).collect())
    }
}

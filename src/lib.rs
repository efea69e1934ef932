// AI playlist generation core for Subsonic-compatible music servers
//
// The pipeline: catalog sync → relevance filtering → prompt compilation →
// generation call → reply reconciliation. UI, secret storage, and
// selection detection live in external collaborators; this crate consumes
// a SelectionContext plus decrypted credentials and produces a Playlist.

// Modules
pub mod ai;
pub mod context;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod subsonic;

pub use ai::OpenAiClient;
pub use context::{SelectedAlbum, SelectedArtist, SelectedSong, SelectionContext};
pub use error::Error;
pub use model::{Album, Artist, Catalog, Playlist, Track};
pub use pipeline::{PipelineError, PlaylistPipeline};
pub use subsonic::{ServerCredentials, SubsonicClient};

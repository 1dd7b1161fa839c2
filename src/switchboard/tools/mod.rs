//! Service adapters used by the built-in agents.
//!
//! Each adapter sits behind a small trait so agents can be exercised against mocks:
//!
//! - [`open_meteo`]: [`Geocoder`] and [`ForecastService`] over the Open-Meteo APIs
//! - [`search`]: [`SearchService`] over Perplexity
//! - [`notes_store`]: [`NoteStore`] over HTTP or in memory
//! - [`filesystem`]: [`DirectoryLister`] over the local disk or HTTP
//! - [`http_client`]: the JSON client the HTTP-backed adapters share

pub mod filesystem;
pub mod http_client;
pub mod notes_store;
pub mod open_meteo;
pub mod search;

pub use filesystem::{DirectoryLister, FileSystemError, HttpDirectoryLister, LocalDirectoryLister};
pub use http_client::{HttpClient, HttpClientError, HttpResponse};
pub use notes_store::{HttpNoteStore, InMemoryNoteStore, Note, NoteStore};
pub use open_meteo::{CurrentWeather, ForecastService, GeoPlace, Geocoder, OpenMeteo};
pub use search::{PerplexitySearch, SearchAnswer, SearchService};

//! The built-in agents.
//!
//! | name             | input                                   | output                      |
//! |------------------|-----------------------------------------|-----------------------------|
//! | `conversational` | `{text, context}`                       | reply text                  |
//! | `weather`        | `{location?, unit, latitude?, longitude?}` | `{location, temperature, unit, conditions}` |
//! | `research`       | `{query}`                               | `{searchResult, sources}`   |
//! | `filesystem`     | `{action: "list", path}`                | `[{name, isFile, isDirectory}]` |
//! | `notes`          | `{action: "list"}` or `{action: "create", title?, content}` | message text |
//!
//! Every agent receives its external services through its constructor, so each can be tested
//! in isolation. [`register_default_agents`] wires all five to the HTTP-backed services named by
//! a [`SwitchboardConfig`].

pub mod conversational;
pub mod filesystem;
pub mod notes;
pub mod research;
pub mod weather;

use std::sync::Arc;

use crate::switchboard::clients::openai::OpenAIClient;
use crate::switchboard::config::SwitchboardConfig;
use crate::switchboard::registry::AgentRegistry;
use crate::switchboard::tools::filesystem::HttpDirectoryLister;
use crate::switchboard::tools::notes_store::HttpNoteStore;
use crate::switchboard::tools::open_meteo::OpenMeteo;
use crate::switchboard::tools::search::PerplexitySearch;

pub use conversational::ConversationalAgent;
pub use filesystem::FilesystemAgent;
pub use notes::NotesAgent;
pub use research::ResearchAgent;
pub use weather::WeatherAgent;

/// Register the five built-in agents, backed by the services in `config`.
pub fn register_default_agents(registry: &AgentRegistry, config: &SwitchboardConfig) {
    let timeout = config.request_timeout;

    let chat = OpenAIClient::new_with_model_string(
        config.openai_api_key.as_deref().unwrap_or_default(),
        &config.chat_model,
    )
    .with_timeout(timeout);
    if config.openai_api_key.is_none() {
        log::warn!("OPENAI_API_KEY is not set; the conversational agent will fail to authenticate");
    }
    registry.register(Arc::new(ConversationalAgent::new(Arc::new(chat))));

    let open_meteo = Arc::new(OpenMeteo::new().with_timeout(timeout));
    registry.register(Arc::new(
        WeatherAgent::new(open_meteo.clone(), open_meteo).with_cache_ttl(config.weather_cache_ttl),
    ));

    let search = PerplexitySearch::new(config.perplexity_api_key.clone(), &config.search_model)
        .with_timeout(timeout);
    registry.register(Arc::new(ResearchAgent::new(Arc::new(search))));

    let lister = HttpDirectoryLister::new(&config.fs_base_url).with_timeout(timeout);
    registry.register(Arc::new(FilesystemAgent::new(Arc::new(lister))));

    let store = HttpNoteStore::new(&config.notes_base_url).with_timeout(timeout);
    registry.register(Arc::new(NotesAgent::new(Arc::new(store))));
}

use async_trait::async_trait;
use serde_json::json;
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use switchboard::agent::{
    Agent, AgentError, AgentOutput, DirectoryEntry, SearchReport, TemperatureUnit,
    WeatherReport,
};
use switchboard::agents::conversational::ConversationalAgent;
use switchboard::agents::filesystem::FilesystemAgent;
use switchboard::agents::notes::{NotesAgent, NO_NOTES};
use switchboard::agents::research::{ResearchAgent, NO_RESULT};
use switchboard::agents::weather::WeatherAgent;
use switchboard::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use switchboard::tools::{
    CurrentWeather, ForecastService, GeoPlace, Geocoder, InMemoryNoteStore, LocalDirectoryLister,
    Note, NoteStore, SearchAnswer, SearchService,
};
use tempfile::TempDir;

fn assert_output_conforms(agent: &dyn Agent, output: &AgentOutput) {
    let encoded = agent.encode_output(output);
    if let Err(violations) = agent.output_schema().validate(&encoded) {
        panic!("{} output {} violates its schema: {:?}", agent.name(), encoded, violations);
    }
}

// ---------------------------------------------------------------------------
// weather

struct MockGeocoder {
    place: Option<GeoPlace>,
    queries: Mutex<Vec<String>>,
}

impl MockGeocoder {
    fn returning(place: Option<GeoPlace>) -> Self {
        Self {
            place,
            queries: Mutex::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, name: &str) -> Result<Option<GeoPlace>, AgentError> {
        self.queries.lock().unwrap().push(name.to_string());
        Ok(self.place.clone())
    }
}

struct MockForecast {
    temperature: f64,
    code: i64,
    calls: AtomicUsize,
}

impl MockForecast {
    fn new(temperature: f64, code: i64) -> Self {
        Self {
            temperature,
            code,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastService for MockForecast {
    async fn current_weather(
        &self,
        _latitude: f64,
        _longitude: f64,
        _unit: TemperatureUnit,
    ) -> Result<CurrentWeather, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CurrentWeather {
            temperature: self.temperature,
            weathercode: self.code,
            windspeed: None,
            winddirection: None,
            time: None,
        })
    }
}

fn paris() -> GeoPlace {
    GeoPlace {
        latitude: 48.8566,
        longitude: 2.3522,
        name: None,
    }
}

async fn run_weather(agent: &WeatherAgent, args: serde_json::Value) -> Result<AgentOutput, AgentError> {
    let input = agent.decode_input(&args).expect("valid weather args");
    agent.execute(input).await
}

#[tokio::test]
async fn test_weather_by_location() {
    let geocoder = Arc::new(MockGeocoder::returning(Some(paris())));
    let forecast = Arc::new(MockForecast::new(20.0, 0));
    let agent = WeatherAgent::new(geocoder.clone(), forecast.clone());

    let output = run_weather(&agent, json!({ "location": "Paris, France" }))
        .await
        .unwrap();
    assert_eq!(
        output,
        AgentOutput::Weather(WeatherReport {
            location: "Paris, France".into(),
            temperature: 20.0,
            unit: TemperatureUnit::Fahrenheit,
            conditions: "Clear sky".into(),
        })
    );
    // only the part before the comma is geocoded
    assert_eq!(geocoder.queries(), vec!["Paris"]);
    assert_output_conforms(&agent, &output);
    assert_eq!(
        agent.encode_output(&output),
        json!({
            "location": "Paris, France",
            "temperature": 20.0,
            "unit": "fahrenheit",
            "conditions": "Clear sky"
        })
    );
}

#[tokio::test]
async fn test_weather_uses_geocoder_name_when_present() {
    let place = GeoPlace {
        name: Some("Lima".into()),
        ..paris()
    };
    let agent = WeatherAgent::new(
        Arc::new(MockGeocoder::returning(Some(place))),
        Arc::new(MockForecast::new(18.5, 3)),
    );

    let output = run_weather(&agent, json!({ "location": "lima!!", "unit": "celsius" }))
        .await
        .unwrap();
    match output {
        AgentOutput::Weather(report) => {
            assert_eq!(report.location, "Lima");
            assert_eq!(report.unit, TemperatureUnit::Celsius);
            assert_eq!(report.conditions, "Overcast");
        }
        other => panic!("unexpected output {:?}", other),
    }
}

#[tokio::test]
async fn test_weather_by_coordinates_skips_geocoding() {
    let geocoder = Arc::new(MockGeocoder::returning(None));
    let agent = WeatherAgent::new(geocoder.clone(), Arc::new(MockForecast::new(11.0, 99)));

    let output = run_weather(&agent, json!({ "latitude": 48.8566, "longitude": 2.3522 }))
        .await
        .unwrap();
    match output {
        AgentOutput::Weather(report) => {
            assert_eq!(report.location, "Coords: 48.86, 2.35");
            assert_eq!(report.conditions, "Unknown");
        }
        other => panic!("unexpected output {:?}", other),
    }
    assert!(geocoder.queries().is_empty());
}

#[tokio::test]
async fn test_weather_unknown_location() {
    let agent = WeatherAgent::new(
        Arc::new(MockGeocoder::returning(None)),
        Arc::new(MockForecast::new(0.0, 0)),
    );
    let err = run_weather(&agent, json!({ "location": "Atlantis" }))
        .await
        .unwrap_err();
    assert_eq!(err, AgentError::NotFound("Location not found: Atlantis".into()));
}

#[test]
fn test_weather_requires_location_or_coordinates() {
    let agent = WeatherAgent::new(
        Arc::new(MockGeocoder::returning(None)),
        Arc::new(MockForecast::new(0.0, 0)),
    );
    let violations = agent.decode_input(&json!({ "latitude": 1.0 })).unwrap_err();
    assert_eq!(
        violations[0].message,
        "Either location or both latitude and longitude must be provided."
    );
    assert!(agent
        .decode_input(&json!({ "location": "Oslo", "unit": "kelvin" }))
        .is_err());
}

#[tokio::test]
async fn test_weather_cache() {
    let forecast = Arc::new(MockForecast::new(20.0, 0));
    let agent = WeatherAgent::new(Arc::new(MockGeocoder::returning(Some(paris()))), forecast.clone());

    run_weather(&agent, json!({ "location": "Paris" })).await.unwrap();
    run_weather(&agent, json!({ "location": "PARIS" })).await.unwrap();
    assert_eq!(forecast.calls(), 1);

    // a different unit is a different lookup
    run_weather(&agent, json!({ "location": "Paris", "unit": "celsius" }))
        .await
        .unwrap();
    assert_eq!(forecast.calls(), 2);

    agent.clear_cache();
    run_weather(&agent, json!({ "location": "Paris" })).await.unwrap();
    assert_eq!(forecast.calls(), 3);
}

#[tokio::test]
async fn test_weather_cache_disabled() {
    let forecast = Arc::new(MockForecast::new(20.0, 0));
    let agent = WeatherAgent::new(Arc::new(MockGeocoder::returning(Some(paris()))), forecast.clone())
        .with_cache_ttl(Duration::ZERO);

    run_weather(&agent, json!({ "location": "Paris" })).await.unwrap();
    run_weather(&agent, json!({ "location": "Paris" })).await.unwrap();
    assert_eq!(forecast.calls(), 2);
    assert_eq!(agent.cached_entries(), 0);
}

#[tokio::test]
async fn test_weather_cache_drops_expired_reports() {
    let forecast = Arc::new(MockForecast::new(20.0, 0));
    let agent = WeatherAgent::new(Arc::new(MockGeocoder::returning(Some(paris()))), forecast.clone())
        .with_cache_ttl(Duration::from_millis(1));

    for i in 0..200 {
        run_weather(&agent, json!({ "location": format!("Town {}", i) }))
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    run_weather(&agent, json!({ "location": "Paris" })).await.unwrap();
    assert_eq!(agent.cached_entries(), 1);
    assert_eq!(forecast.calls(), 201);

    // an expired entry is not served
    tokio::time::sleep(Duration::from_millis(20)).await;
    run_weather(&agent, json!({ "location": "Paris" })).await.unwrap();
    assert_eq!(forecast.calls(), 202);
}

// ---------------------------------------------------------------------------
// research

struct MockSearch {
    answer: Result<SearchAnswer, AgentError>,
}

#[async_trait]
impl SearchService for MockSearch {
    async fn search(&self, _query: &str) -> Result<SearchAnswer, AgentError> {
        self.answer.clone()
    }
}

fn research_agent(answer: Result<SearchAnswer, AgentError>) -> ResearchAgent {
    ResearchAgent::new(Arc::new(MockSearch { answer }))
}

#[tokio::test]
async fn test_research_collapses_blank_lines() {
    let agent = research_agent(Ok(SearchAnswer {
        content: Some("Alexander Fleming.\n\n\n\nIn 1928.".into()),
        citations: vec!["https://example.org/fleming".into()],
    }));
    let input = agent
        .decode_input(&json!({ "query": "Who discovered penicillin?" }))
        .unwrap();
    let output = agent.execute(input).await.unwrap();
    assert_eq!(
        output,
        AgentOutput::Research(SearchReport {
            search_result: "Alexander Fleming.\n\nIn 1928.".into(),
            sources: vec!["https://example.org/fleming".into()],
        })
    );
    assert_output_conforms(&agent, &output);
}

#[tokio::test]
async fn test_research_without_content() {
    let agent = research_agent(Ok(SearchAnswer::default()));
    let input = agent.decode_input(&json!({ "query": "anything" })).unwrap();
    assert_eq!(
        agent.execute(input).await.unwrap(),
        AgentOutput::Research(SearchReport {
            search_result: NO_RESULT.into(),
            sources: vec![],
        })
    );
}

#[tokio::test]
async fn test_research_missing_key() {
    let agent = research_agent(Err(AgentError::MissingCredential("PERPLEXITY_API_KEY".into())));
    let input = agent.decode_input(&json!({ "query": "anything" })).unwrap();
    let err = agent.execute(input).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing PERPLEXITY_API_KEY environment variable.");
}

// ---------------------------------------------------------------------------
// notes

struct NoIdStore;

#[async_trait]
impl NoteStore for NoIdStore {
    async fn list_notes(&self) -> Result<Vec<Note>, AgentError> {
        Ok(Vec::new())
    }

    async fn create_note(&self, _title: &str, _content: &str) -> Result<Option<String>, AgentError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_notes_list_and_create() {
    let store = Arc::new(InMemoryNoteStore::new());
    let agent = NotesAgent::new(store.clone());

    let list = agent.decode_input(&json!({ "action": "list" })).unwrap();
    assert_eq!(
        agent.execute(list.clone()).await.unwrap(),
        AgentOutput::Notes(NO_NOTES.into())
    );

    let create = agent
        .decode_input(&json!({ "action": "create", "content": "Buy oat milk and bread" }))
        .unwrap();
    assert_eq!(
        agent.execute(create).await.unwrap(),
        AgentOutput::Notes("✅ Note titled \"Buy oat milk and bread\" created successfully.".into())
    );

    let notes = store.list_notes().await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Buy oat milk and bread");
    assert!(!notes[0].id.is_empty());

    let listed = agent.execute(list).await.unwrap();
    assert_output_conforms(&agent, &listed);
    match listed {
        AgentOutput::Notes(text) => {
            assert!(text.starts_with("Here are your notes:\n\n📝 **Buy oat milk and bread**"))
        }
        other => panic!("unexpected output {:?}", other),
    }
}

#[tokio::test]
async fn test_notes_create_without_id_fails() {
    let agent = NotesAgent::new(Arc::new(NoIdStore));
    let create = agent
        .decode_input(&json!({ "action": "create", "title": "Todo", "content": "x" }))
        .unwrap();
    assert_eq!(
        agent.execute(create).await.unwrap_err(),
        AgentError::Service("Failed to create note. API did not return expected ID.".into())
    );
}

#[test]
fn test_notes_rejects_unknown_action() {
    let agent = NotesAgent::new(Arc::new(NoIdStore));
    let violations = agent.decode_input(&json!({ "action": "delete" })).unwrap_err();
    assert_eq!(violations[0].path_string(), "action");
    assert!(agent
        .decode_input(&json!({ "action": "create" }))
        .is_err());
}

// ---------------------------------------------------------------------------
// filesystem

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("README.md"), "# demo").unwrap();
    std::fs::write(dir.path().join("src").join("main.rs"), "fn main() {}").unwrap();
    dir
}

#[tokio::test]
async fn test_filesystem_lists_directory() {
    let dir = workspace();
    let agent = FilesystemAgent::new(Arc::new(LocalDirectoryLister::new(dir.path())));

    let input = agent
        .decode_input(&json!({ "action": "list", "path": "." }))
        .unwrap();
    let output = agent.execute(input).await.unwrap();
    assert_output_conforms(&agent, &output);
    assert_eq!(
        output,
        AgentOutput::Filesystem(vec![
            DirectoryEntry {
                name: "README.md".into(),
                is_file: true,
                is_directory: false,
            },
            DirectoryEntry {
                name: "src".into(),
                is_file: false,
                is_directory: true,
            },
        ])
    );
}

#[tokio::test]
async fn test_filesystem_errors() {
    let dir = workspace();
    let agent = FilesystemAgent::new(Arc::new(LocalDirectoryLister::new(dir.path())));

    let delete = agent
        .decode_input(&json!({ "action": "delete", "path": "src" }))
        .unwrap();
    assert_eq!(
        agent.execute(delete).await.unwrap_err(),
        AgentError::Unsupported("Unsupported action: delete".into())
    );

    let missing = agent
        .decode_input(&json!({ "action": "list", "path": "nope" }))
        .unwrap();
    assert_eq!(
        agent.execute(missing).await.unwrap_err(),
        AgentError::NotFound("Directory not found: nope".into())
    );

    let escape = agent
        .decode_input(&json!({ "action": "list", "path": ".." }))
        .unwrap();
    assert!(matches!(
        agent.execute(escape).await.unwrap_err(),
        AgentError::InvalidInput(_)
    ));
}

// ---------------------------------------------------------------------------
// conversational

struct MockClient {
    reply: String,
    seen: Mutex<Vec<Message>>,
    usage: Mutex<Option<TokenUsage>>,
}

impl MockClient {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
            usage: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ClientWrapper for MockClient {
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        *self.seen.lock().unwrap() = messages.to_vec();
        if self.reply.is_empty() {
            return Err("upstream timeout".into());
        }
        let input_tokens: usize = messages.iter().map(|m| m.content.len()).sum();
        *self.usage.lock().unwrap() = Some(TokenUsage {
            input_tokens,
            output_tokens: self.reply.len(),
            total_tokens: input_tokens + self.reply.len(),
        });
        Ok(Message::new(Role::Assistant, self.reply.clone()))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.usage)
    }
}

#[tokio::test]
async fn test_conversational_sends_history_then_text() {
    let client = Arc::new(MockClient::new("Bananas are berries."));
    let agent = ConversationalAgent::new(client.clone());
    assert!(agent.last_usage().is_none());

    let input = agent
        .decode_input(&json!({
            "text": "banana?",
            "context": [
                { "role": "user", "content": "I like fruit" },
                { "role": "bot", "content": "Which one?" }
            ]
        }))
        .unwrap();
    let output = agent.execute(input).await.unwrap();
    assert_eq!(output, AgentOutput::Conversational("Bananas are berries.".into()));
    assert_output_conforms(&agent, &output);

    let seen = client.seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            Message::new(Role::User, "I like fruit"),
            Message::new(Role::User, "Which one?"),
            Message::new(Role::User, "banana?"),
        ]
    );
    // 12 + 10 + 7 characters in, 20 out
    assert_eq!(
        agent.last_usage(),
        Some(TokenUsage {
            input_tokens: 29,
            output_tokens: 20,
            total_tokens: 49,
        })
    );
}

#[tokio::test]
async fn test_conversational_wraps_client_errors() {
    let agent = ConversationalAgent::new(Arc::new(MockClient::new("")));
    let input = agent.decode_input(&json!({ "text": "hello?" })).unwrap();
    assert_eq!(
        agent.execute(input).await.unwrap_err(),
        AgentError::Service("Conversational agent error: upstream timeout".into())
    );
    assert!(agent.last_usage().is_none());
}

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::catalog::{CatalogExercise, SearchQuery};
use crate::payload::{WorkoutPayload, WorkoutSuggestion};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

const WORKOUTS_PATH: &str = "/trainer/workouts";
const EXERCISES_PATH: &str = "/exercises";
const CLIENTS_PATH: &str = "/clients";
const COMPOSITE_RUN_PATH: &str = "/agents/composite-run";

/// Determine the API key to use for backend requests.
///
/// If the `TRAINER_API_KEY` environment variable is set, its value takes
/// precedence over any key stored in the settings.
pub fn resolve_api_key(settings_key: Option<&str>) -> Option<String> {
    std::env::var("TRAINER_API_KEY")
        .ok()
        .or_else(|| settings_key.map(|s| s.to_string()))
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Forbidden(String),
    Status(u16, String),
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized(body) => write!(f, "Unauthorized: {body}"),
            ApiError::Forbidden(body) => write!(f, "Forbidden: {body}"),
            ApiError::Status(code, body) => write!(f, "HTTP {code}: {body}"),
            ApiError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Unauthorized(_) | ApiError::Forbidden(_) | ApiError::Status(..) => None,
            ApiError::Other(e) => Some(&**e),
        }
    }
}

/// Client record from the clients list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

fn read_body(response: Result<ureq::Response, ureq::Error>) -> Result<String, ApiError> {
    match response {
        Ok(r) => r.into_string().map_err(|e| ApiError::Other(Box::new(e))),
        Err(ureq::Error::Status(401, r)) => Err(ApiError::Unauthorized(
            r.into_string().unwrap_or_default(),
        )),
        Err(ureq::Error::Status(403, r)) => {
            Err(ApiError::Forbidden(r.into_string().unwrap_or_default()))
        }
        Err(ureq::Error::Status(code, r)) => {
            Err(ApiError::Status(code, r.into_string().unwrap_or_default()))
        }
        Err(e) => Err(ApiError::Other(Box::new(e))),
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Other(Box::new(e)))
}

/// Blocking client for the trainer backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let req = ureq::request(method, &format!("{}{path}", self.base_url))
            .set("Accept", "application/json");
        match &self.api_key {
            Some(key) => req.set("Authorization", &format!("Bearer {key}")),
            None => req,
        }
    }

    /// Save a workout. Returns the backend's JSON reply.
    pub fn send_trainer_workout(&self, payload: &WorkoutPayload) -> Result<Value, ApiError> {
        log::info!(
            "Saving workout '{}' ({} exercises) for client {:?}",
            payload.workout_data.workout_name,
            payload.workout_data.exercises.len(),
            payload.workout_data.client_id
        );
        let body = read_body(self.request("POST", WORKOUTS_PATH).send_json(payload))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        parse(&body)
    }

    /// Search the exercise catalog.
    pub fn search_exercises(&self, query: &SearchQuery) -> Result<Vec<CatalogExercise>, ApiError> {
        let mut req = self
            .request("GET", EXERCISES_PATH)
            .query("query", query.text.trim());
        if let Some(mg) = &query.muscle_group {
            req = req.query("muscle_group", mg);
        }
        if let Some(eq) = query.equipment {
            req = req.query("equipment", eq.as_str());
        }
        let body = read_body(req.call())?;
        parse(&body)
    }

    pub fn fetch_clients(&self) -> Result<Vec<Client>, ApiError> {
        let body = read_body(self.request("GET", CLIENTS_PATH).call())?;
        parse(&body)
    }

    /// Ask the AI agent workflow for a workout proposal.
    pub fn run_composite_agent(&self, prompt: &str) -> Result<WorkoutSuggestion, ApiError> {
        log::info!("Requesting workout suggestion from agent run");
        let body = read_body(
            self.request("POST", COMPOSITE_RUN_PATH)
                .send_json(json!({ "prompt": prompt })),
        )?;
        parse(&body)
    }

    /// Save one copy of `payload` per client, all in parallel.
    ///
    /// Each client's save succeeds or fails on its own; nothing is rolled
    /// back when another client's request fails.
    pub fn assign_workout(
        &self,
        payload: &WorkoutPayload,
        client_ids: &[u64],
    ) -> Vec<(u64, Result<Value, ApiError>)> {
        let results: Vec<(u64, Result<Value, ApiError>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = client_ids
                .iter()
                .map(|&id| {
                    let copy = payload.for_client(id);
                    (id, scope.spawn(move || self.send_trainer_workout(&copy)))
                })
                .collect();
            handles
                .into_iter()
                .map(|(id, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(ApiError::Other("save thread panicked".into()))
                    });
                    (id, result)
                })
                .collect()
        });
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed > 0 {
            log::error!("{failed} of {} workout assignments failed", results.len());
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExerciseGroupingEngine;
    use crate::payload::WorkoutDetails;
    use crate::search::SearchCoordinator;
    use chrono::{TimeZone, Utc};
    use httpmock::prelude::*;

    fn payload() -> WorkoutPayload {
        let mut engine = ExerciseGroupingEngine::new();
        engine.add_entry(CatalogExercise::new(3, "Deadlift"), None);
        let start = Utc.with_ymd_and_hms(2025, 5, 1, 6, 0, 0).unwrap();
        engine.to_payload(&WorkoutDetails::starting_at("Pull Day", start, 60, "Strength"))
    }

    #[test]
    fn send_posts_payload_with_bearer_key() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/api/trainer/workouts")
                .header("Authorization", "Bearer secret")
                .body_contains("\"workout_name\":\"Pull Day\"")
                .body_contains("\"exercise_name\":\"Deadlift\"");
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"{"workout_id": 44}"#);
        });

        let client = ApiClient::new(server.url("/api/"), Some("secret".into()));
        let reply = client.send_trainer_workout(&payload()).unwrap();
        assert_eq!(reply["workout_id"], 44);
        m.assert();
    }

    #[test]
    fn maps_401_and_403() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/clients");
            then.status(401).body("unauthorized body");
        });
        let client = ApiClient::new(server.url(""), None);
        match client.fetch_clients().unwrap_err() {
            ApiError::Unauthorized(body) => assert_eq!(body, "unauthorized body"),
            e => panic!("unexpected error: {e:?}"),
        }
        m.assert();

        let m = server.mock(|when, then| {
            when.method(GET).path("/exercises");
            then.status(403).body("forbidden body");
        });
        match client.search_exercises(&SearchQuery::text("row")).unwrap_err() {
            ApiError::Forbidden(body) => assert_eq!(body, "forbidden body"),
            e => panic!("unexpected error: {e:?}"),
        }
        m.assert();
    }

    #[test]
    fn search_sends_facets_as_query_params() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/exercises")
                .query_param("query", "curl")
                .query_param("muscle_group", "Biceps")
                .query_param("equipment", "dumbbell");
            then.status(200).body(
                r#"[{"id": 6, "name": "Dumbbell Curl", "equipment": "dumbbell", "muscle_groups": ["Biceps"]}]"#,
            );
        });
        let client = ApiClient::new(server.url(""), None);
        let query = SearchQuery {
            text: " curl ".into(),
            muscle_group: Some("Biceps".into()),
            equipment: Some(crate::catalog::Equipment::Dumbbell),
        };
        let hits = client.search_exercises(&query).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Dumbbell Curl");
        assert_eq!(hits[0].category, None);
        m.assert();
    }

    #[test]
    fn debounced_search_issues_one_request() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/exercises")
                .query_param("query", "lunge");
            then.status(200)
                .body(r#"[{"id": 9, "name": "Walking Lunge"}]"#);
        });
        let client = ApiClient::new(server.url(""), None);
        let mut search = SearchCoordinator::new(std::time::Duration::from_millis(5));
        let now = std::time::Instant::now();
        search.input(SearchQuery::text("lu"), now);
        search.input(SearchQuery::text("lunge"), now);
        let hits = search
            .settle(|q| client.search_exercises(q))
            .unwrap()
            .unwrap();
        assert_eq!(hits[0].name, "Walking Lunge");
        m.assert_hits(1);
    }

    #[test]
    fn composite_run_hydrates_engine() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/agents/composite-run")
                .body_contains("\"prompt\":\"upper body\"");
            then.status(200).body(
                r#"{"workout_name": "Upper", "exercises": [
                    {"id": 1, "exercise_name": "Bench Press", "exercise_order": 1, "group_id": 3, "set_structure": 1,
                     "sets": [{"sets_order": 1, "reps": "8", "weight": 135}]},
                    {"id": 4, "exercise_name": "Pull-Up", "exercise_order": 2, "group_id": 3, "set_structure": 1,
                     "sets": [{"sets_order": 1, "reps": "8", "weight": "BW"}]}
                ]}"#,
            );
        });
        let client = ApiClient::new(server.url(""), None);
        let suggestion = client.run_composite_agent("upper body").unwrap();
        assert_eq!(suggestion.workout_name.as_deref(), Some("Upper"));
        let engine = suggestion.into_engine();
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.blocks().len(), 1);
        m.assert();
    }

    #[test]
    fn assignment_failures_are_independent() {
        let server = MockServer::start();
        let ok = server.mock(|when, then| {
            when.method(POST)
                .path("/trainer/workouts")
                .body_contains("\"client_id\":1,");
            then.status(200).body("");
        });
        let broken = server.mock(|when, then| {
            when.method(POST)
                .path("/trainer/workouts")
                .body_contains("\"client_id\":2,");
            then.status(500).body("boom");
        });

        let client = ApiClient::new(server.url(""), None);
        let results = client.assign_workout(&payload(), &[1, 2]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert!(matches!(results[0].1, Ok(Value::Null)));
        match &results[1].1 {
            Err(ApiError::Status(500, body)) => assert_eq!(body, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
        ok.assert();
        broken.assert();
    }

    #[test]
    fn env_var_overrides_settings_key() {
        unsafe {
            std::env::set_var("TRAINER_API_KEY", "forced");
        }
        let key = resolve_api_key(Some("settings_key"));
        assert_eq!(key.as_deref(), Some("forced"));
        unsafe {
            std::env::remove_var("TRAINER_API_KEY");
        }
        assert_eq!(
            resolve_api_key(Some("settings_key")).as_deref(),
            Some("settings_key")
        );
    }
}

//! Command-line driver for the workout editor.

use chrono::Utc;
use clap::Parser;
use log::info;

use std::time::Instant;

use trainer_workout_builder::api::{ApiClient, ApiError, resolve_api_key};
use trainer_workout_builder::catalog::SearchQuery;
use trainer_workout_builder::export::{load_payload_json, save_payload_json, save_sets_csv};
use trainer_workout_builder::search::SearchCoordinator;
use trainer_workout_builder::settings::Settings;
use trainer_workout_builder::{Command, ExerciseGroupingEngine, WorkoutDetails};

mod cli;
use cli::Cli;

fn load_script(path: &std::path::Path) -> Result<Vec<Command>, Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Look each text up in the catalog and add the best hit to the workout.
fn add_found(
    client: &ApiClient,
    search: &mut SearchCoordinator,
    engine: &mut ExerciseGroupingEngine,
    texts: &[String],
) -> Result<(), ApiError> {
    for text in texts {
        search.input(SearchQuery::text(text.as_str()), Instant::now());
        let hits = search.settle(|q| client.search_exercises(q))?;
        match hits.and_then(|h| h.into_iter().next()) {
            Some(hit) => {
                info!("Adding '{}' for search '{text}'", hit.name);
                engine.add_from_search(hit);
            }
            None => log::warn!("No exercise found for '{text}'"),
        }
    }
    Ok(())
}

fn run(cli: Cli, settings: &mut Settings) -> Result<(), Box<dyn std::error::Error>> {
    let client = ApiClient::new(
        cli.api_url
            .clone()
            .unwrap_or_else(|| settings.api_base_url.clone()),
        resolve_api_key(settings.api_key.as_deref()),
    );

    let fresh_details = |name: Option<String>| {
        WorkoutDetails::starting_at(
            name.unwrap_or_else(|| "Untitled workout".to_string()),
            Utc::now(),
            settings.default_duration_minutes,
            settings.default_workout_type.clone(),
        )
    };

    let (mut engine, mut details) = if let Some(path) = &cli.draft {
        let payload = load_payload_json(path)?;
        info!(
            "Loaded draft '{}' from {}",
            payload.workout_data.workout_name,
            path.display()
        );
        (
            ExerciseGroupingEngine::from_exercises(&payload.workout_data.exercises),
            WorkoutDetails::from(&payload.workout_data),
        )
    } else if let Some(prompt) = &cli.suggest {
        let suggestion = client.run_composite_agent(prompt)?;
        let details = fresh_details(suggestion.workout_name.clone());
        (suggestion.into_engine(), details)
    } else {
        (ExerciseGroupingEngine::new(), fresh_details(None))
    };

    if !cli.find.is_empty() {
        let mut search = SearchCoordinator::new(settings.search_debounce());
        add_found(&client, &mut search, &mut engine, &cli.find)?;
    }

    if let Some(path) = &cli.script {
        let commands = load_script(path)?;
        let total = commands.len();
        let applied = commands
            .into_iter()
            .map(|c| engine.apply(c))
            .filter(|&changed| changed)
            .count();
        info!("Applied {applied} of {total} commands from {}", path.display());
    }

    if let Some(name) = cli.name {
        details.workout_name = name;
    }
    if cli.client.is_some() {
        details.client_id = cli.client;
    }

    let payload = engine.to_payload(&details);
    println!("{}", serde_json::to_string_pretty(&payload)?);

    if let Some(path) = &cli.out {
        save_payload_json(path, &payload)?;
        settings.last_draft = Some(path.clone());
        info!("Saved draft to {}", path.display());
    }
    if let Some(path) = &cli.csv {
        save_sets_csv(path, &engine)?;
        info!("Exported sets to {}", path.display());
    }

    if cli.send {
        if cli.clients.is_empty() {
            client.send_trainer_workout(&payload)?;
            info!("Workout saved");
        } else {
            let results = client.assign_workout(&payload, &cli.clients);
            for (id, result) in &results {
                match result {
                    Ok(_) => info!("Assigned to client {id}"),
                    Err(e) => log::error!("Failed to assign to client {id}: {e}"),
                }
            }
            if results.iter().any(|(_, r)| r.is_err()) {
                return Err("some assignments failed; the others were saved".into());
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let mut settings = Settings::load();
    let result = run(cli, &mut settings);
    settings.save();
    if let Err(e) = &result {
        log::error!("{e}");
    }
    result
}

//! # CLI Command Implementations

use crate::api::{self, AppState};
use crate::client::HttpService;
use crate::config::Config;
use crate::explorer::Explorer;
use crate::service::{ExplorationService, LocalService};
use dexplore_core::{
    DEFAULT_AUTO_STEPS, DexploreError, Event, ExplorationState, Graph, GraphKind, KnowledgeBase,
    Step, render, suggested_event,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of an event script (1 MB).
const MAX_SCRIPT_FILE_SIZE: u64 = 1024 * 1024;

/// Maximum size of a graph file (50 MB).
const MAX_GRAPH_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), DexploreError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| DexploreError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(DexploreError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, DexploreError> {
    let canonical = path.canonicalize().map_err(|e| {
        DexploreError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(DexploreError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require it to be a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, DexploreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        DexploreError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(DexploreError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| DexploreError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn read_json_file<T: serde::de::DeserializeOwned>(
    path: &Path,
    max_size: u64,
) -> Result<T, DexploreError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    let content = std::fs::read_to_string(&validated)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf, DexploreError> {
    let validated = validate_output_path(path)?;
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(&validated, content)?;
    Ok(validated)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DexploreError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load a JSON array of events, e.g. `[{"action": "situation", "situation": "..."}]`.
pub fn load_script(path: &Path) -> Result<Vec<Event>, DexploreError> {
    read_json_file(path, MAX_SCRIPT_FILE_SIZE)
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the reference HTTP exploration service.
pub async fn cmd_serve(config: &Config) -> Result<(), DexploreError> {
    let knowledge = KnowledgeBase::collision_avoidance();

    println!("dexplore Exploration Service Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.host);
    println!("  Port:       {}", config.port);
    println!("  Rate limit: {}/s", config.rate_limit);
    println!("  Capacity:   {} explorations", config.max_explorations);
    println!("  Systems:    {}", knowledge.all_systems().join(", "));
    println!();
    println!("Endpoints:");
    println!("  GET  /health                          - Health check");
    println!("  GET  /api/knowledge                   - Knowledge base");
    println!("  GET  /api/component-types             - Component type catalog");
    println!("  POST /api/explorations/{{id}}/start     - Start an exploration");
    println!("  POST /api/explorations/{{id}}/{{action}}  - Submit an event");
    println!("  GET  /api/explorations/{{id}}/render    - Rendered DE graph");
    println!("  DELETE /api/explorations/{{id}}         - Discard an exploration");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(knowledge).with_max_explorations(config.max_explorations);
    api::run_server(&addr, state, config).await
}

// =============================================================================
// EXPLORE COMMAND
// =============================================================================

/// Where the events of an exploration come from.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSource {
    /// Submit these events in order, stopping at the first failure.
    Script(Vec<Event>),
    /// Take every suggestion until completion.
    Auto,
    /// Prompt on stdin.
    Interactive,
}

#[derive(Debug, Clone)]
pub struct ExploreOptions {
    pub system: String,
    pub source: EventSource,
    pub output: Option<PathBuf>,
    pub json_mode: bool,
}

/// Explore against the built-in knowledge base.
pub async fn cmd_explore_local(options: ExploreOptions) -> Result<(), DexploreError> {
    let service = LocalService::new(Arc::new(KnowledgeBase::collision_avoidance()));
    let explorer = Explorer::new(service);
    run_exploration(&explorer, options).await
}

/// Explore against the service at `config.service_url`.
pub async fn cmd_explore_remote(
    config: &Config,
    id: &str,
    options: ExploreOptions,
) -> Result<(), DexploreError> {
    let service = HttpService::new(&config.service_url, config.api_key.clone(), id);
    let health = service.health().await?;
    tracing::info!(
        url = %config.service_url,
        exploration = service.exploration_id(),
        version = health["version"].as_str().unwrap_or("unknown"),
        "Connected to exploration service"
    );
    let explorer = Explorer::new(service);
    run_exploration(&explorer, options).await
}

async fn run_exploration<S: ExplorationService>(
    explorer: &Explorer<S>,
    options: ExploreOptions,
) -> Result<(), DexploreError> {
    let state = drive(explorer, &options.system, options.source).await?;

    if let Some(path) = options.output.as_deref() {
        let written = write_json_file(path, &state.graph)?;
        tracing::info!(path = %written.display(), nodes = state.graph.node_count(), "DE graph written");
    }

    let rendering = explorer.render()?;
    if options.json_mode {
        print_json(&serde_json::json!({
            "step": state.step,
            "system": state.system,
            "completed": state.is_completed(),
            "graph": state.graph,
            "rendering": rendering,
        }))
    } else {
        println!();
        println!("Exploration of {} ({})", options.system, state.step);
        println!("==========================================");
        print!("{}", rendering.to_text());
        Ok(())
    }
}

/// Start `system` and feed events from `source` until it runs out or the
/// exploration completes.
pub async fn drive<S: ExplorationService>(
    explorer: &Explorer<S>,
    system: &str,
    source: EventSource,
) -> Result<ExplorationState, DexploreError> {
    let mut state = explorer.start(system).await?;

    match source {
        EventSource::Script(events) => {
            for event in events {
                if state.is_completed() {
                    tracing::warn!("Exploration completed; remaining script events ignored");
                    break;
                }
                state = explorer.submit(event).await?;
            }
        }
        EventSource::Auto => {
            for _ in 0..DEFAULT_AUTO_STEPS {
                if state.is_completed() {
                    break;
                }
                state = explorer.submit(suggested_event(&state)?).await?;
            }
            if !state.is_completed() {
                return Err(DexploreError::Validation(format!(
                    "exploration of '{system}' did not complete within {DEFAULT_AUTO_STEPS} steps"
                )));
            }
        }
        EventSource::Interactive => {
            state = interact(explorer, state).await?;
        }
    }
    Ok(state)
}

/// Prompt loop on stdin. Rejected input re-prompts; EOF or `quit` stops.
async fn interact<S: ExplorationService>(
    explorer: &Explorer<S>,
    mut state: ExplorationState,
) -> Result<ExplorationState, DexploreError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while !state.is_completed() {
        println!();
        println!("{}", state.message);
        for line in choices(&state) {
            println!("  {}", line);
        }
        print!("{}> ", state.step);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let event = match parse_input(&state, &line) {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(e) => {
                println!("! {}", e);
                continue;
            }
        };
        match explorer.submit(event).await {
            Ok(next) => state = next,
            Err(e) => println!("! {}", e),
        }
    }
    Ok(state)
}

fn listing(suggested: &Option<String>, available: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(s) = suggested {
        lines.push(format!("suggested: {s}"));
    }
    if !available.is_empty() {
        lines.push(format!("available: {}", available.join(", ")));
    }
    lines
}

/// Candidate lines shown under the prompt.
fn choices(state: &ExplorationState) -> Vec<String> {
    match state.step {
        Step::SituationAssessment => {
            listing(&state.suggested_situation, &state.available_situations)
        }
        Step::ProblemIdentification => {
            listing(&state.suggested_problem, &state.available_problems)
        }
        Step::EstablishIntention => {
            listing(&state.suggested_intention, &state.available_intentions)
        }
        Step::ChoosePath => {
            let mut lines = Vec::new();
            if let Some(split) = state.suggested_decomposition.as_ref().filter(|d| !d.is_empty()) {
                lines.push(format!(
                    "decompose {} | {}",
                    split.intentions.join(","),
                    split.systems.join(",")
                ));
            }
            if !state.available_solutions.is_empty() {
                lines.push(format!("solutions: {}", state.available_solutions.join(", ")));
            }
            lines
        }
        Step::Completed => Vec::new(),
    }
}

/// Turn one line of input into an event.
///
/// - empty line: take the suggestion
/// - `quit`: stop
/// - at the branch: `decompose <i1,i2> | <s1,s2>`, else the solution name
/// - otherwise: the value itself
pub fn parse_input(state: &ExplorationState, line: &str) -> Result<Option<Event>, DexploreError> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    if line.is_empty() {
        return suggested_event(state).map(Some);
    }

    let event = match state.step {
        Step::SituationAssessment => Event::situation(line),
        Step::ProblemIdentification => Event::problem(line),
        Step::EstablishIntention => Event::intention(line),
        Step::ChoosePath => match line.strip_prefix("decompose") {
            Some(rest) => {
                let (intentions, systems) = rest.split_once('|').ok_or_else(|| {
                    DexploreError::Validation(
                        "expected 'decompose <intentions> | <systems>'".to_string(),
                    )
                })?;
                Event::decompose(split_list(intentions), split_list(systems))
            }
            None => Event::solution(line),
        },
        Step::Completed => return Err(DexploreError::TerminalState),
    };
    Ok(Some(event))
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// RENDER COMMAND
// =============================================================================

/// Render a DE graph saved as JSON.
pub fn cmd_render(input: &Path, json_mode: bool) -> Result<(), DexploreError> {
    let graph: Graph = read_json_file(input, MAX_GRAPH_FILE_SIZE)?;
    let rendering = render(&graph);

    if json_mode {
        return print_json(&rendering);
    }
    println!("{} graph: {} nodes, {} edges", graph.kind(), graph.node_count(), graph.edge_count());
    println!();
    print!("{}", rendering.to_text());
    Ok(())
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Send a DE graph to the remote service and write the three views.
pub async fn cmd_convert(
    config: &Config,
    input: &Path,
    output_dir: &Path,
    json_mode: bool,
) -> Result<(), DexploreError> {
    let de: Graph = read_json_file(input, MAX_GRAPH_FILE_SIZE)?;
    if de.kind() != GraphKind::De {
        return Err(DexploreError::Validation(format!(
            "expected a DE graph, found {}",
            de.kind()
        )));
    }

    let service = HttpService::new(&config.service_url, config.api_key.clone(), "convert");
    let converted = service.convert(&de).await?;

    let mut written = Vec::new();
    for (name, graph) in [
        ("de.json", &converted.de),
        ("ld.json", &converted.ld),
        ("si.json", &converted.si),
    ] {
        written.push(write_json_file(&output_dir.join(name), graph)?);
    }

    if json_mode {
        let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        return print_json(&serde_json::json!({ "written": paths }));
    }
    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

// =============================================================================
// KNOWLEDGE COMMAND
// =============================================================================

/// Show the built-in knowledge base.
pub fn cmd_knowledge(json_mode: bool) -> Result<(), DexploreError> {
    let knowledge = KnowledgeBase::collision_avoidance();
    let snapshot = knowledge.snapshot();

    if json_mode {
        return print_json(&snapshot);
    }

    println!("Knowledge Base");
    println!("==============");
    println!("Systems: {}", knowledge.all_systems().join(", "));
    println!();
    for entry in &snapshot.situations {
        println!("[{}] situation: {}", entry.system, entry.situation);
    }
    for entry in &snapshot.problems {
        println!("[{}] {} -> problem: {}", entry.system, entry.situation, entry.problem);
    }
    for entry in &snapshot.intentions {
        println!("{} -> intention: {}", entry.problem, entry.intention);
    }
    for entry in &snapshot.decompositions {
        println!(
            "[{}] {} -> decompose {} | {}",
            entry.system,
            entry.intention,
            entry.decomposition.intentions.join(","),
            entry.decomposition.systems.join(",")
        );
    }
    for (system, solutions) in &snapshot.solutions {
        println!("[{}] solutions: {}", system, solutions.join(", "));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

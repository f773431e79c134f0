//! CLI command implementations
//!
//! Every command loads and validates the config first. Commands that touch
//! records open the store through the same boot path, so a corrupt storage
//! file stops `serve`, `seed` and `query` alike.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::{init_logging, log_event, Event, LogFormat};
use crate::storage::{StorageWriter, STORAGE_FILE_NAME};
use crate::students::{
    NewStudent, Page, RecordError, RecordResult, Scores, StoreConfig, StudentStore,
    DEFAULT_MAX_LIMIT,
};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Host, port and CORS origins
    #[serde(flatten)]
    pub http: HttpServerConfig,

    /// Upper bound on list page size (default 1000)
    #[serde(default = "default_max_page_limit")]
    pub max_page_limit: usize,

    /// `pretty` or `json` (default `pretty`)
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_max_page_limit() -> usize {
    DEFAULT_MAX_LIMIT
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.max_page_limit == 0 {
            return Err(CliError::config_error("max_page_limit must be > 0"));
        }

        if self.http.host.trim().is_empty() {
            return Err(CliError::config_error("host must not be empty"));
        }

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::durable(self.data_path()).with_max_page_limit(self.max_page_limit)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Seed { config, count } => seed(&config, count),
        Command::Query { config } => query(&config),
    }
}

/// Initialize a new data directory
///
/// Creates `<data_dir>/data/students.dat`. Refuses to run twice.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::AlreadyInitialized(data_dir.to_path_buf()));
    }

    let writer = StorageWriter::open(data_dir)
        .map_err(|e| CliError::config_error(format!("Failed to create storage: {}", e)))?;

    write_response(json!({
        "initialized": true,
        "storage_path": writer.path().display().to_string()
    }))?;

    Ok(())
}

/// Serve the HTTP API until interrupted
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = Arc::new(boot(&config)?);

    let mut http_config = config.http.clone();
    if let Some(port) = port {
        http_config.port = port;
    }
    let server = HttpServer::with_config(http_config, Arc::clone(&store));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::BootFailed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::BootFailed(format!("HTTP server failed: {}", e)))
    })?;

    drop(rt);
    if let Ok(store) = Arc::try_unwrap(store) {
        store.close();
    }
    log_event(Event::ShutdownComplete);

    Ok(())
}

/// Insert `count` sample students. Ids that already exist are skipped.
pub fn seed(config_path: &Path, count: usize) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = boot(&config)?;

    let (inserted, skipped) = seed_store(&store, count)?;

    info!(
        event = Event::SeedComplete.as_str(),
        inserted,
        skipped,
        "sample students seeded"
    );
    store.close();

    write_response(json!({"inserted": inserted, "skipped": skipped}))?;
    Ok(())
}

/// Execute one JSON request from stdin and exit
///
/// Store-level failures are reported as an error line on stdout, not as a
/// CLI error.
pub fn query(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = boot(&config)?;

    let request = read_request()?;
    let result = execute_request(&store, &request);
    store.close();

    match result {
        Ok(data) => write_response(data),
        Err(err) => write_error(err.code(), &err.to_string(), err.field()),
    }
}

// ==================
// Shared helpers
// ==================

fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    init_logging(config.log_format);
    info!(
        event = Event::ConfigLoaded.as_str(),
        data_dir = %config.data_dir,
        "config loaded"
    );
    Ok(config)
}

/// Check if a data directory is initialized
fn is_initialized(data_dir: &Path) -> bool {
    storage_path(data_dir).exists()
}

fn storage_path(data_dir: &Path) -> PathBuf {
    data_dir.join("data").join(STORAGE_FILE_NAME)
}

/// Open the store, replaying storage. Any failure is fatal.
fn boot(config: &Config) -> CliResult<StudentStore> {
    log_event(Event::BootStart);

    if !is_initialized(config.data_path()) {
        return Err(CliError::NotInitialized(config.data_path().to_path_buf()));
    }

    let store = StudentStore::open(&config.store_config())
        .map_err(|e| CliError::open_failed(config.data_path(), e))?;

    log_event(Event::BootComplete);
    Ok(store)
}

/// Sample student number `i` (1-based)
pub fn sample_student(i: usize) -> NewStudent {
    let n = i as i64;
    NewStudent::new(
        format!("S{:03}", i),
        format!("First{}", i),
        format!("Last{}", i),
        18 + n % 5,
    )
    .with_scores(Scores::from([
        ("math".to_string(), 60 + n % 40),
        ("cs".to_string(), 55 + n % 45),
        ("db".to_string(), 50 + n % 50),
    ]))
    .with_active(true)
}

/// Seed `count` sample students. Returns `(inserted, skipped)`.
pub fn seed_store(store: &StudentStore, count: usize) -> CliResult<(usize, usize)> {
    let mut inserted = 0;
    let mut skipped = 0;
    for i in 1..=count {
        let student = sample_student(i);
        let student_id = student.student_id.clone();
        match store.insert(student) {
            Ok(_) => inserted += 1,
            Err(RecordError::DuplicateKey { .. }) => skipped += 1,
            Err(source) => return Err(CliError::SeedFailed { student_id, source }),
        }
    }
    Ok((inserted, skipped))
}

/// Execute one `{"op": ...}` request against the store.
///
/// | op       | fields                          | result                      |
/// |----------|---------------------------------|-----------------------------|
/// | `insert` | `document`                      | `{"inserted_id"}`           |
/// | `get`    | `student_id`                    | student or `null`           |
/// | `list`   | `limit`?, `skip`?               | array of students           |
/// | `update` | `student_id`, `fields`          | `{"matched", "modified"}`   |
/// | `delete` | `student_id`                    | `{"deleted"}`               |
pub fn execute_request(store: &StudentStore, request: &Value) -> RecordResult<Value> {
    let op = request
        .get("op")
        .ok_or_else(|| RecordError::missing("op"))?
        .as_str()
        .ok_or_else(|| RecordError::invalid("op", "expected a string"))?;

    match op {
        "insert" => {
            let document = request
                .get("document")
                .ok_or_else(|| RecordError::missing("document"))?;
            let inserted_id = store.insert_document(document)?;
            Ok(json!({"inserted_id": inserted_id}))
        }
        "get" => {
            let student = store.get(request_student_id(request)?)?;
            Ok(serde_json::to_value(student)?)
        }
        "list" => {
            let page = Page::from_params(
                optional_int(request, "limit")?,
                optional_int(request, "skip")?,
            )?;
            Ok(serde_json::to_value(store.list(page)?)?)
        }
        "update" => {
            let student_id = request_student_id(request)?;
            let fields = request
                .get("fields")
                .ok_or_else(|| RecordError::missing("fields"))?;
            let outcome = store.update_document(student_id, fields)?;
            Ok(json!({
                "matched": outcome.matched_count,
                "modified": outcome.modified_count
            }))
        }
        "delete" => {
            let outcome = store.delete(request_student_id(request)?)?;
            Ok(json!({"deleted": outcome.deleted_count}))
        }
        other => Err(RecordError::invalid(
            "op",
            format!("unknown operation '{}'", other),
        )),
    }
}

fn request_student_id(request: &Value) -> RecordResult<&str> {
    request
        .get("student_id")
        .ok_or_else(|| RecordError::missing("student_id"))?
        .as_str()
        .ok_or_else(|| RecordError::invalid("student_id", "expected a string"))
}

fn optional_int(request: &Value, field: &str) -> RecordResult<Option<i64>> {
    match request.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| RecordError::invalid(field, "expected an integer")),
    }
}

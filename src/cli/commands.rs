//! CLI command implementations
//!
//! Every command follows the same sequence: load config, bind the model,
//! load the data (in batches when `load.chunk_size` is set), then act.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tracing::info;

use super::args::{Command, Documents};
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_error, write_response};
use super::save::save_document;
use super::session::Session;
use crate::engine::{Engine, EngineConfig, EngineError};
use crate::search::SearchQuery;
use crate::store::{LoadReport, LoadStep};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Validate { docs } => validate(&docs),
        Command::Export { docs, output } => export(&docs, output.as_deref()),
        Command::Search {
            docs,
            term,
            case_sensitive,
        } => search(&docs, term, case_sensitive),
        Command::Session { docs, output } => session(&docs, output.as_deref()),
    }
}

/// Report every violation in the data
pub fn validate(docs: &Documents) -> CliResult<()> {
    let (_, report) = open(docs)?;
    write_response(serde_json::to_value(&report)?)
}

/// Print the data in model order, or save it to `output`
pub fn export(docs: &Documents, output: Option<&Path>) -> CliResult<()> {
    let (engine, _) = open(docs)?;
    match output {
        Some(path) => {
            let blockers = engine.save_blockers();
            if !blockers.is_empty() {
                return Err(CliError::save_blocked(blockers.len()));
            }
            let report = save_document(path, &engine.export_records(), &engine.config().files)?;
            write_response(serde_json::to_value(report)?)
        }
        None => write_response(engine.export_records()),
    }
}

/// Print every match of `term`
pub fn search(docs: &Documents, term: String, case_sensitive: bool) -> CliResult<()> {
    let (mut engine, _) = open(docs)?;
    let query = SearchQuery::new(term).case_sensitive(case_sensitive);
    let matches = engine.search(&query);
    write_response(json!({"matches": matches}))
}

/// Serve JSON-lines edit requests until stdin closes
pub fn session(docs: &Documents, output: Option<&Path>) -> CliResult<()> {
    let (engine, report) = open(docs)?;
    let target = output.unwrap_or(&docs.data).to_path_buf();
    write_response(json!({"loaded": report}))?;

    let mut session = Session::new(engine, target);
    for request in read_requests() {
        let result = request.and_then(|request| session.handle(request));
        match result {
            Ok(data) => write_response(data)?,
            Err(e) => write_error(e.code_str(), e.message())?,
        }
    }

    info!("session closed");
    Ok(())
}

/// Builds an engine from the documents named on the command line
pub fn open(docs: &Documents) -> CliResult<(Engine, LoadReport)> {
    let config = EngineConfig::load_or_default(docs.config.as_deref())?;
    let mut engine = Engine::with_config(config);

    let model = read_text(&docs.model)?;
    engine.load_model(&model)?;

    let data: Value = serde_json::from_str(&read_text(&docs.data)?)
        .map_err(|e| EngineError::invalid_data(format!("{}: {}", docs.data.display(), e)))?;
    let report = load(&mut engine, data)?;
    Ok((engine, report))
}

fn load(engine: &mut Engine, data: Value) -> CliResult<LoadReport> {
    if engine.config().load.chunk_size.is_none() {
        return Ok(engine.load_data_value(data)?);
    }

    let raw = match data {
        Value::Array(raw) => raw,
        _ => return Err(EngineError::invalid_data("expected a JSON array of records").into()),
    };
    let mut cursor = engine.begin_load_data(raw)?;
    while let LoadStep::Batch { .. } = engine.load_next_batch(&mut cursor)? {}
    Ok(cursor.into_report())
}

fn read_text(path: &Path) -> CliResult<String> {
    fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("failed to read {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_docs(dir: &TempDir, config: Option<&str>) -> Documents {
        let model = dir.path().join("model.json");
        let data = dir.path().join("data.json");
        fs::write(
            &model,
            r#"{"__meta__": {"name": {"type": "str", "required": true}, "age": {"type": "int"}}}"#,
        )
        .unwrap();
        fs::write(&data, r#"[{"age": 3, "name": "Ana"}, {"name": null}, {"name": "Rui"}]"#).unwrap();

        let config = config.map(|content| {
            let path = dir.path().join("config.json");
            fs::write(&path, content).unwrap();
            path
        });
        Documents {
            model,
            data,
            config,
        }
    }

    #[test]
    fn test_open_reports_violations() {
        let dir = TempDir::new().unwrap();
        let docs = write_docs(&dir, None);
        let (engine, report) = open(&docs).unwrap();
        assert_eq!(report.accepted, 3);
        assert_eq!(report.flagged(), 1);
        assert_eq!(engine.store().len(), 3);
    }

    #[test]
    fn test_open_with_chunked_config() {
        let dir = TempDir::new().unwrap();
        let docs = write_docs(&dir, Some(r#"{"load": {"chunk_size": 2}}"#));
        let (engine, report) = open(&docs).unwrap();
        assert_eq!(report.accepted, 3);
        assert_eq!(report.flagged(), 1);
        assert_eq!(engine.config().load.chunk_size, Some(2));
    }

    #[test]
    fn test_open_errors_carry_codes() {
        let dir = TempDir::new().unwrap();
        let docs = write_docs(&dir, Some(r#"{"history": {"max_depth": 0}}"#));
        assert_eq!(open(&docs).unwrap_err().code_str(), "CLI_CONFIG_ERROR");

        let docs = Documents {
            model: dir.path().join("missing.json"),
            ..write_docs(&dir, None)
        };
        assert_eq!(open(&docs).unwrap_err().code_str(), "CLI_IO_ERROR");

        let docs = write_docs(&dir, None);
        fs::write(&docs.model, r#"{"fields": {}}"#).unwrap();
        assert_eq!(open(&docs).unwrap_err().code_str(), "SCHEMA_MALFORMED_META");
    }

    #[test]
    fn test_export_to_file_orders_keys() {
        let dir = TempDir::new().unwrap();
        let docs = write_docs(&dir, Some(r#"{"files": {"create_backups": false}}"#));
        let output = dir.path().join("out.json");
        export(&docs, Some(&output)).unwrap();

        let saved = fs::read_to_string(&output).unwrap();
        let first = saved.find("\"name\"").unwrap();
        let age = saved.find("\"age\"").unwrap();
        assert!(first < age);
        assert!(!dir.path().join("backups").exists());
    }
}

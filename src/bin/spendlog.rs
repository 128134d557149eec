use std::{
    process::ExitCode,
    sync::{Arc, Mutex},
};

use clap::Parser;
use serde::Serialize;
use tokio::sync::mpsc;

use spendlog::{
    config::Config,
    db,
    host::SimulatedHost,
    location::LocationResolver,
    logging::setup_logging,
    transaction::SQLiteTransactionStore,
    workflow::{Workflow, WorkflowReport, WorkflowState, run_workflow},
};

/// The JSON printed by `--json`.
#[derive(Serialize)]
struct RunSummary<'a> {
    state: WorkflowState,
    report: &'a WorkflowReport,
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    if let Err(error) = setup_logging(config.log_path.as_deref()) {
        eprintln!("Could not open the log file {:?}: {error}", config.log_path);
        return ExitCode::FAILURE;
    }

    let connection = match db::open(&config.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open the database at {:?}: {error}", config.db_path);
            return ExitCode::FAILURE;
        }
    };

    let store = SQLiteTransactionStore::new(Arc::new(Mutex::new(connection)));
    let resolver = LocationResolver::new(config.location_service());
    let (sender, receiver) = mpsc::unbounded_channel();
    let host = SimulatedHost::new(config.authorization(), !config.deny_requests, sender);

    let workflow = match run_workflow(Workflow::new(store, resolver, host), receiver).await {
        Ok(workflow) => workflow,
        Err(error) => {
            tracing::error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Finished in state {:?}", workflow.state());

    if config.json {
        let summary = RunSummary {
            state: workflow.state(),
            report: workflow.report(),
        };

        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(error) => {
                tracing::error!("Could not serialize the report as JSON: {error}");
                return ExitCode::FAILURE;
            }
        }
    }

    if workflow.error().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

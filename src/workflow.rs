//! The state machine that records the sample transaction once location
//! permission is settled.
//!
//! ```text
//! AwaitingPermission --granted--> PermissionGranted --> Running --> Done
//!         |
//!         +--denied--> Denied
//! ```
//!
//! [Workflow::start] and [Workflow::handle_event] are synchronous and do the
//! database work on the calling thread. [run_workflow] drives them from an
//! async context, moving that work onto tokio's blocking thread pool and
//! waiting for [HostEvent]s in between.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    Error,
    database_id::TransactionId,
    host::{HostEvent, PermissionHost, PermissionRequest},
    location::{LocationResolver, LocationService},
    transaction::{Transaction, TransactionStore},
};

/// Title of the transaction inserted by the workflow.
pub const SAMPLE_TITLE: &str = "Mi Ayam";
/// Category of the transaction inserted by the workflow.
pub const SAMPLE_CATEGORY: &str = "Pembelian";
/// Amount of the transaction inserted by the workflow.
pub const SAMPLE_AMOUNT: f64 = 15000.0;
/// Date of the transaction inserted by the workflow.
pub const SAMPLE_TANGGAL: &str = "2023-02-01 12:00:00";
/// The title the last transaction is renamed to.
pub const UPDATED_TITLE: &str = "Nasi Goreng";

/// Where a [Workflow] is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Waiting for the location permissions to be granted.
    AwaitingPermission,
    /// Permission was granted and the steps are about to run.
    PermissionGranted,
    /// The steps are running.
    Running,
    /// The steps finished, successfully or not.
    Done,
    /// The user denied the location permissions, nothing was run.
    Denied,
}

/// A completed step of the workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// The sample transaction was saved with this ID.
    Inserted {
        /// The ID the store assigned.
        id: TransactionId,
    },
    /// Every transaction was read.
    Listed {
        /// The transactions in store order.
        transactions: Vec<Transaction>,
    },
    /// The last listed transaction was renamed.
    Updated {
        /// The transaction as written.
        transaction: Transaction,
    },
    /// The renamed transaction was removed.
    Deleted {
        /// The ID of the removed transaction.
        id: TransactionId,
    },
}

/// What a workflow did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowReport {
    /// The location the sample transaction was tagged with, once resolved.
    pub location: Option<String>,
    /// The steps that completed, in order.
    pub steps: Vec<Step>,
    /// Why the remaining steps were skipped, if a step failed.
    pub error: Option<String>,
}

/// Waits for location permission and then inserts, lists, updates, lists
/// and deletes a sample transaction.
pub struct Workflow<S, L, H> {
    store: S,
    resolver: LocationResolver<L>,
    host: H,
    state: WorkflowState,
    report: WorkflowReport,
    error: Option<Error>,
}

impl<S, L, H> Workflow<S, L, H>
where
    S: TransactionStore,
    L: LocationService,
    H: PermissionHost,
{
    /// Create a workflow in the [WorkflowState::AwaitingPermission] state.
    pub fn new(store: S, resolver: LocationResolver<L>, host: H) -> Self {
        Self {
            store,
            resolver,
            host,
            state: WorkflowState::AwaitingPermission,
            report: WorkflowReport::default(),
            error: None,
        }
    }

    /// The current state.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Whether the workflow has reached [WorkflowState::Done] or
    /// [WorkflowState::Denied].
    pub fn is_finished(&self) -> bool {
        matches!(self.state, WorkflowState::Done | WorkflowState::Denied)
    }

    /// The steps completed so far.
    pub fn report(&self) -> &WorkflowReport {
        &self.report
    }

    /// The error that aborted the steps, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// The store the workflow writes to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check for location permission and run the steps if it is already held,
    /// otherwise ask the host for it.
    ///
    /// Does nothing unless the workflow is awaiting permission.
    ///
    /// # Errors
    /// Returns the error of the first step that failed.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.state != WorkflowState::AwaitingPermission {
            tracing::debug!("Ignoring start in state {:?}", self.state);
            return Ok(());
        }

        if self.host.authorization().is_fully_granted() {
            self.state = WorkflowState::PermissionGranted;
            return self.run();
        }

        self.host.request_permissions(PermissionRequest::location());

        Ok(())
    }

    /// React to an event from the host.
    ///
    /// A permission result that grants every location permission runs the
    /// steps, any other result moves the workflow to
    /// [WorkflowState::Denied]. Events that arrive after permission was
    /// settled are ignored.
    ///
    /// # Errors
    /// Returns the error of the first step that failed.
    pub fn handle_event(&mut self, event: HostEvent) -> Result<(), Error> {
        if self.state != WorkflowState::AwaitingPermission {
            tracing::debug!("Ignoring {event:?} in state {:?}", self.state);
            return Ok(());
        }

        if event.grants_location() {
            self.state = WorkflowState::PermissionGranted;
            self.run()
        } else {
            tracing::info!("Location permission was denied by the user.");
            self.state = WorkflowState::Denied;
            Ok(())
        }
    }

    fn run(&mut self) -> Result<(), Error> {
        let location = self
            .resolver
            .get_location_string(self.host.authorization());
        tracing::info!("Tagging transactions with location {location}");
        self.report.location = Some(location.clone());

        self.state = WorkflowState::Running;
        let result = self.run_steps(&location);
        self.state = WorkflowState::Done;

        if let Err(error) = &result {
            if error.is_storage() {
                tracing::error!("Storage failure, skipping the remaining steps: {error}");
            } else if error.is_not_found() {
                tracing::warn!("Transaction went missing, skipping the remaining steps: {error}");
            } else {
                tracing::warn!("Skipping the remaining steps: {error}");
            }
            self.report.error = Some(error.to_string());
        }

        result
    }

    fn run_steps(&mut self, location: &str) -> Result<(), Error> {
        let id = self.store.insert(
            Transaction::build(SAMPLE_TITLE, SAMPLE_CATEGORY, SAMPLE_AMOUNT, SAMPLE_TANGGAL)
                .location(location),
        )?;
        tracing::info!("Inserted transaction with ID: {id}");
        self.report.steps.push(Step::Inserted { id });

        let last = self.list()?.pop().ok_or(Error::NoTransactions)?;

        let updated = Transaction {
            title: UPDATED_TITLE.to_owned(),
            ..last
        };
        self.store.update(&updated)?;
        tracing::info!("Updated transaction with ID: {}", updated.id);
        let id = updated.id;
        self.report.steps.push(Step::Updated {
            transaction: updated,
        });

        self.list()?;

        self.store.delete(id)?;
        tracing::info!("Deleted transaction with ID: {id}");
        self.report.steps.push(Step::Deleted { id });

        Ok(())
    }

    fn list(&mut self) -> Result<Vec<Transaction>, Error> {
        let transactions = self.store.list_all()?;

        for transaction in &transactions {
            tracing::info!("{transaction}");
        }

        self.report.steps.push(Step::Listed {
            transactions: transactions.clone(),
        });

        Ok(transactions)
    }

    fn record_error(&mut self, result: Result<(), Error>) {
        if let Err(error) = result {
            self.error = Some(error);
        }
    }
}

/// Start `workflow` and feed it events from `events` until permission is
/// settled, running every call on tokio's blocking thread pool.
///
/// A step failure does not make this function fail: it is logged and kept
/// in [Workflow::error] and [WorkflowReport::error]. If `events` closes while
/// the workflow is still waiting for permission, the workflow is abandoned
/// and returned in the [WorkflowState::AwaitingPermission] state.
///
/// # Errors
/// Returns an [Error::TaskFailed] if a blocking task panicked.
pub async fn run_workflow<S, L, H>(
    workflow: Workflow<S, L, H>,
    mut events: UnboundedReceiver<HostEvent>,
) -> Result<Workflow<S, L, H>, Error>
where
    S: TransactionStore + Send + 'static,
    L: LocationService + Send + 'static,
    H: PermissionHost + Send + 'static,
{
    let mut workflow = on_blocking_pool(workflow, |workflow| workflow.start()).await?;

    while workflow.state() == WorkflowState::AwaitingPermission {
        let Some(event) = events.recv().await else {
            tracing::warn!("The host stopped sending events before permission was settled.");
            break;
        };

        workflow = on_blocking_pool(workflow, move |workflow| workflow.handle_event(event)).await?;
    }

    Ok(workflow)
}

async fn on_blocking_pool<S, L, H, F>(
    mut workflow: Workflow<S, L, H>,
    f: F,
) -> Result<Workflow<S, L, H>, Error>
where
    S: TransactionStore + Send + 'static,
    L: LocationService + Send + 'static,
    H: PermissionHost + Send + 'static,
    F: FnOnce(&mut Workflow<S, L, H>) -> Result<(), Error> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let result = f(&mut workflow);
        workflow.record_error(result);
        workflow
    })
    .await
    .map_err(|error| Error::TaskFailed(error.to_string()))
}

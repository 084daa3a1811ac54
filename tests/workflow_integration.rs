//! End-to-end tests for the promotion workflow pipeline.
//!
//! These tests drive the real orchestrator and the full eight-step registry
//! against in-memory fakes: canned collaborators, the in-memory state store,
//! and a recording notifier. No external services are contacted.

use async_trait::async_trait;
use promoforge::collaborators::{ContentGenerator, FilingService};
use promoforge::error::{CollaboratorError, NotifyError, StoreError};
use promoforge::notify::{CompletionNotifier, NotifyPayload};
use promoforge::steps::{default_registry, names, PipelineDeps};
use promoforge::store::{MemoryStateStore, StateStore};
use promoforge::workflow::{
    Orchestrator, RegenerationController, StateRecord, WorkflowState, WorkflowStatus,
};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Collaborator that always returns the same fields, or always fails.
struct CannedCollaborator {
    fields: Map<String, Value>,
    failure: Option<String>,
}

impl CannedCollaborator {
    fn returning(pairs: &[(&str, Value)]) -> Arc<Self> {
        let mut fields = Map::new();
        for (key, value) in pairs {
            fields.insert((*key).to_string(), value.clone());
        }
        Arc::new(Self {
            fields,
            failure: None,
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fields: Map::new(),
            failure: Some(message.to_string()),
        })
    }

    fn result(&self) -> Result<Map<String, Value>, CollaboratorError> {
        match &self.failure {
            Some(message) => Err(CollaboratorError::Service {
                service: "canned".to_string(),
                message: message.clone(),
            }),
            None => Ok(self.fields.clone()),
        }
    }
}

#[async_trait]
impl ContentGenerator for CannedCollaborator {
    async fn generate(
        &self,
        _event_data: &Map<String, Value>,
        _preferences: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CollaboratorError> {
        self.result()
    }
}

#[async_trait]
impl FilingService for CannedCollaborator {
    async fn set_up(
        &self,
        _event_data: &Map<String, Value>,
        _artifacts: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CollaboratorError> {
        self.result()
    }
}

#[derive(Default)]
struct RecordingNotifier {
    payloads: Mutex<Vec<NotifyPayload>>,
}

impl RecordingNotifier {
    fn payloads(&self) -> Vec<NotifyPayload> {
        self.payloads.lock().expect("lock not poisoned").clone()
    }
}

#[async_trait]
impl CompletionNotifier for RecordingNotifier {
    async fn notify(&self, state: &WorkflowState) -> Result<(), NotifyError> {
        self.payloads
            .lock()
            .expect("lock not poisoned")
            .push(NotifyPayload::from_state(state));
        Ok(())
    }
}

/// Deps where every collaborator succeeds with plausible output.
fn healthy_deps() -> PipelineDeps {
    PipelineDeps {
        flyer: CannedCollaborator::returning(&[
            ("url", json!("https://assets.test/flyer.png")),
            ("asset_id", json!("design-7")),
            ("design_notes", json!("bold headline, venue photo")),
        ]),
        social: CannedCollaborator::returning(&[
            ("instagram", json!("Join us this Saturday!")),
            ("linkedin", json!("Our community fair returns.")),
            ("twitter", json!("Fair time!")),
            ("facebook", json!("Everyone welcome.")),
        ]),
        broadcast: CannedCollaborator::returning(&[
            ("message", json!("The fair is back, doors open at 10am.")),
            ("broadcast_suggestions", json!(["members", "volunteers"])),
        ]),
        storage: CannedCollaborator::returning(&[
            ("folder_id", json!("folder-9")),
            ("folder_url", json!("https://drive.test/folder-9")),
            ("files", json!(["flyer.png"])),
        ]),
        calendar: CannedCollaborator::returning(&[
            ("event_id", json!("cal-3")),
            ("event_url", json!("https://calendar.test/cal-3")),
            ("invite_sent", json!(true)),
        ]),
        tracker: CannedCollaborator::returning(&[
            ("task_id", json!("task-5")),
            ("task_url", json!("https://tracker.test/task-5")),
            ("checklist_items", json!(["print flyers", "book stalls"])),
        ]),
    }
}

fn event_data() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("title".to_string(), json!("Autumn Street Fair"));
    map.insert(
        "description".to_string(),
        json!("Food stalls, live music, and games for the whole neighbourhood."),
    );
    map.insert("start_date".to_string(), json!("2026-10-03T10:00:00Z"));
    map.insert("location".to_string(), json!("Riverside Park"));
    map
}

struct Harness {
    orchestrator: Orchestrator,
    store: Arc<MemoryStateStore>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(deps: PipelineDeps) -> Harness {
    let store = Arc::new(MemoryStateStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = Orchestrator::new(
        store.clone(),
        Arc::new(default_registry(deps)),
        notifier.clone(),
        chrono::Duration::minutes(3),
    );
    Harness {
        orchestrator,
        store,
        notifier,
    }
}

async fn wait_terminal(orchestrator: &Orchestrator, run_id: &str) -> StateRecord {
    for _ in 0..200 {
        if let Some(record) = orchestrator
            .get_status(run_id)
            .await
            .expect("status read succeeds")
        {
            if record.status.is_terminal() {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("run {run_id} did not reach a terminal status");
}

#[tokio::test]
async fn test_full_pipeline_produces_all_assets() {
    let h = harness(healthy_deps());

    let started = h
        .orchestrator
        .start_workflow("run-1", "event-1", event_data(), Map::new(), Map::new())
        .await;
    assert_eq!(started.status, WorkflowStatus::InProgress);
    assert_eq!(started.progress_percentage, 0);

    let record = wait_terminal(&h.orchestrator, "run-1").await;

    assert_eq!(record.status, WorkflowStatus::Completed);
    assert_eq!(record.current_step, "completed");
    assert_eq!(record.progress_percentage, 100);
    assert_eq!(record.completed_steps.len(), 8);
    assert!(record.failed_steps.is_empty());

    // One artifact from every family.
    assert_eq!(
        record.artifacts["flyer_url"],
        json!("https://assets.test/flyer.png")
    );
    assert_eq!(
        record.artifacts["instagram_caption"],
        json!("Join us this Saturday!")
    );
    assert_eq!(
        record.artifacts["broadcast_message"],
        json!("The fair is back, doors open at 10am.")
    );
    assert_eq!(record.artifacts["storage_folder_id"], json!("folder-9"));
    assert_eq!(record.artifacts["calendar_event_id"], json!("cal-3"));
    assert_eq!(record.artifacts["tracker_task_id"], json!("task-5"));
    assert!(record.artifacts.contains_key("workflow_summary"));

    // Validation defaults landed in preferences.
    assert_eq!(record.preferences["flyer_style"], json!("professional"));

    // Exactly one callback, carrying the terminal status.
    let payloads = h.notifier.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].status, "COMPLETED");
    assert_eq!(payloads[0].event_id, "event-1");
    assert_eq!(payloads[0].completed_steps.len(), 8);

    // The stored record matches what status reported.
    let stored = h
        .store
        .get("run-1")
        .await
        .expect("store read succeeds")
        .expect("record persisted");
    assert_eq!(stored, record);
}

#[tokio::test]
async fn test_missing_required_field_fails_fast() {
    let h = harness(healthy_deps());

    let mut incomplete = event_data();
    incomplete.remove("title");
    h.orchestrator
        .start_workflow("run-2", "event-2", incomplete, Map::new(), Map::new())
        .await;

    let record = wait_terminal(&h.orchestrator, "run-2").await;

    assert_eq!(record.status, WorkflowStatus::Failed);
    assert_eq!(record.current_step, "error");
    assert_eq!(record.failed_steps, vec!["validate_input"]);
    let message = record.error_message.expect("failure carries a message");
    assert!(message.contains("title"), "unexpected message: {message}");

    // Nothing downstream ran.
    assert!(record.completed_steps.is_empty());
    assert!(!record.artifacts.contains_key("flyer_url"));
    assert!(!record.artifacts.contains_key("calendar_event_id"));

    let payloads = h.notifier.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].status, "FAILED");
}

#[tokio::test]
async fn test_flyer_outage_does_not_block_filing_steps() {
    let mut deps = healthy_deps();
    deps.flyer = CannedCollaborator::failing("render timeout");

    let h = harness(deps);
    h.orchestrator
        .start_workflow("run-3", "event-3", event_data(), Map::new(), Map::new())
        .await;

    let record = wait_terminal(&h.orchestrator, "run-3").await;

    // The run still completes; the flyer failure and the resulting missing
    // flyer_url for social content are both recorded.
    assert_eq!(record.status, WorkflowStatus::Completed);
    assert_eq!(
        record.failed_steps,
        vec!["create_flyer", "create_social_content"]
    );
    assert!(record.artifacts.contains_key("create_flyer_error"));
    assert!(record.artifacts.contains_key("create_social_content_error"));
    assert!(!record.artifacts.contains_key("flyer_url"));
    assert!(!record.artifacts.contains_key("instagram_caption"));

    // Later steps were unaffected.
    assert_eq!(record.artifacts["broadcast_message"], json!("The fair is back, doors open at 10am."));
    assert_eq!(record.artifacts["calendar_event_id"], json!("cal-3"));
    assert_eq!(record.artifacts["tracker_task_id"], json!("task-5"));

    // 6 of 8 steps completed.
    assert_eq!(record.completed_steps.len(), 6);
    assert_eq!(record.progress_percentage, 75);

    assert_eq!(h.notifier.payloads()[0].status, "COMPLETED");
}

#[tokio::test]
async fn test_regenerate_broadcast_after_completion() {
    let h = harness(healthy_deps());
    h.orchestrator
        .start_workflow("run-4", "event-4", event_data(), Map::new(), Map::new())
        .await;
    let first = wait_terminal(&h.orchestrator, "run-4").await;
    assert_eq!(first.status, WorkflowStatus::Completed);

    // Replay only the broadcast step with a fresh collaborator output.
    let mut registry_deps = healthy_deps();
    registry_deps.broadcast = CannedCollaborator::returning(&[
        ("message", json!("Rescheduled to Sunday, same place.")),
        ("broadcast_suggestions", json!(["members"])),
    ]);
    let controller = RegenerationController::new(
        h.store.clone(),
        Arc::new(default_registry(registry_deps)),
        h.notifier.clone(),
    );

    let record = controller
        .regenerate(
            "run-4",
            &[names::CREATE_BROADCAST_MESSAGE.to_string()],
            Map::new(),
        )
        .await
        .expect("regeneration succeeds");

    assert_eq!(record.status, WorkflowStatus::Completed);
    assert_eq!(
        record.current_step,
        "regenerated:create_broadcast_message"
    );
    assert_eq!(
        record.artifacts["broadcast_message"],
        json!("Rescheduled to Sunday, same place.")
    );
    // Untouched assets survive the replay.
    assert_eq!(record.artifacts["flyer_url"], first.artifacts["flyer_url"]);
    assert_eq!(
        record.artifacts["calendar_event_id"],
        first.artifacts["calendar_event_id"]
    );

    // Two callbacks total: original completion plus the regeneration.
    let payloads = h.notifier.payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[1].status, "COMPLETED");
}

#[tokio::test]
async fn test_run_completes_despite_store_failures() {
    // Durability is best-effort: a dead store costs persistence, never
    // progress. The run keeps executing in memory and still notifies.
    struct BrokenStore;

    #[async_trait]
    impl StateStore for BrokenStore {
        async fn put(&self, _record: &StateRecord) -> Result<(), StoreError> {
            Err(StoreError::ConnectionFailed("redis unreachable".to_string()))
        }

        async fn get(&self, _run_id: &str) -> Result<Option<StateRecord>, StoreError> {
            Err(StoreError::ConnectionFailed("redis unreachable".to_string()))
        }
    }

    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = Orchestrator::new(
        Arc::new(BrokenStore),
        Arc::new(default_registry(healthy_deps())),
        notifier.clone(),
        chrono::Duration::minutes(3),
    );

    let started = orchestrator
        .start_workflow("run-6", "event-6", event_data(), Map::new(), Map::new())
        .await;
    assert_eq!(started.status, WorkflowStatus::InProgress);

    // With every store read failing, completion is observed through the
    // callback instead of a status query.
    for _ in 0..200 {
        if !notifier.payloads().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let payloads = notifier.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].status, "COMPLETED");
    assert_eq!(payloads[0].completed_steps.len(), 8);
    assert!(payloads[0].failed_steps.is_empty());
}

#[tokio::test]
async fn test_cancel_stops_remaining_steps() {
    // A slow storage collaborator keeps the run in flight long enough to
    // cancel it deterministically.
    struct SlowFiler;

    #[async_trait]
    impl FilingService for SlowFiler {
        async fn set_up(
            &self,
            _event_data: &Map<String, Value>,
            _artifacts: &Map<String, Value>,
        ) -> Result<Map<String, Value>, CollaboratorError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(Map::new())
        }
    }

    let mut deps = healthy_deps();
    deps.storage = Arc::new(SlowFiler);

    let h = harness(deps);
    h.orchestrator
        .start_workflow("run-5", "event-5", event_data(), Map::new(), Map::new())
        .await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.orchestrator.cancel("run-5").await);
    // A second cancel is a no-op.
    assert!(!h.orchestrator.cancel("run-5").await);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let record = h
        .store
        .get("run-5")
        .await
        .expect("store read succeeds")
        .expect("record persisted");
    assert_eq!(record.status, WorkflowStatus::Cancelled);
    assert_eq!(record.current_step, "cancelled");
    // Steps after the cancellation point never ran.
    assert!(!record.artifacts.contains_key("calendar_event_id"));
    assert!(!record.artifacts.contains_key("workflow_summary"));

    // Cancelled runs do not fire the completion callback.
    assert!(h.notifier.payloads().is_empty());
}

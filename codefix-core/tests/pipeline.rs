//! End-to-end request pipelines over in-memory ports.

use std::collections::BTreeSet;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use codefix_core::adapters::{InMemoryDiagnosticSource, InMemoryProject};
use codefix_core::observe::{RequestMetrics, RequestObserver};
use codefix_core::ports::DiagnosticSource;
use codefix_core::settings::ServiceSettings;
use codefix_core::{
    CancelSignal, CoreError, FixService, ProjectSnapshot, ProviderRegistry, Selection,
    builtin_providers, endpoints,
};
use codefix_diagnostics::RuleLevels;
use codefix_domain::{CandidateFix, FixContext, FixProvider};
use codefix_edit::{
    CodeOperation, Document, DocumentId, LiveProject, OpFut, SideEffectOperation,
};
use codefix_types::diagnostic::{Diagnostic, DocumentDiagnostics, SourceSpan};
use codefix_types::edit::{Position, apply_text_edits};
use codefix_types::response::{RunFixRequest, RunFixResponse};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

const A: DocumentId = DocumentId::new(1);
const B: DocumentId = DocumentId::new(2);

const A_TEXT: &str = "using System;\nclass A {\n    int x = 1;;\n}\n";
const B_TEXT: &str = "class B {\n    int y;\n}\n";

/// Replaces the diagnostic's line with a comment.
struct CommentOut {
    id: &'static str,
    rule: &'static str,
}

impl FixProvider for CommentOut {
    fn id(&self) -> &str {
        self.id
    }

    fn fixable_diagnostic_ids(&self) -> BTreeSet<String> {
        BTreeSet::from([self.rule.to_string()])
    }

    fn register_fixes<'a>(&'a self, ctx: &'a mut FixContext) -> OpFut<'a, ()> {
        Box::pin(async move {
            let document = ctx.document().id;
            let line = ctx.span().line;
            ctx.register(CommentOutLine {
                title: format!("Fix {}", self.rule),
                key: format!("{}.fix", self.rule),
                document,
                line,
            });
            Ok(())
        })
    }
}

struct CommentOutLine {
    title: String,
    key: String,
    document: DocumentId,
    line: u32,
}

impl CandidateFix for CommentOutLine {
    fn title(&self) -> &str {
        &self.title
    }

    fn equivalence_key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn operations<'a>(
        &'a self,
        snapshot: &'a ProjectSnapshot,
        _cancel: &'a CancelSignal,
    ) -> OpFut<'a, Vec<CodeOperation>> {
        Box::pin(async move {
            let doc = snapshot
                .document(self.document)
                .ok_or_else(|| anyhow::anyhow!("document gone"))?;
            let mut out = String::new();
            for (i, line) in doc.text.lines().enumerate() {
                if i as u32 + 1 == self.line {
                    out.push_str("// fixed");
                } else {
                    out.push_str(line);
                }
                out.push('\n');
            }
            Ok(vec![
                CodeOperation::ApplyChanges(snapshot.with_text(self.document, out)?),
                CodeOperation::OpenDocument(self.document),
            ])
        })
    }
}

struct Failing {
    rule: &'static str,
    panics: bool,
}

impl FixProvider for Failing {
    fn id(&self) -> &str {
        if self.panics { "panicking" } else { "failing" }
    }

    fn fixable_diagnostic_ids(&self) -> BTreeSet<String> {
        BTreeSet::from([self.rule.to_string()])
    }

    fn register_fixes<'a>(&'a self, _ctx: &'a mut FixContext) -> OpFut<'a, ()> {
        Box::pin(async move {
            if self.panics {
                panic!("provider exploded");
            }
            Err::<(), _>(anyhow::anyhow!("provider bug"))
        })
    }
}

/// How a [`Scripted`] fix behaves when its operations are computed.
#[derive(Clone)]
enum Script {
    Fails,
    Panics,
    /// Edits A, cancels the request from a side effect, then edits A again.
    CancelsMidway(CancelSignal),
}

struct Scripted(Script);

impl FixProvider for Scripted {
    fn id(&self) -> &str {
        "scripted"
    }

    fn fixable_diagnostic_ids(&self) -> BTreeSet<String> {
        BTreeSet::from(["RULE1".to_string()])
    }

    fn register_fixes<'a>(&'a self, ctx: &'a mut FixContext) -> OpFut<'a, ()> {
        Box::pin(async move {
            ctx.register(ScriptedFix(self.0.clone()));
            Ok(())
        })
    }
}

struct ScriptedFix(Script);

impl CandidateFix for ScriptedFix {
    fn title(&self) -> &str {
        "Scripted fix"
    }

    fn equivalence_key(&self) -> Option<&str> {
        Some("RULE1.scripted")
    }

    fn operations<'a>(
        &'a self,
        snapshot: &'a ProjectSnapshot,
        _cancel: &'a CancelSignal,
    ) -> OpFut<'a, Vec<CodeOperation>> {
        Box::pin(async move {
            match &self.0 {
                Script::Fails => Err::<Vec<CodeOperation>, _>(anyhow::anyhow!("cannot build edit")),
                Script::Panics => panic!("fix exploded"),
                Script::CancelsMidway(signal) => {
                    let first = snapshot.with_text(A, "// first\n")?;
                    let second = first.with_text(A, "// second\n")?;
                    Ok(vec![
                        CodeOperation::ApplyChanges(first),
                        CodeOperation::SideEffect(Arc::new(CancelRequest(signal.clone()))),
                        CodeOperation::ApplyChanges(second),
                    ])
                }
            }
        })
    }
}

#[derive(Debug)]
struct CancelRequest(CancelSignal);

impl SideEffectOperation for CancelRequest {
    fn title(&self) -> &str {
        "cancel request"
    }

    fn apply<'a>(&'a self, _project: &'a dyn LiveProject) -> OpFut<'a, ()> {
        Box::pin(async move {
            self.0.cancel();
            Ok(())
        })
    }
}

struct BrokenSource;

impl DiagnosticSource for BrokenSource {
    fn get_diagnostics<'a>(
        &'a self,
        _files: Option<&'a [Utf8PathBuf]>,
    ) -> OpFut<'a, Vec<DocumentDiagnostics>> {
        Box::pin(async {
            Err::<Vec<DocumentDiagnostics>, _>(anyhow::anyhow!("rule engine unavailable"))
        })
    }
}

#[derive(Default)]
struct Recording {
    seen: Mutex<Vec<RequestMetrics>>,
}

impl RequestObserver for Recording {
    fn on_request(&self, metrics: &RequestMetrics) {
        self.seen.lock().push(metrics.clone());
    }
}

fn span(file: &str, line: u32, column: u32, end_column: u32) -> SourceSpan {
    SourceSpan {
        file_name: file.into(),
        line,
        column,
        end_line: line,
        end_column,
        text: None,
    }
}

fn diagnostics() -> Vec<DocumentDiagnostics> {
    vec![
        DocumentDiagnostics {
            file_name: "A.cs".into(),
            project: Some("App".to_string()),
            diagnostics: vec![
                Diagnostic::new("RULE1", span("A.cs", 3, 5, 15)).with_message("rule one"),
                Diagnostic::new("RULE2", span("A.cs", 1, 1, 6)).with_message("rule two"),
            ],
        },
        DocumentDiagnostics {
            file_name: "B.cs".into(),
            project: Some("App".to_string()),
            diagnostics: vec![Diagnostic::new("RULE1", span("B.cs", 2, 5, 11))],
        },
    ]
}

fn snapshot() -> ProjectSnapshot {
    ProjectSnapshot::from_documents([
        Document::new(A, "A.cs", A_TEXT).in_project("App"),
        Document::new(B, "B.cs", B_TEXT).in_project("App"),
    ])
}

fn providers() -> Vec<Arc<dyn FixProvider>> {
    vec![
        Arc::new(CommentOut {
            id: "comment-out",
            rule: "RULE1",
        }),
        Arc::new(Failing {
            rule: "RULE2",
            panics: false,
        }),
        Arc::new(Failing {
            rule: "RULE1",
            panics: true,
        }),
    ]
}

struct Harness {
    service: FixService,
    project: Arc<InMemoryProject>,
}

fn harness_with(settings: ServiceSettings) -> Harness {
    let registry = Arc::new(ProviderRegistry::new(providers()).expect("unique providers"));
    let project = Arc::new(InMemoryProject::new(snapshot()));
    let service = FixService::new(
        registry,
        Arc::new(InMemoryDiagnosticSource::new(diagnostics())),
        project.clone(),
        settings,
    );
    Harness { service, project }
}

fn scripted_harness(script: Script) -> Harness {
    let registry =
        Arc::new(ProviderRegistry::new(vec![Arc::new(Scripted(script))]).expect("registry"));
    let project = Arc::new(InMemoryProject::new(snapshot()));
    let service = FixService::new(
        registry,
        Arc::new(InMemoryDiagnosticSource::new(diagnostics())),
        project.clone(),
        ServiceSettings::default(),
    );
    Harness { service, project }
}

fn harness() -> Harness {
    harness_with(ServiceSettings::default())
}

fn live_text(project: &InMemoryProject, id: DocumentId) -> String {
    project
        .current_snapshot()
        .document(id)
        .expect("document")
        .text
        .to_string()
}

#[tokio::test]
async fn rule_one_in_a_single_file_gets_its_fix() {
    let h = harness();
    let response = h
        .service
        .list_fixes_for_diagnostics(Some(Utf8Path::new("A.cs")), &CancelSignal::new())
        .await
        .expect("listing");

    let ids: Vec<&str> = response.quick_fixes.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["RULE1", "RULE2"]);

    let rule1 = &response.quick_fixes[0];
    assert_eq!((rule1.line, rule1.column), (3, 5));
    assert_eq!(rule1.text, "rule one");
    assert_eq!(rule1.fixes.len(), 1);

    let fix = &rule1.fixes[0];
    assert_eq!(fix.message, "Fix RULE1");
    assert_eq!(fix.file_edits.len(), 1);
    assert_eq!(fix.file_edits[0].file_name, Utf8PathBuf::from("A.cs"));

    let fixed = apply_text_edits(A_TEXT, &fix.file_edits[0].edits).expect("edits apply");
    assert_eq!(fixed, "using System;\nclass A {\n// fixed\n}\n");

    // Listing never touches the live project.
    assert_eq!(live_text(&h.project, A), A_TEXT);
    assert!(h.project.opened_documents().is_empty());
}

#[tokio::test]
async fn failing_provider_keeps_location_without_fixes() {
    let h = harness();
    let response = h
        .service
        .list_fixes_for_diagnostics(Some(Utf8Path::new("A.cs")), &CancelSignal::new())
        .await
        .expect("listing");

    let rule2 = &response.quick_fixes[1];
    assert_eq!(rule2.id, "RULE2");
    assert!(rule2.fixes.is_empty());
}

#[tokio::test]
async fn all_files_listing_matches_sharded_listing() {
    let h = harness();
    let cancel = CancelSignal::new();

    let whole = h
        .service
        .list_fixes_for_diagnostics(None, &cancel)
        .await
        .expect("whole");
    let sharded = h
        .service
        .list_fixes_for_files(
            &[Utf8PathBuf::from("A.cs"), Utf8PathBuf::from("B.cs")],
            &cancel,
        )
        .await
        .expect("sharded");

    assert_eq!(whole.quick_fixes.len(), 3);
    assert_eq!(sharded.quick_fixes.len(), 3);
    assert_eq!(whole.fix_count(), 2);
    assert_eq!(sharded.fix_count(), 2);
}

#[tokio::test]
async fn suppressed_rules_are_not_reported() {
    let settings = ServiceSettings {
        rules: RuleLevels::from_table([("RULE2".to_string(), false)]),
        ..ServiceSettings::default()
    };
    let h = harness_with(settings);
    let response = h
        .service
        .list_fixes_for_diagnostics(None, &CancelSignal::new())
        .await
        .expect("listing");
    assert!(response.quick_fixes.iter().all(|l| l.id == "RULE1"));
    assert_eq!(response.quick_fixes.len(), 2);
}

#[tokio::test]
async fn available_fixes_respect_selection() {
    let h = harness();
    let cancel = CancelSignal::new();

    let all = h
        .service
        .list_available_fixes(Utf8Path::new("A.cs"), None, &cancel)
        .await
        .expect("available");
    assert_eq!(all.code_actions.len(), 1);
    assert_eq!(all.code_actions[0].identifier, "RULE1.fix");
    assert_eq!(all.code_actions[0].title, "Fix RULE1");
    assert_eq!(all.code_actions[0].diagnostic_id, "RULE1");

    let first_line = Selection {
        start: Position::new(1, 1),
        end: Position::new(1, 3),
    };
    let none = h
        .service
        .list_available_fixes(Utf8Path::new("A.cs"), Some(first_line), &cancel)
        .await
        .expect("available");
    assert!(none.code_actions.is_empty());
}

#[tokio::test]
async fn run_named_fix_previews_without_publishing() {
    let h = harness();
    let request = RunFixRequest::new("A.cs", "RULE1.fix");
    let response = h
        .service
        .run_named_fix(&request, &CancelSignal::new())
        .await
        .expect("run");

    assert_eq!(response.file_edits.len(), 1);
    assert!(response.opened.is_empty());
    assert_eq!(live_text(&h.project, A), A_TEXT);
    // Side effects still run against the live project.
    assert_eq!(h.project.opened_documents(), vec![A]);
}

#[tokio::test]
async fn run_named_fix_applies_immediately_once() {
    let h = harness();
    let request = RunFixRequest {
        wants_all_operations: true,
        apply_immediately: true,
        ..RunFixRequest::new("A.cs", "RULE1.fix")
    };
    let before = h.project.current_snapshot().version();
    let response = h
        .service
        .run_named_fix(&request, &CancelSignal::new())
        .await
        .expect("run");

    assert_eq!(response.opened, vec![Utf8PathBuf::from("A.cs")]);
    assert_eq!(
        live_text(&h.project, A),
        "using System;\nclass A {\n// fixed\n}\n"
    );
    assert_ne!(h.project.current_snapshot().version(), before);
    assert_eq!(live_text(&h.project, B), B_TEXT);
}

#[tokio::test]
async fn rejected_publish_leaves_outside_edit_in_place() {
    struct Racing(InMemoryProject);

    impl LiveProject for Racing {
        fn current_snapshot(&self) -> ProjectSnapshot {
            self.0.current_snapshot()
        }

        fn open_document(&self, id: DocumentId) -> OpFut<'_, ()> {
            // Someone else edits B while the fix is running.
            let edited = self
                .0
                .current_snapshot()
                .with_text(B, "class B2 {}\n")
                .expect("known");
            self.0.replace(edited);
            self.0.open_document(id)
        }
    }

    impl codefix_core::ports::ProjectModel for Racing {
        fn wait_for_fully_loaded<'a>(
            &'a self,
            file: &'a Utf8Path,
        ) -> OpFut<'a, Option<Document>> {
            self.0.wait_for_fully_loaded(file)
        }

        fn publish(&self, base: codefix_edit::SnapshotVersion, snapshot: ProjectSnapshot) -> bool {
            self.0.publish(base, snapshot)
        }
    }

    let registry = Arc::new(ProviderRegistry::new(providers()).expect("unique providers"));
    let project = Arc::new(Racing(InMemoryProject::new(snapshot())));
    let service = FixService::new(
        registry,
        Arc::new(InMemoryDiagnosticSource::new(diagnostics())),
        project.clone(),
        ServiceSettings::default(),
    );

    let request = RunFixRequest {
        apply_immediately: true,
        ..RunFixRequest::new("A.cs", "RULE1.fix")
    };
    let response = service
        .run_named_fix(&request, &CancelSignal::new())
        .await
        .expect("run");

    assert_eq!(response.file_edits.len(), 1);
    assert_eq!(live_text(&project.0, A), A_TEXT);
    assert_eq!(live_text(&project.0, B), "class B2 {}\n");
}

#[tokio::test]
async fn unknown_identifier_is_a_contract_error() {
    let h = harness();
    let err = h
        .service
        .run_named_fix(
            &RunFixRequest::new("A.cs", "does-not-exist"),
            &CancelSignal::new(),
        )
        .await
        .expect_err("unknown fix");
    assert!(matches!(err, CoreError::UnknownFix { .. }));
    assert!(err.is_contract_violation());
}

#[tokio::test]
async fn diagnostic_source_failure_fails_the_request() {
    let registry = Arc::new(ProviderRegistry::new(providers()).expect("unique providers"));
    let service = FixService::new(
        registry,
        Arc::new(BrokenSource),
        Arc::new(InMemoryProject::new(snapshot())),
        ServiceSettings::default(),
    );
    let err = service
        .list_fixes_for_diagnostics(None, &CancelSignal::new())
        .await
        .expect_err("source failure");
    assert!(matches!(err, CoreError::DiagnosticSource(_)));
    assert!(err.to_string().contains("rule engine unavailable"));
}

#[tokio::test]
async fn cancelled_request_is_an_error_not_an_empty_response() {
    let h = harness();
    let cancel = CancelSignal::new();
    cancel.cancel();

    let err = h
        .service
        .list_fixes_for_diagnostics(None, &cancel)
        .await
        .expect_err("cancelled");
    assert!(err.is_cancelled());

    let request = RunFixRequest {
        apply_immediately: true,
        ..RunFixRequest::new("A.cs", "RULE1.fix")
    };
    let err = h
        .service
        .run_named_fix(&request, &cancel)
        .await
        .expect_err("cancelled");
    assert!(err.is_cancelled());
    assert_eq!(live_text(&h.project, A), A_TEXT);
}

#[tokio::test]
async fn failing_fix_runs_to_an_empty_response_and_publishes_nothing() {
    for script in [Script::Fails, Script::Panics] {
        let h = scripted_harness(script);
        let before = h.project.current_snapshot().version();
        let request = RunFixRequest {
            apply_immediately: true,
            ..RunFixRequest::new("A.cs", "RULE1.scripted")
        };

        let response = h.service.run_named_fix(&request, &CancelSignal::new()).await;

        assert_eq!(response.expect("degrades"), RunFixResponse::default());
        assert_eq!(live_text(&h.project, A), A_TEXT);
        assert_eq!(h.project.current_snapshot().version(), before);
    }
}

#[tokio::test]
async fn cancelling_mid_fix_unwinds_without_publishing() {
    let cancel = CancelSignal::new();
    let h = scripted_harness(Script::CancelsMidway(cancel.clone()));
    let before = h.project.current_snapshot().version();
    let request = RunFixRequest {
        apply_immediately: true,
        ..RunFixRequest::new("A.cs", "RULE1.scripted")
    };

    let err = h
        .service
        .run_named_fix(&request, &cancel)
        .await
        .expect_err("cancelled");

    assert!(matches!(err, CoreError::Cancelled(_)));
    assert_eq!(live_text(&h.project, A), A_TEXT);
    assert_eq!(h.project.current_snapshot().version(), before);
}

#[tokio::test]
async fn observer_sees_one_record_per_request() {
    let recording = Arc::new(Recording::default());
    let h = harness();
    let service = h.service.with_observer(recording.clone());

    service
        .list_fixes_for_diagnostics(Some(Utf8Path::new("A.cs")), &CancelSignal::new())
        .await
        .expect("listing");

    let seen = recording.seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].endpoint, endpoints::CODE_CHECK_WITH_FIXES);
    assert_eq!(seen[0].file_name, Some(Utf8PathBuf::from("A.cs")));
    assert_eq!(seen[0].locations, 2);
    assert_eq!(seen[0].fixes, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn builtin_empty_statement_fix_end_to_end() {
    let registry = Arc::new(ProviderRegistry::new(builtin_providers()).expect("builtins"));
    let project = Arc::new(InMemoryProject::new(snapshot()));
    let source = InMemoryDiagnosticSource::new(vec![DocumentDiagnostics {
        file_name: "A.cs".into(),
        project: None,
        diagnostics: vec![Diagnostic::new("S1116", span("A.cs", 3, 15, 16))],
    }]);
    let service = FixService::new(
        registry,
        Arc::new(source),
        project.clone(),
        ServiceSettings::default(),
    );

    let listed = service
        .list_fixes_for_diagnostics(None, &CancelSignal::new())
        .await
        .expect("listing");
    assert_eq!(listed.fix_count(), 1);
    assert_eq!(
        listed.quick_fixes[0].fixes[0].message,
        "Remove this empty statement"
    );

    let request = RunFixRequest {
        apply_immediately: true,
        ..RunFixRequest::new("A.cs", "S1116.remove")
    };
    service
        .run_named_fix(&request, &CancelSignal::new())
        .await
        .expect("run");
    assert_eq!(
        live_text(&project, A),
        "using System;\nclass A {\n    int x = 1;\n}\n"
    );
}

// Integration tests for the diagnostics coordinator and worker transport
use std::time::Duration;

use mcesql_core::config::CoordinatorConfig;
use mcesql_core::coordinator::{CoordinatorState, DiagnosticsCoordinator, ManualClock};
use mcesql_core::error::{Diagnostic, Severity, Span};
use mcesql_core::worker::{InlineWorker, ThreadWorker, WorkerResponse, DEEP_PARSE_RULE_ID};
use pretty_assertions::assert_eq;

fn session() -> (DiagnosticsCoordinator<InlineWorker, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let coordinator = DiagnosticsCoordinator::with_clock(
        InlineWorker::new(),
        clock.clone(),
        CoordinatorConfig::default(),
    );
    (coordinator, clock)
}

#[test]
fn test_stale_response_does_not_change_merge() {
    let (mut coordinator, clock) = session();
    coordinator.on_text_change("SELECT a FROM T WHERE", None);
    clock.advance(Duration::from_millis(300));
    coordinator.poll();
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    let before = coordinator.diagnostics().to_vec();

    // request 1 is the latest; anything else is stale
    for request_id in [0, 2, 99] {
        coordinator.handle_response(WorkerResponse::LintResult {
            request_id,
            diagnostics: vec![Diagnostic::error(DEEP_PARSE_RULE_ID, "stale result")
                .with_span(Span::new(0, 6))],
        });
    }
    assert_eq!(coordinator.diagnostics(), before.as_slice());
}

#[test]
fn test_superseded_request_is_discarded() {
    let (mut coordinator, clock) = session();
    coordinator.on_text_change("SELECT a FROM T WHERE", None);
    clock.advance(Duration::from_millis(300));
    coordinator.settle();
    assert!(coordinator
        .diagnostics()
        .iter()
        .any(|d| d.rule_id == DEEP_PARSE_RULE_ID));

    // the fixed text gets request 2; a late answer for request 1 is ignored
    coordinator.on_text_change("SELECT a FROM T WHERE a = 1", None);
    coordinator.settle();
    assert!(coordinator.diagnostics().is_empty());

    coordinator.handle_response(WorkerResponse::LintResult {
        request_id: 1,
        diagnostics: vec![Diagnostic::error(DEEP_PARSE_RULE_ID, "Syntax error: old")
            .with_span(Span::new(16, 21))],
    });
    assert!(coordinator.diagnostics().is_empty());
}

#[test]
fn test_prereq_hides_parse_noise_but_not_policy_errors() {
    let (mut coordinator, _) = session();
    let sql = "SELECT a FROM ";
    coordinator.on_text_change(sql, Some(sql.len()));
    coordinator.settle();

    let diagnostics = coordinator.diagnostics();
    assert!(diagnostics.iter().any(|d| d.severity == Severity::Prereq));
    assert!(diagnostics.iter().all(|d| d.rule_id != DEEP_PARSE_RULE_ID));
    assert!(coordinator.has_blocking_diagnostics());
    assert_eq!(
        coordinator.first_blocking_diagnostic().map(|d| d.severity),
        Some(Severity::Prereq)
    );
}

#[test]
fn test_deep_parse_duplicates_collapse() {
    let (mut coordinator, _) = session();
    coordinator.on_text_change("SELECT TOP 5 a FROM T LIMIT 10", None);
    coordinator.settle();
    let limit: Vec<_> = coordinator
        .diagnostics()
        .iter()
        .filter(|d| d.message == "LIMIT is not supported in MCE SQL")
        .collect();
    assert!(limit.len() <= 1, "{limit:?}");
}

#[test]
fn test_schema_change_relints() {
    let (mut coordinator, _) = session();
    coordinator.on_text_change("SELECT * FROM Sent Emails", None);
    assert!(coordinator
        .diagnostics()
        .iter()
        .all(|d| d.rule_id != "unbracketed-name"));

    let schema = mcesql_core::schema::SchemaCatalog::from_json(r#"[{"name": "Sent Emails"}]"#).unwrap();
    coordinator.set_schema(Some(schema));
    assert!(coordinator
        .diagnostics()
        .iter()
        .any(|d| d.rule_id == "unbracketed-name"));
}

#[test]
fn test_thread_worker_session() {
    let worker = ThreadWorker::spawn().unwrap();
    let mut coordinator = DiagnosticsCoordinator::new(worker, CoordinatorConfig::default());
    coordinator.init().unwrap();

    coordinator.on_text_change("DELETE FROM Contacts", None);
    assert!(coordinator.time_until_dispatch().is_some());
    coordinator.settle();

    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    let diagnostics = coordinator.diagnostics();
    assert!(diagnostics.iter().any(|d| d.rule_id == "prohibited-keyword"));
    assert!(diagnostics
        .iter()
        .any(|d| d.rule_id == DEEP_PARSE_RULE_ID && d.message.contains("not supported")));
    for pair in diagnostics.windows(2) {
        assert!(pair[0].span.start <= pair[1].span.start);
    }
}

// Integration tests for the synchronous lint pass
use mcesql_core::config::LintConfig;
use mcesql_core::coordinator::merge_diagnostics;
use mcesql_core::error::{has_blocking_diagnostics, Diagnostic, Severity};
use mcesql_core::linter::{lint, LintOptions, Linter};
use mcesql_core::schema::SchemaCatalog;
use pretty_assertions::assert_eq;

const CORPUS: &[&str] = &[
    "",
    "SELECT",
    "SELECT a, b, FROM T",
    "SELECT * FROM A LIMIT 10",
    "SELECT * FROM A JOIN B WHERE A.id = 1",
    "SELECT c.Id, o.Total FROM Contacts c LEFT JOIN Orders o ON o.ContactId = c.Id",
    "UPDATE Contacts SET Name = 'Test' WHERE Id = 1",
    "WITH x AS (SELECT 1 AS a) SELECT a FROM x",
    "SELECT a FROM (SELECT a FROM T ORDER BY a)",
    "SELECT 'unterminated FROM T",
    "SELECT [unterminated FROM T",
    "SELECT a /* open comment FROM T",
    "SELECT ((a FROM T",
    "SELECT a)) FROM T",
    "SELECT 'ünïcödé' AS naïve, @v FROM [Dätä Ëxt] WHERE x != 1;",
    "SELECT a FROM T; DROP TABLE T;",
    "SELECT Region, COUNT(*) AS n FROM Orders WHERE SUM(Total) > 1 GROUP BY n",
    "SELECT * FROM ENT.All Active Subscribers s WITH (NOLOCK) WHERE s.Id NOT IN (SELECT Id FROM Unsubs)",
];

fn schema() -> SchemaCatalog {
    SchemaCatalog::from_json(
        r#"[
            {
                "name": "Contacts",
                "customerKey": "contacts_key",
                "fields": [
                    {"name": "Id", "type": "Number", "isPrimaryKey": true, "isNullable": false},
                    {"name": "Email", "type": "EmailAddress"}
                ]
            },
            {
                "name": "Orders",
                "customerKey": "orders_key",
                "isShared": true,
                "fields": [
                    {"name": "Id", "type": "Number"},
                    {"name": "ContactId", "type": "Number"},
                    {"name": "Total", "type": "Decimal"}
                ]
            }
        ]"#,
    )
    .unwrap()
}

fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect()
}

#[test]
fn test_scenario_update_is_rejected() {
    let diagnostics = lint("UPDATE Contacts SET Name = 'Test' WHERE Id = 1", &LintOptions::default());
    assert!(errors(&diagnostics)
        .iter()
        .any(|d| d.message.contains("UPDATE")));
}

#[test]
fn test_scenario_limit() {
    let diagnostics = lint("SELECT * FROM A LIMIT 10", &LintOptions::default());
    let errors = errors(&diagnostics);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].message.contains("LIMIT"));

    let diagnostics = lint("SELECT TOP 10 * FROM A", &LintOptions::default());
    assert!(diagnostics.iter().all(|d| d.rule_id != "limit"));
}

#[test]
fn test_scenario_group_by() {
    let diagnostics = lint(
        "SELECT a, b, c, COUNT(*) FROM [T] GROUP BY a, b",
        &LintOptions::default(),
    );
    let grouping: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.rule_id == "aggregate-grouping")
        .collect();
    assert_eq!(grouping.len(), 1);
    assert_eq!(grouping[0].severity, Severity::Error);
    assert!(grouping[0].message.contains("'c'"));

    let diagnostics = lint(
        "SELECT a, b, c, COUNT(*) FROM [T] GROUP BY a, b, c",
        &LintOptions::default(),
    );
    assert!(diagnostics.iter().all(|d| d.rule_id != "aggregate-grouping"));
}

#[test]
fn test_scenario_join_without_on() {
    let diagnostics = lint("SELECT * FROM A JOIN B WHERE A.id = 1", &LintOptions::default());
    let on_errors: Vec<_> = errors(&diagnostics)
        .into_iter()
        .filter(|d| d.message.contains("ON clause"))
        .collect();
    assert_eq!(on_errors.len(), 1);

    let sql = "SELECT * FROM A CROSS JOIN B";
    let cross = sql.find("CROSS").unwrap();
    let diagnostics = lint(sql, &LintOptions::default());
    assert!(diagnostics.iter().all(|d| d.span.start != cross));
}

#[test]
fn test_scenario_empty_sql_blocks() {
    let diagnostics = lint("", &LintOptions::default());
    assert!(diagnostics.iter().any(|d| d.severity == Severity::Prereq));
    assert!(has_blocking_diagnostics(&diagnostics));
}

#[test]
fn test_clean_query_has_no_diagnostics() {
    let schema = schema();
    let sql = "SELECT c.Id, c.Email, o.Total FROM Contacts c INNER JOIN Orders o ON o.ContactId = c.Id WHERE o.Total > 10";
    let diagnostics = lint(sql, &LintOptions::default().with_schema(&schema));
    assert_eq!(diagnostics, vec![]);
}

#[test]
fn test_lint_is_idempotent() {
    let schema = schema();
    let linter = Linter::default();
    for sql in CORPUS {
        let options = LintOptions::default().with_schema(&schema).with_cursor(sql.len());
        assert_eq!(linter.lint(sql, &options), linter.lint(sql, &options), "{sql}");
    }
}

#[test]
fn test_offsets_are_valid() {
    let schema = schema();
    let linter = Linter::default();
    for sql in CORPUS {
        let report = linter.lint_report(sql, &LintOptions::default().with_schema(&schema));
        assert!(report.failed_rules.is_empty(), "{sql}: {:?}", report.failed_rules);
        for d in &report.diagnostics {
            assert!(d.span.start <= d.span.end, "{sql}: {d:?}");
            assert!(d.span.end <= sql.len(), "{sql}: {d:?}");
            assert!(sql.is_char_boundary(d.span.start) && sql.is_char_boundary(d.span.end));
        }
    }
}

#[test]
fn test_patterns_in_comments_and_strings_are_ignored() {
    let base = lint("SELECT a FROM T", &LintOptions::default());
    assert_eq!(base, vec![]);

    for sql in [
        "SELECT a FROM T -- UPDATE x SET y = 1; LIMIT 5 @v != 1 WITH (NOLOCK)",
        "SELECT a FROM T /* DELETE FROM T; SELECT * FROM A JOIN B TRY_CONVERT(x) IN () */",
        "SELECT a, 'DROP LIMIT @x !=' AS b FROM T",
        "SELECT [Order By Limit], \"SET\" FROM T",
    ] {
        assert_eq!(lint(sql, &LintOptions::default()), vec![], "{sql}");
    }
}

#[test]
fn test_merged_lint_output_is_sorted() {
    let schema = schema();
    for sql in CORPUS {
        let diagnostics = lint(sql, &LintOptions::default().with_schema(&schema));
        let merged = merge_diagnostics(&diagnostics, &[]);
        for pair in merged.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.span.start <= b.span.start, "{sql}");
            if a.span.start == b.span.start {
                assert!(a.severity.priority() <= b.severity.priority(), "{sql}");
                if a.severity == b.severity {
                    assert!(a.span.end >= b.span.end, "{sql}");
                }
            }
        }
    }
}

#[test]
fn test_disabled_rules_are_skipped() {
    let linter = Linter::new(LintConfig {
        disabled_rules: vec!["LIMIT".to_string(), "select-star".to_string()],
    });
    let diagnostics = linter.lint("SELECT * FROM A LIMIT 10", &LintOptions::default());
    assert_eq!(diagnostics, vec![]);
}

#[test]
fn test_schema_key_resolves_ambiguity() {
    let schema = schema();
    let sql = "SELECT Id FROM contacts_key c JOIN [Orders] o ON o.ContactId = c.Id";
    let diagnostics = lint(sql, &LintOptions::default().with_schema(&schema));
    let ambiguous: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.rule_id == "ambiguous-field")
        .collect();
    assert_eq!(ambiguous.len(), 1);
    assert_eq!(&sql[ambiguous[0].span.start..ambiguous[0].span.end], "Id");
}

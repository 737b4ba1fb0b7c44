//! mcesql CLI - lint Marketing Cloud Engagement query activity SQL

mod args;
mod config;
mod output;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mcesql_core::{
    has_blocking_diagnostics, DiagnosticsCoordinator, LintConfig, LintOptions, Linter, MceDialect,
    SchemaCatalog, Severity, ThreadWorker,
};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::Level;

use crate::args::{Args, Command};
use crate::config::{CheckArgs, Config};
use crate::output::OutputFormatter;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match (args.quiet, args.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let quiet = args.quiet;
    match args.command {
        Command::Check {
            files,
            schema,
            format,
            cursor,
            deep,
            disable,
            config: config_path,
        } => {
            let config = if let Some(path) = config_path {
                Config::from_file(&path)?
            } else {
                Config::find_and_load()?.unwrap_or_default()
            };
            let config = config.merge_with_args(CheckArgs {
                files: &files,
                schema: &schema,
                format,
                deep,
                disable: &disable,
            });
            check(config, cursor, quiet)
        }

        Command::Rules => {
            let linter = Linter::default();
            for rule in linter.rules() {
                println!("{:<24} {}", rule.id(), rule.name());
            }
            Ok(false)
        }

        Command::Schema { file } => {
            let catalog = load_schema(&file)?;

            println!("Data extensions:");
            println!("================");
            for table in catalog.tables() {
                let shared = if table.is_shared { " (shared)" } else { "" };
                println!("\n{}{} [key: {}]", table.name, shared, table.customer_key);
                for field in &table.fields {
                    let nullable = if field.is_nullable { "NULL" } else { "NOT NULL" };
                    let key = if field.is_primary_key { " PRIMARY KEY" } else { "" };
                    println!(
                        "    - {} {} {}{}",
                        field.name,
                        field.field_type.display_name(),
                        nullable,
                        key
                    );
                }
            }

            Ok(false)
        }

        Command::Parse { file } => {
            // Parse and display AST (for debugging)
            let content = fs::read_to_string(&file).into_diagnostic()?;

            use sqlparser::parser::Parser;

            let dialect = MceDialect.parser_dialect();
            match Parser::parse_sql(dialect.as_ref(), &content) {
                Ok(statements) => {
                    for (i, stmt) in statements.iter().enumerate() {
                        println!("Statement {}:", i + 1);
                        println!("{:#?}", stmt);
                        println!();
                    }
                }
                Err(e) => {
                    eprintln!("Parse error: {}", e);
                    return Ok(true);
                }
            }

            Ok(false)
        }
    }
}

fn check(config: Config, cursor: Option<usize>, quiet: bool) -> Result<bool> {
    let catalog = config.schema.as_deref().map(load_schema).transpose()?;

    let mut query_files = Vec::new();
    for pattern in &config.files {
        if pattern.contains('*') {
            for path in glob::glob(pattern).into_diagnostic()?.flatten() {
                query_files.push(path);
            }
        } else {
            query_files.push(PathBuf::from(pattern));
        }
    }

    if query_files.is_empty() {
        miette::bail!(
            "No query files specified. Use positional arguments or configure in mcesql.toml"
        );
    }

    let lint_config = LintConfig {
        disabled_rules: config.disable.clone(),
    };
    let output_format = config.format.unwrap_or_default();

    let mut session = if config.deep {
        let worker = ThreadWorker::spawn()?;
        let mut coordinator = DiagnosticsCoordinator::new(worker, config.coordinator.clone())
            .with_linter(Linter::new(lint_config.clone()));
        coordinator.init()?;
        coordinator.set_schema(catalog.clone());
        Some(coordinator)
    } else {
        None
    };
    let linter = Linter::new(lint_config);

    let mut total_errors = 0;
    let mut total_warnings = 0;
    let mut blocked = false;

    for query_file in &query_files {
        let content = fs::read_to_string(query_file)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", query_file.display()))?;

        let diagnostics = match session.as_mut() {
            Some(coordinator) => {
                coordinator.on_text_change(content.as_str(), cursor);
                coordinator.settle();
                coordinator.diagnostics().to_vec()
            }
            None => {
                let mut options = LintOptions::default();
                if let Some(catalog) = &catalog {
                    options = options.with_schema(catalog);
                }
                if let Some(cursor) = cursor {
                    options = options.with_cursor(cursor);
                }
                linter.lint(&content, &options)
            }
        };

        blocked |= has_blocking_diagnostics(&diagnostics);
        for diag in &diagnostics {
            match diag.severity {
                Severity::Error | Severity::Prereq => total_errors += 1,
                Severity::Warning => total_warnings += 1,
            }
        }

        if !diagnostics.is_empty() {
            let formatter = OutputFormatter::new(output_format, query_file.display().to_string());
            formatter.print_diagnostics(&diagnostics, &content);
        }
    }

    if !quiet {
        if total_errors > 0 || total_warnings > 0 {
            eprintln!();
            eprintln!(
                "Found {} error(s), {} warning(s) in {} file(s)",
                total_errors,
                total_warnings,
                query_files.len()
            );
        } else {
            eprintln!("All {} file(s) passed validation", query_files.len());
        }
    }

    Ok(blocked)
}

fn load_schema(path: &std::path::Path) -> Result<SchemaCatalog> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    Ok(SchemaCatalog::from_json(&content)?)
}

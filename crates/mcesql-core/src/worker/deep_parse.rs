//! Structural parse run by the worker

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::parser::{Parser, ParserError};
use tracing::trace;

use crate::dialect::MceDialect;
use crate::error::{Diagnostic, Span};
use crate::scanner::{is_word_char, statement_segments, tokenize, Token};

pub const DEEP_PARSE_RULE_ID: &str = "deep-parse";

/// Parses each statement with the T-SQL grammar and reports syntax errors
/// plus the policy violations visible in the AST.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeepParser {
    dialect: MceDialect,
}

impl DeepParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&self, sql: &str) -> Vec<Diagnostic> {
        let dialect = self.dialect.parser_dialect();
        let mut diagnostics = Vec::new();

        for segment in statement_segments(sql) {
            let text = &sql[segment.clone()];
            match Parser::parse_sql(dialect.as_ref(), text) {
                Ok(statements) => {
                    trace!(start = segment.start, count = statements.len(), "parsed segment");
                    for statement in &statements {
                        diagnostics.extend(check_statement(statement, text, segment.start));
                    }
                }
                Err(err) => diagnostics.push(syntax_error(&err, text, segment.clone())),
            }
        }

        diagnostics
    }
}

fn check_statement(statement: &Statement, text: &str, base: usize) -> Vec<Diagnostic> {
    let code: Vec<Token<'_>> = tokenize(text).into_iter().filter(|t| !t.is_trivia()).collect();
    let Some(first) = code.first() else {
        return Vec::new();
    };
    let shift = |span: Span| Span::new(span.start + base, span.end + base);

    let Statement::Query(query) = statement else {
        return vec![Diagnostic::error(
            DEEP_PARSE_RULE_ID,
            format!("{} statements are not supported in MCE SQL: only SELECT is allowed", first.upper()),
        )
        .with_span(shift(first.span()))];
    };

    let mut diagnostics = Vec::new();
    if query.with.is_some() {
        let end = code.get(1).unwrap_or(first).end;
        diagnostics.push(
            Diagnostic::error(
                DEEP_PARSE_RULE_ID,
                "Common table expressions (WITH ... AS) are not supported in MCE SQL",
            )
            .with_span(shift(Span::new(first.start, end))),
        );
    }
    if query.limit.is_some() {
        let limit = code
            .iter()
            .find(|t| t.depth == 0 && t.is_keyword("LIMIT"))
            .unwrap_or(first);
        diagnostics.push(
            Diagnostic::error(DEEP_PARSE_RULE_ID, "LIMIT is not supported in MCE SQL")
                .with_span(shift(limit.span()))
                .with_help("Use SELECT TOP n instead."),
        );
    }
    diagnostics
}

fn position_regex() -> &'static Regex {
    static POSITION: OnceLock<Regex> = OnceLock::new();
    POSITION.get_or_init(|| {
        Regex::new(r"\s*at Line:\s*(\d+)\s*,\s*Column:\s*(\d+)").expect("invalid position pattern")
    })
}

fn syntax_error(err: &ParserError, text: &str, segment: Range<usize>) -> Diagnostic {
    let raw = err.to_string();
    let position = position_regex().captures(&raw).and_then(|caps| {
        let line: usize = caps.get(1)?.as_str().parse().ok()?;
        let column: usize = caps.get(2)?.as_str().parse().ok()?;
        offset_at(text, line, column)
    });

    let message = position_regex().replace(&raw, "");
    let message = message.trim_start_matches("sql parser error: ").trim();

    let local = match position {
        Some(offset) => word_span(text, offset),
        // no usable position: mark the statement itself
        None => {
            let start = text.len() - text.trim_start().len();
            Span::new(start, text.trim_end().len())
        }
    };

    Diagnostic::error(DEEP_PARSE_RULE_ID, format!("Syntax error: {message}"))
        .with_span(Span::new(segment.start + local.start, segment.start + local.end))
}

/// Byte offset of a 1-based line/column (columns count characters)
fn offset_at(text: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }
    let line_start = if line == 1 {
        0
    } else {
        text.match_indices('\n').nth(line - 2).map(|(i, _)| i + 1)?
    };
    let rest = &text[line_start..];
    let column_offset = rest
        .char_indices()
        .nth(column - 1)
        .map_or(rest.len(), |(i, _)| i);
    Some(line_start + column_offset)
}

/// The word (or single character) starting at `offset`
fn word_span(text: &str, offset: usize) -> Span {
    let rest = &text[offset..];
    let word_len: usize = rest
        .chars()
        .take_while(|c| is_word_char(*c))
        .map(char::len_utf8)
        .sum();
    let len = match word_len {
        0 => rest.chars().next().map_or(0, char::len_utf8),
        n => n,
    };
    Span::new(offset, offset + len)
}

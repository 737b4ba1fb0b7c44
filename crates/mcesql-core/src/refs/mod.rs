//! Table references - what follows FROM and JOIN

use crate::dialect;
use crate::error::Span;
use crate::query::{matching_paren, SelectScope};
use crate::scanner::{Token, TokenKind};
use crate::schema::QualifiedName;

/// A table (or derived table) named in a FROM or JOIN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    /// Raw reference text, e.g. `ENT.[My DE]`; `(subquery)` for derived tables
    pub name: String,
    pub alias: Option<String>,
    pub is_bracketed: bool,
    pub is_subquery: bool,
    /// Covers the name, or the whole parenthesized subquery
    pub span: Span,
    /// Parenthesis depth of the FROM/JOIN keyword
    pub depth: usize,
    /// Index of the FROM/JOIN keyword in the code view
    pub keyword: usize,
}

impl TableReference {
    /// Name without prefix or brackets, lowercased
    pub fn normalized_name(&self) -> String {
        QualifiedName::parse(&self.name).normalized()
    }

    /// Alias if present, otherwise the unqualified table name
    pub fn exposed_name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| QualifiedName::parse(&self.name).name)
    }

    /// Does this reference belong to the given SELECT scope?
    pub fn in_scope(&self, scope: &SelectScope) -> bool {
        self.depth == scope.depth && scope.contains(self.keyword)
    }
}

/// Extract table references after FROM and JOIN
///
/// With `depth` set, only keywords at that nesting depth are considered.
/// Comma-separated FROM lists yield one reference per item.
pub fn extract_table_references(code: &[Token<'_>], depth: Option<usize>) -> Vec<TableReference> {
    let mut refs = Vec::new();
    for (i, token) in code.iter().enumerate() {
        if !(token.is_keyword("FROM") || token.is_keyword("JOIN")) {
            continue;
        }
        if depth.is_some_and(|d| d != token.depth) {
            continue;
        }

        let mut next = i + 1;
        while let Some((reference, after)) = parse_reference(code, next, i) {
            refs.push(reference);
            match code.get(after) {
                Some(t) if t.is_symbol(',') && t.depth == token.depth && token.is_keyword("FROM") => {
                    next = after + 1;
                }
                _ => break,
            }
        }
    }
    refs
}

fn parse_reference(code: &[Token<'_>], start: usize, keyword: usize) -> Option<(TableReference, usize)> {
    let first = code.get(start)?;
    let depth = code[keyword].depth;

    let (name, is_bracketed, is_subquery, span, mut next) = if first.is_symbol('(') {
        if !code.get(start + 1).is_some_and(|t| t.is_keyword("SELECT")) {
            return None;
        }
        let Some(close) = matching_paren(code, start) else {
            let last = code.last().unwrap_or(first);
            let reference = TableReference {
                name: "(subquery)".to_string(),
                alias: None,
                is_bracketed: false,
                is_subquery: true,
                span: Span::new(first.start, last.end),
                depth,
                keyword,
            };
            return Some((reference, code.len()));
        };
        (
            "(subquery)".to_string(),
            false,
            true,
            Span::new(first.start, code[close].end),
            close + 1,
        )
    } else if is_name_part(first) {
        let mut end = start;
        while code.get(end + 1).is_some_and(|t| t.is_symbol('.'))
            && code.get(end + 2).is_some_and(is_name_part)
        {
            end += 2;
        }
        let last = &code[end];
        (
            code[start..=end].iter().map(|t| t.text).collect::<String>(),
            last.kind == TokenKind::Bracket,
            false,
            Span::new(first.start, last.end),
            end + 1,
        )
    } else {
        return None;
    };

    let mut alias = None;
    if code.get(next).is_some_and(|t| t.is_keyword("AS")) {
        if let Some(t) = code.get(next + 1).filter(|t| is_alias(t)) {
            alias = Some(t.ident_value());
            next += 2;
        } else {
            next += 1;
        }
    } else if let Some(t) = code.get(next).filter(|t| is_alias(t)) {
        alias = Some(t.ident_value());
        next += 1;
    }

    Some((
        TableReference {
            name,
            alias,
            is_bracketed,
            is_subquery,
            span,
            depth,
            keyword,
        },
        next,
    ))
}

fn is_name_part(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Word => !token.is_number() && !dialect::is_reserved(token.text),
        TokenKind::Bracket | TokenKind::Quoted => true,
        _ => false,
    }
}

fn is_alias(token: &Token<'_>) -> bool {
    is_name_part(token)
}

//! Per-invocation lint context

use crate::query::{select_scopes, SelectScope};
use crate::refs::{extract_table_references, TableReference};
use crate::scanner::{tokenize, Token};
use crate::schema::SchemaCatalog;

/// Everything a rule may look at. Built once per lint cycle, read-only.
pub struct LintContext<'a> {
    /// The full SQL source text.
    pub sql: &'a str,
    /// Every token, trivia included.
    pub tokens: Vec<Token<'a>>,
    pub schema: Option<&'a SchemaCatalog>,
    /// Editor cursor, when linting live text.
    pub cursor_offset: Option<usize>,
    code: Vec<Token<'a>>,
    scopes: Vec<SelectScope>,
    table_refs: Vec<TableReference>,
}

impl<'a> LintContext<'a> {
    pub fn new(sql: &'a str, schema: Option<&'a SchemaCatalog>, cursor_offset: Option<usize>) -> Self {
        let tokens = tokenize(sql);
        let code: Vec<Token<'a>> = tokens.iter().copied().filter(|t| !t.is_trivia()).collect();
        let scopes = select_scopes(&code);
        let table_refs = extract_table_references(&code, None);
        Self {
            sql,
            tokens,
            schema,
            cursor_offset: cursor_offset.map(|c| c.min(sql.len())),
            code,
            scopes,
            table_refs,
        }
    }

    /// Significant tokens: no whitespace, no comments.
    pub fn code(&self) -> &[Token<'a>] {
        &self.code
    }

    pub fn scopes(&self) -> &[SelectScope] {
        &self.scopes
    }

    /// Every FROM/JOIN reference, in source order.
    pub fn table_refs(&self) -> &[TableReference] {
        &self.table_refs
    }

    pub fn refs_in_scope<'s>(
        &'s self,
        scope: &'s SelectScope,
    ) -> impl Iterator<Item = &'s TableReference> + 's {
        self.table_refs.iter().filter(move |r| r.in_scope(scope))
    }
}

//! Query structure over the significant-token view
//!
//! Everything here indexes into a slice of non-trivia tokens (see
//! [`crate::linter::LintContext::code`]). A [`SelectScope`] is one `SELECT`
//! and the tokens that belong to it: the scope ends at a set operator, a
//! `;`, another `SELECT` at the same depth, or the `)` that closes its
//! parentheses. Clause keywords only count at the scope's own depth, so
//! subqueries and function arguments never split the outer query.

use std::ops::Range;

use crate::dialect::{self, SET_OPERATORS};
use crate::scanner::{Token, TokenKind};

/// A clause keyword and the tokens after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Index of the first keyword (`GROUP` for `GROUP BY`)
    pub keyword: usize,
    pub body: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectScope {
    /// Index of the `SELECT` token
    pub select: usize,
    /// Exclusive end index
    pub end: usize,
    pub depth: usize,
    /// Select list after `DISTINCT` / `TOP n`
    pub select_list: Range<usize>,
    pub from: Option<Clause>,
    pub where_clause: Option<Clause>,
    pub group_by: Option<Clause>,
    pub having: Option<Clause>,
    pub order_by: Option<Clause>,
}

impl SelectScope {
    pub fn contains(&self, index: usize) -> bool {
        index >= self.select && index < self.end
    }

    /// Clauses in which a select-list alias is not visible, with display names
    pub fn restricted_clauses(&self) -> Vec<(&'static str, &Clause)> {
        [
            ("WHERE", self.where_clause.as_ref()),
            ("GROUP BY", self.group_by.as_ref()),
            ("HAVING", self.having.as_ref()),
            ("ORDER BY", self.order_by.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, clause)| clause.map(|c| (name, c)))
        .collect()
    }

    /// Does the FROM clause contain a join at this scope's depth?
    pub fn has_join(&self, code: &[Token<'_>]) -> bool {
        self.from.as_ref().is_some_and(|from| {
            code[from.body.clone()]
                .iter()
                .any(|t| t.depth == self.depth && t.is_keyword("JOIN"))
        })
    }
}

/// A single expression in a select list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    /// The whole item, alias included
    pub range: Range<usize>,
    /// The expression without its alias
    pub expr: Range<usize>,
    /// Index of the alias token
    pub alias: Option<usize>,
}

pub fn select_scopes(code: &[Token<'_>]) -> Vec<SelectScope> {
    code.iter()
        .enumerate()
        .filter(|(_, t)| t.is_keyword("SELECT"))
        .map(|(i, t)| build_scope(code, i, t.depth))
        .collect()
}

fn build_scope(code: &[Token<'_>], select: usize, depth: usize) -> SelectScope {
    let end = scope_end(code, select, depth);

    let mut markers: Vec<(&'static str, usize, usize)> = Vec::new();
    let mut j = select + 1;
    while j < end {
        let token = &code[j];
        if token.depth == depth {
            let followed_by_by = code.get(j + 1).is_some_and(|t| t.is_keyword("BY"));
            if token.is_keyword("FROM") {
                markers.push(("FROM", j, j + 1));
            } else if token.is_keyword("WHERE") {
                markers.push(("WHERE", j, j + 1));
            } else if token.is_keyword("HAVING") {
                markers.push(("HAVING", j, j + 1));
            } else if token.is_keyword("GROUP") && followed_by_by {
                markers.push(("GROUP", j, j + 2));
                j += 1;
            } else if token.is_keyword("ORDER") && followed_by_by {
                markers.push(("ORDER", j, j + 2));
                j += 1;
            }
        }
        j += 1;
    }

    let list_start = skip_select_modifiers(code, select + 1, end);
    let list_end = markers.first().map_or(end, |m| m.1);
    let mut scope = SelectScope {
        select,
        end,
        depth,
        select_list: list_start..list_end.max(list_start),
        from: None,
        where_clause: None,
        group_by: None,
        having: None,
        order_by: None,
    };

    for (n, &(kind, keyword, body_start)) in markers.iter().enumerate() {
        let body_end = markers.get(n + 1).map_or(end, |m| m.1);
        let clause = Clause {
            keyword,
            body: body_start.min(body_end)..body_end,
        };
        let slot = match kind {
            "FROM" => &mut scope.from,
            "WHERE" => &mut scope.where_clause,
            "HAVING" => &mut scope.having,
            "GROUP" => &mut scope.group_by,
            _ => &mut scope.order_by,
        };
        // first occurrence wins
        if slot.is_none() {
            *slot = Some(clause);
        }
    }

    scope
}

fn scope_end(code: &[Token<'_>], select: usize, depth: usize) -> usize {
    for (j, token) in code.iter().enumerate().skip(select + 1) {
        if token.depth < depth {
            return j;
        }
        if token.depth == depth
            && (token.is_any_keyword(SET_OPERATORS)
                || token.is_keyword("SELECT")
                || token.is_symbol(';'))
        {
            return j;
        }
    }
    code.len()
}

/// Skip `ALL`, `DISTINCT` and `TOP n [PERCENT] [WITH TIES]`
fn skip_select_modifiers(code: &[Token<'_>], mut i: usize, end: usize) -> usize {
    while i < end {
        let token = &code[i];
        if token.is_keyword("ALL") || token.is_keyword("DISTINCT") {
            i += 1;
        } else if token.is_keyword("TOP") {
            i += 1;
            if i < end && code[i].is_symbol('(') {
                i = matching_paren(code, i).map_or(end, |close| close + 1);
            } else if i < end && code[i].is_number() {
                i += 1;
            }
            if i < end && code[i].is_keyword("PERCENT") {
                i += 1;
            }
            if i + 1 < end && code[i].is_keyword("WITH") && code[i + 1].is_keyword("TIES") {
                i += 2;
            }
        } else {
            break;
        }
    }
    i.min(end)
}

/// Index of the `)` closing the `(` at `open`
pub fn matching_paren(code: &[Token<'_>], open: usize) -> Option<usize> {
    let depth = code.get(open)?.depth;
    code.iter()
        .enumerate()
        .skip(open + 1)
        .find(|(_, t)| t.depth == depth && t.is_symbol(')'))
        .map(|(i, _)| i)
}

/// Ranges of `( SELECT ... )` subqueries, parentheses included
///
/// An unterminated subquery runs to the end of the token slice.
pub fn subquery_spans(code: &[Token<'_>]) -> Vec<Range<usize>> {
    code.iter()
        .enumerate()
        .filter(|(i, t)| {
            t.is_symbol('(') && code.get(i + 1).is_some_and(|n| n.is_keyword("SELECT"))
        })
        .map(|(i, _)| i..matching_paren(code, i).map_or(code.len(), |close| close + 1))
        .collect()
}

/// Split the select list on top-level commas and detect aliases
pub fn select_items(code: &[Token<'_>], scope: &SelectScope) -> Vec<SelectItem> {
    let mut items = Vec::new();
    let mut start = scope.select_list.start;
    for i in scope.select_list.clone() {
        if code[i].depth == scope.depth && code[i].is_symbol(',') {
            if start < i {
                items.push(build_item(code, start..i, scope.depth));
            }
            start = i + 1;
        }
    }
    if start < scope.select_list.end {
        items.push(build_item(code, start..scope.select_list.end, scope.depth));
    }
    items
}

fn build_item(code: &[Token<'_>], range: Range<usize>, depth: usize) -> SelectItem {
    let (s, e) = (range.start, range.end);
    let at_depth = |i: usize| code[i].depth == depth;

    // expr AS alias
    if e - s >= 3 && at_depth(e - 2) && code[e - 2].is_keyword("AS") && is_alias_token(&code[e - 1])
    {
        return SelectItem {
            range,
            expr: s..e - 2,
            alias: Some(e - 1),
        };
    }

    // alias = expr
    if e - s >= 3 && is_alias_token(&code[s]) && code[s + 1].is_symbol('=') && at_depth(s + 1) {
        return SelectItem {
            range,
            expr: s + 2..e,
            alias: Some(s),
        };
    }

    // expr alias
    if e - s >= 2 && at_depth(e - 1) && at_depth(e - 2) && is_alias_token(&code[e - 1]) {
        let prev = &code[e - 2];
        let separated = prev.end < code[e - 1].start;
        let prev_ends_expr = separated
            && (prev.is_symbol(')')
                || prev.is_keyword("END")
                || prev.is_string()
                || prev.is_number()
                || (prev.is_identifier() && !(prev.is_word() && dialect::is_reserved(prev.text))));
        if prev_ends_expr {
            return SelectItem {
                range,
                expr: s..e - 1,
                alias: Some(e - 1),
            };
        }
    }

    SelectItem {
        range: range.clone(),
        expr: range,
        alias: None,
    }
}

fn is_alias_token(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Word => !token.is_number() && !dialect::is_reserved(token.text),
        TokenKind::Bracket | TokenKind::Quoted | TokenKind::String => true,
        _ => false,
    }
}

/// Only literals: strings, numbers, NULL, signs and `N'...'` prefixes
pub fn is_literal(code: &[Token<'_>], expr: Range<usize>) -> bool {
    let tokens = &code[expr];
    let mut saw_value = false;
    for (i, token) in tokens.iter().enumerate() {
        let unicode_prefix = token.is_keyword("N")
            && tokens
                .get(i + 1)
                .is_some_and(|next| next.is_string() && next.start == token.end);
        if token.is_string() || token.is_number() || token.is_keyword("NULL") {
            saw_value = true;
        } else if !(unicode_prefix
            || token.is_symbol('-')
            || token.is_symbol('+')
            || token.is_symbol('.'))
        {
            return false;
        }
    }
    saw_value
}

/// A bare `*` or `alias.*`
pub fn is_star(code: &[Token<'_>], expr: Range<usize>) -> bool {
    code[expr].last().is_some_and(|t| t.is_symbol('*'))
}

/// A bare `*` that is not qualified with a table alias
pub fn is_unqualified_star(code: &[Token<'_>], expr: Range<usize>) -> bool {
    expr.len() == 1 && code[expr.start].is_symbol('*')
}

/// Is the word at `index` a function name (followed by `(`)?
pub fn is_function_call(code: &[Token<'_>], index: usize) -> bool {
    code[index].is_word() && code.get(index + 1).is_some_and(|t| t.is_symbol('('))
}

/// Index of an aggregate call in `expr` that is not a window function
///
/// Aggregates inside a subquery of the expression belong to that subquery.
pub fn find_aggregate(code: &[Token<'_>], expr: Range<usize>) -> Option<usize> {
    let nested: Vec<Range<usize>> = subquery_spans(code)
        .into_iter()
        .filter(|span| expr.contains(&span.start))
        .collect();
    expr.filter(|&i| !nested.iter().any(|span| span.contains(&i)))
        .filter(|&i| dialect::is_aggregate(code[i].text) && is_function_call(code, i))
        .find(|&i| {
            let windowed = matching_paren(code, i + 1)
                .and_then(|close| code.get(close + 1))
                .is_some_and(|t| t.is_keyword("OVER"));
            !windowed
        })
}

/// Could the token at `index` be a column reference?
pub fn is_column_word(code: &[Token<'_>], index: usize) -> bool {
    let token = &code[index];
    match token.kind {
        TokenKind::Bracket | TokenKind::Quoted => true,
        TokenKind::Word => {
            !token.is_number()
                && !dialect::is_reserved(token.text)
                && !dialect::is_builtin_word(token.text)
                && !is_function_call(code, index)
                && !(token.is_keyword("N")
                    && code
                        .get(index + 1)
                        .is_some_and(|n| n.is_string() && n.start == token.end))
        }
        _ => false,
    }
}

/// Does the expression reference any column (as opposed to literals and
/// niladic functions)?
pub fn references_columns(code: &[Token<'_>], expr: Range<usize>) -> bool {
    expr.into_iter().any(|i| is_column_word(code, i))
}

/// Source text of a token range
pub fn text_of<'a>(sql: &'a str, code: &[Token<'_>], range: Range<usize>) -> &'a str {
    match (code.get(range.start), range.end.checked_sub(1).and_then(|i| code.get(i))) {
        (Some(first), Some(last)) if range.start < range.end => &sql[first.start..last.end],
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::tokenize;

    fn code(sql: &str) -> Vec<Token<'_>> {
        tokenize(sql).into_iter().filter(|t| !t.is_trivia()).collect()
    }

    #[test]
    fn test_scope_clauses() {
        let sql = "SELECT TOP 5 a, b FROM T WHERE x = 1 GROUP BY a, b HAVING COUNT(*) > 1 ORDER BY a";
        let code = code(sql);
        let scopes = select_scopes(&code);
        assert_eq!(scopes.len(), 1);
        let scope = &scopes[0];
        assert_eq!(text_of(sql, &code, scope.select_list.clone()), "a, b");
        assert_eq!(text_of(sql, &code, scope.from.clone().unwrap().body), "T");
        assert_eq!(
            text_of(sql, &code, scope.group_by.clone().unwrap().body),
            "a, b"
        );
        assert_eq!(text_of(sql, &code, scope.order_by.clone().unwrap().body), "a");
    }

    #[test]
    fn test_nested_scope_does_not_split_outer() {
        let sql = "SELECT a FROM T WHERE a IN (SELECT b FROM U WHERE c = 1) ORDER BY a";
        let code = code(sql);
        let scopes = select_scopes(&code);
        assert_eq!(scopes.len(), 2);
        assert!(scopes[0].order_by.is_some());
        assert_eq!(
            text_of(sql, &code, scopes[1].where_clause.clone().unwrap().body),
            "c = 1"
        );
        assert!(scopes[1].order_by.is_none());
    }

    #[test]
    fn test_union_ends_scope() {
        let code = code("SELECT a FROM T UNION ALL SELECT a FROM U");
        let scopes = select_scopes(&code);
        assert_eq!(scopes.len(), 2);
        assert!(scopes[0].end <= scopes[1].select);
    }

    #[test]
    fn test_select_item_aliases() {
        let sql = "SELECT a AS x, COUNT(*) n, Name = b, c.d, 'lit' [Label] FROM T";
        let code = code(sql);
        let scope = &select_scopes(&code)[0];
        let aliases: Vec<Option<String>> = select_items(&code, scope)
            .iter()
            .map(|item| item.alias.map(|i| code[i].ident_value()))
            .collect();
        assert_eq!(
            aliases,
            vec![
                Some("x".to_string()),
                Some("n".to_string()),
                Some("Name".to_string()),
                None,
                Some("Label".to_string()),
            ]
        );
    }

    #[test]
    fn test_literals_and_aggregates() {
        let code = code("SELECT -1, N'x', COUNT(*), COUNT(*) OVER (PARTITION BY a), GETDATE()");
        let scope = &select_scopes(&code)[0];
        let items = select_items(&code, scope);
        assert!(is_literal(&code, items[0].expr.clone()));
        assert!(is_literal(&code, items[1].expr.clone()));
        assert!(find_aggregate(&code, items[2].expr.clone()).is_some());
        assert!(find_aggregate(&code, items[3].expr.clone()).is_none());
        assert!(!references_columns(&code, items[4].expr.clone()));
    }
}

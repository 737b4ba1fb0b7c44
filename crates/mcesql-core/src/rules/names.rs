use super::is_qualified;
use crate::dialect;
use crate::error::{Diagnostic, Span};
use crate::linter::{LintContext, Rule};
use crate::scanner::Token;

/// Data extension names with spaces must be bracketed
///
/// Three or more bare words after FROM/JOIN are always a broken name. Two
/// words could be `Table alias`, so they are only flagged when the pair
/// names a known data extension.
pub struct UnbracketedMultiWordNames;

impl Rule for UnbracketedMultiWordNames {
    fn id(&self) -> &'static str {
        "unbracketed-name"
    }

    fn name(&self) -> &'static str {
        "Unbracketed multi-word name"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Diagnostic> {
        let code = ctx.code();
        let mut diagnostics = Vec::new();

        for (i, token) in code.iter().enumerate() {
            if !(token.is_keyword("FROM") || token.is_keyword("JOIN")) || is_qualified(code, i) {
                continue;
            }

            let mut first = i + 1;
            // ENT.My Data Extension
            if code.get(first).is_some_and(is_bare_word)
                && code.get(first + 1).is_some_and(|t| t.is_symbol('.'))
            {
                first += 2;
            }
            let words: Vec<&Token<'_>> = code[first.min(code.len())..]
                .iter()
                .take_while(|t| is_bare_word(t))
                .collect();

            let flagged = match words.len() {
                0 | 1 => false,
                2 => {
                    let joined = format!("{} {}", words[0].text, words[1].text);
                    ctx.schema.is_some_and(|schema| schema.table_exists(&joined))
                }
                _ => true,
            };
            if !flagged {
                continue;
            }

            let name = words.iter().map(|t| t.text).collect::<Vec<_>>().join(" ");
            let (start, end) = (words[0].start, words[words.len() - 1].end);
            diagnostics.push(
                Diagnostic::error(
                    self.id(),
                    format!("Name '{name}' contains spaces and must be wrapped in brackets"),
                )
                .with_span(Span::new(start, end))
                .with_help(format!("Write it as [{name}].")),
            );
        }

        diagnostics
    }
}

fn is_bare_word(token: &Token<'_>) -> bool {
    token.is_word() && !token.is_number() && !dialect::is_reserved(token.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check, check_with_schema, flagged};
    use crate::schema::{SchemaCatalog, SchemaTable};

    #[test]
    fn test_three_words_always_flagged() {
        let sql = "SELECT * FROM My Data Extension WHERE a = 1";
        let diagnostics = check(&UnbracketedMultiWordNames, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["My Data Extension"]);
        assert_eq!(diagnostics[0].help.as_deref(), Some("Write it as [My Data Extension]."));
    }

    #[test]
    fn test_two_words_need_schema_match() {
        let sql = "SELECT * FROM Sent Emails";
        assert!(check(&UnbracketedMultiWordNames, sql).is_empty());

        let schema = SchemaCatalog::from_tables(vec![SchemaTable::new("sent emails")]).unwrap();
        let diagnostics = check_with_schema(&UnbracketedMultiWordNames, sql, &schema);
        assert_eq!(flagged(sql, &diagnostics), vec!["Sent Emails"]);
    }

    #[test]
    fn test_table_alias_is_fine() {
        let schema = SchemaCatalog::from_tables(vec![SchemaTable::new("Contacts")]).unwrap();
        let sql = "SELECT * FROM Contacts c JOIN [Order Lines] ol ON c.Id = ol.Id";
        assert!(check_with_schema(&UnbracketedMultiWordNames, sql, &schema).is_empty());
    }

    #[test]
    fn test_shared_prefix() {
        let sql = "SELECT * FROM ENT.Active Email Subscribers";
        let diagnostics = check(&UnbracketedMultiWordNames, sql);
        assert_eq!(flagged(sql, &diagnostics), vec!["Active Email Subscribers"]);
    }
}

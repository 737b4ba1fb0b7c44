//! MCE SQL dialect support
//!
//! Query activities run a read-only subset of T-SQL. The keyword and
//! function tables below drive the lint rules; the deep parser hands the
//! text to sqlparser's T-SQL dialect.

use sqlparser::dialect::{Dialect, MsSqlDialect};

/// Statement families that may not appear in a query activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordCategory {
    /// Data modification
    Dml,
    /// Schema modification
    Ddl,
    /// Procedural control flow and variables
    Procedural,
}

const PROHIBITED_KEYWORDS: &[(&str, KeywordCategory)] = &[
    ("INSERT", KeywordCategory::Dml),
    ("UPDATE", KeywordCategory::Dml),
    ("DELETE", KeywordCategory::Dml),
    ("MERGE", KeywordCategory::Dml),
    ("TRUNCATE", KeywordCategory::Dml),
    ("CREATE", KeywordCategory::Ddl),
    ("DROP", KeywordCategory::Ddl),
    ("ALTER", KeywordCategory::Ddl),
    ("GRANT", KeywordCategory::Ddl),
    ("REVOKE", KeywordCategory::Ddl),
    ("DECLARE", KeywordCategory::Procedural),
    ("SET", KeywordCategory::Procedural),
    ("WHILE", KeywordCategory::Procedural),
    ("IF", KeywordCategory::Procedural),
    ("EXEC", KeywordCategory::Procedural),
    ("EXECUTE", KeywordCategory::Procedural),
    ("PRINT", KeywordCategory::Procedural),
    ("GOTO", KeywordCategory::Procedural),
];

/// Functions the platform rejects, with what to use instead
const UNSUPPORTED_FUNCTIONS: &[(&str, &str)] = &[
    ("TRY_CONVERT", "Use CONVERT instead."),
    ("TRY_CAST", "Use CAST instead."),
    ("TRY_PARSE", "Use CONVERT instead."),
    ("PARSE", "Use CONVERT instead."),
    ("STRING_AGG", "Use STUFF with FOR XML PATH instead."),
    ("CONCAT_WS", "Use CONCAT with explicit separators instead."),
    ("TRIM", "Use LTRIM(RTRIM(...)) instead."),
    ("TRANSLATE", "Use nested REPLACE calls instead."),
    ("GREATEST", "Use a CASE expression instead."),
    ("LEAST", "Use a CASE expression instead."),
    ("DATETRUNC", "Use DATEADD with DATEDIFF instead."),
    ("DATE_BUCKET", "Use DATEADD with DATEDIFF instead."),
    ("GENERATE_SERIES", "Join against a numbers table instead."),
    ("STRING_SPLIT", "Use CHARINDEX and SUBSTRING instead."),
    ("OPENJSON", "Use JSON_VALUE instead."),
    ("OPENROWSET", "External data sources are not available."),
    ("OPENQUERY", "External data sources are not available."),
    ("OPENDATASOURCE", "External data sources are not available."),
    ("JSON_OBJECT", "Build the JSON text with CONCAT instead."),
    ("JSON_ARRAY", "Build the JSON text with CONCAT instead."),
];

pub const AGGREGATE_FUNCTIONS: &[&str] = &[
    "COUNT",
    "COUNT_BIG",
    "SUM",
    "AVG",
    "MIN",
    "MAX",
    "STDEV",
    "STDEVP",
    "VAR",
    "VARP",
];

/// Aggregates checked inside WHERE
pub const WHERE_AGGREGATES: &[&str] = &["COUNT", "SUM", "AVG", "MIN", "MAX"];

pub const SET_OPERATORS: &[&str] = &["UNION", "INTERSECT", "EXCEPT"];

/// Words that start a join, in any combination
pub const JOIN_WORDS: &[&str] = &["JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS"];

/// Keywords that end a select list or FROM item
pub const CLAUSE_KEYWORDS: &[&str] = &[
    "FROM", "WHERE", "GROUP", "ORDER", "HAVING", "JOIN", "INNER", "LEFT", "RIGHT", "FULL",
    "CROSS", "OUTER", "UNION", "EXCEPT", "INTERSECT", "ON", "OPTION",
];

const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "ANY", "APPLY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CROSS",
    "CREATE", "DECLARE", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "ESCAPE", "EXCEPT",
    "EXEC", "EXECUTE", "EXISTS", "FETCH", "FOR", "FROM", "FULL", "GROUP", "HAVING", "IF", "IN",
    "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "MERGE", "NOT",
    "NULL", "OFFSET", "ON", "OPTION", "OR", "ORDER", "OUTER", "OVER", "PERCENT", "PIVOT", "RIGHT",
    "ROWS", "SELECT", "SET", "THEN", "TOP", "UNION", "UNPIVOT", "UPDATE", "WHEN", "WHERE",
    "WHILE", "WITH",
];

/// Type names and date parts that appear as bare words inside expressions
const BUILTIN_WORDS: &[&str] = &[
    "BIGINT", "BIT", "CHAR", "DATE", "DATETIME", "DATETIME2", "DATETIMEOFFSET", "DECIMAL",
    "FLOAT", "INT", "MAX", "MONEY", "NCHAR", "NUMERIC", "NVARCHAR", "REAL", "SMALLINT", "TIME",
    "TINYINT", "UNIQUEIDENTIFIER", "VARCHAR", "YEAR", "YY", "YYYY", "QUARTER", "QQ", "MONTH",
    "MM", "DAYOFYEAR", "DY", "DAY", "DD", "WEEK", "WK", "WW", "WEEKDAY", "DW", "HOUR", "HH",
    "MINUTE", "MI", "SECOND", "SS", "MILLISECOND", "MS",
];

/// The query activity dialect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MceDialect;

impl MceDialect {
    /// Get the sqlparser dialect for the deep parse
    pub fn parser_dialect(&self) -> Box<dyn Dialect> {
        Box::new(MsSqlDialect {})
    }
}

pub fn prohibited_keyword(word: &str) -> Option<KeywordCategory> {
    PROHIBITED_KEYWORDS
        .iter()
        .find(|(kw, _)| kw.eq_ignore_ascii_case(word))
        .map(|(_, category)| *category)
}

/// Replacement advice for an unsupported function, if `name` is one
pub fn unsupported_function(name: &str) -> Option<&'static str> {
    UNSUPPORTED_FUNCTIONS
        .iter()
        .find(|(func, _)| func.eq_ignore_ascii_case(name))
        .map(|(_, advice)| *advice)
}

pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.iter().any(|kw| kw.eq_ignore_ascii_case(word))
}

pub fn is_builtin_word(word: &str) -> bool {
    BUILTIN_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word))
}

pub fn is_aggregate(word: &str) -> bool {
    AGGREGATE_FUNCTIONS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(word))
}

impl std::fmt::Display for MceDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mce")
    }
}

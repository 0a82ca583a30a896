//! Dialect normalization for SQL fragments.
//!
//! Different warehouses quote identifiers differently (`"schema"."table"`,
//! `` `project.dataset.table` ``). Deleting double quotes collapses the
//! ANSI style into bare identifiers so a single rule set matches both.
//!
//! String literals are not tracked. A `--` or a `"` inside a single-quoted
//! literal is treated like any other text.

/// Remove `--` line comments and `/* */` block comments.
///
/// Line comments keep their terminating newline. Block comments are
/// replaced by a single space so the tokens around them stay separated.
/// An unterminated block comment swallows the rest of the input.
pub fn strip_sql_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '-' if chars.peek() == Some(&'-') => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for ch in chars.by_ref() {
                    if prev == '*' && ch == '/' {
                        break;
                    }
                    prev = ch;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

/// Delete every double-quote character.
pub fn strip_double_quotes(sql: &str) -> String {
    sql.replace('"', "")
}

/// Full normalization: comments first, then quotes.
pub fn normalize(sql: &str) -> String {
    strip_double_quotes(&strip_sql_comments(sql))
}

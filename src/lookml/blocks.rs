//! LookML block scanning.
//!
//! LookML is scanned, not parsed. A block is `kind: name {` followed by a
//! brace-balanced body, and a directive is either `key: value ;;` (SQL
//! bearing) or `key: name` (a reference to another object).

use std::sync::LazyLock;

use regex::Regex;

static VIEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bview:\s*\+?(\w+)\s*\{").unwrap());

static EXPLORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexplore:\s*\+?(\w+)\s*\{").unwrap());

static JOIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bjoin:\s*(\w+)\s*\{").unwrap());

/// Kinds of named blocks the scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    View,
    Explore,
    Join,
}

impl BlockKind {
    fn pattern(self) -> &'static Regex {
        match self {
            BlockKind::View => &VIEW,
            BlockKind::Explore => &EXPLORE,
            BlockKind::Join => &JOIN,
        }
    }
}

/// A named block and its body, without the enclosing braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub kind: BlockKind,
    pub name: &'a str,
    pub body: &'a str,
}

/// Blank out whole-line `#` comments, keeping line structure.
pub fn strip_hash_comments(text: &str) -> String {
    text.lines()
        .map(|line| if line.trim_start().starts_with('#') { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Direct child blocks of one kind.
///
/// Blocks of the same kind nested inside a found block are skipped; scan
/// that block's body to reach them. An unbalanced block runs to the end
/// of the text.
pub fn find_blocks(text: &str, kind: BlockKind) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut resume = 0;

    for cap in kind.pattern().captures_iter(text) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        if whole.start() < resume {
            continue;
        }

        let open = whole.end() - 1;
        let (body, next) = match match_brace(text, open) {
            Some(close) => (&text[open + 1..close], close + 1),
            None => (&text[open + 1..], text.len()),
        };
        resume = next;

        blocks.push(Block {
            kind,
            name: name.as_str(),
            body,
        });
    }

    blocks
}

/// Index of the `}` closing the `{` at `open`.
pub fn match_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// The body with every nested LookML block removed.
///
/// Only block braces (`name {`, `key: {`) count. `${...}`, `{{ }}` and
/// `{% %}` are kept so SQL values stay intact.
pub fn top_level_text(body: &str) -> String {
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut idx = 0;
    let mut copied = 0;

    while idx < bytes.len() {
        if bytes[idx] == b'{' && is_block_opener(body, idx) {
            out.push_str(&body[copied..idx]);
            out.push(' ');
            idx = match match_brace(body, idx) {
                Some(close) => close + 1,
                None => bytes.len(),
            };
            copied = idx;
            continue;
        }
        idx += 1;
    }
    out.push_str(&body[copied..]);
    out
}

fn is_block_opener(text: &str, open: usize) -> bool {
    let next = text.as_bytes().get(open + 1);
    if matches!(next, Some(b'%') | Some(b'{')) {
        return false;
    }
    match text[..open].trim_end().chars().last() {
        Some(c) => c == ':' || c.is_alphanumeric() || c == '_',
        None => false,
    }
}

/// Directive keys read from view and explore bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    SqlTableName,
    Sql,
    From,
    ViewName,
    ExploreSource,
    DerivedTable,
}

impl Directive {
    const ALL: [Directive; 6] = [
        Directive::SqlTableName,
        Directive::Sql,
        Directive::From,
        Directive::ViewName,
        Directive::ExploreSource,
        Directive::DerivedTable,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Directive::SqlTableName => "sql_table_name",
            Directive::Sql => "sql",
            Directive::From => "from",
            Directive::ViewName => "view_name",
            Directive::ExploreSource => "explore_source",
            Directive::DerivedTable => "derived_table",
        }
    }

    fn patterns(self) -> &'static DirectivePatterns {
        &DIRECTIVE_PATTERNS[self as usize]
    }
}

struct DirectivePatterns {
    present: Regex,
    block: Regex,
    value: Regex,
    name: Regex,
}

impl DirectivePatterns {
    fn new(key: &str) -> Self {
        let key = regex::escape(key);
        let compile = |pattern: String| Regex::new(&pattern).unwrap();
        DirectivePatterns {
            present: compile(format!(r"\b{key}\s*:")),
            block: compile(format!(r"\b{key}\s*:\s*\{{")),
            value: compile(format!(r"(?s)\b{key}\s*:\s*(.*?)(?:;;|\z)")),
            name: compile(format!(r"\b{key}\s*:\s*\+?(\w+)")),
        }
    }
}

static DIRECTIVE_PATTERNS: LazyLock<Vec<DirectivePatterns>> = LazyLock::new(|| {
    Directive::ALL
        .iter()
        .map(|d| DirectivePatterns::new(d.key()))
        .collect()
});

/// Body of a keyed block such as `derived_table: { ... }`.
pub fn keyed_block(text: &str, directive: Directive) -> Option<&str> {
    let found = directive.patterns().block.find(text)?;
    let open = found.end() - 1;
    match match_brace(text, open) {
        Some(close) => Some(&text[open + 1..close]),
        None => Some(&text[open + 1..]),
    }
}

/// Value of a `key: ... ;;` directive, trimmed. Runs to the end of the text without `;;`.
pub fn sql_directive(text: &str, directive: Directive) -> Option<String> {
    let value = directive.patterns().value.captures(text)?.get(1)?.as_str().trim();
    Some(value.to_string())
}

/// Name in a `key: name` directive.
pub fn name_directive(text: &str, directive: Directive) -> Option<String> {
    let name = directive.patterns().name.captures(text)?.get(1)?;
    Some(name.as_str().to_string())
}

/// True if the directive key appears at all.
pub fn has_directive(text: &str, directive: Directive) -> bool {
    directive.patterns().present.is_match(text)
}

//! Liquid conditional branch extraction.
//!
//! LookML SQL can switch tables with Liquid tags:
//!
//! ```text
//! FROM {% if _user_attributes['region'] == 'eu' %} eu.orders {% else %} us.orders {% endif %}
//! ```
//!
//! Every branch is a possible dependency, so extraction never evaluates a
//! condition. The text is parsed into a small tree of conditionals, each
//! branch is flattened into its own fragment and the table extractor runs
//! over all of them. When a conditional directly follows `FROM` or `JOIN`,
//! the keyword moves from the enclosing fragment to the front of each branch.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::extract::{cte_names, extract_excluding};
use super::table_ref::TableReference;

/// Any `{% tag ... %}`, including whitespace-control dashes.
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{%-?\s*(\w+)(.*?)-?%\}").unwrap());

static OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*(?:if|unless|case)\b").unwrap());

/// `FROM` / `JOIN` at the end of the text preceding a conditional.
static TRAILING_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(FROM|JOIN)\s*$").unwrap());

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    /// One entry per branch, in source order.
    Conditional(Vec<Vec<Segment>>),
}

/// True if the text contains an `if`, `unless` or `case` block.
pub fn has_conditionals(text: &str) -> bool {
    OPENER.is_match(text)
}

/// Table references across every branch of every conditional in `text`.
///
/// A CTE introduced in any branch is excluded from all of them.
pub fn extract_templated_references(text: &str) -> Vec<TableReference> {
    let fragments = branch_fragments(text);
    let ctes: HashSet<String> = fragments.iter().flat_map(|f| cte_names(f)).collect();

    let mut refs = Vec::new();
    let mut seen = HashSet::new();
    for fragment in &fragments {
        for reference in extract_excluding(fragment, &ctes) {
            if seen.insert(reference.key()) {
                refs.push(reference);
            }
        }
    }
    refs
}

/// Flatten `text` into one fragment for the unconditional text plus one per branch.
///
/// Nested conditionals inside a fragment are replaced by a single space and
/// produce their own fragments. A conditional inside an identifier
/// (`ds.{% if a %}x{% else %}y{% endif %}`) yields the whole identifier in
/// each branch.
pub fn branch_fragments(text: &str) -> Vec<String> {
    let tree = parse(text);
    let mut out = Vec::new();
    collect(&tree, "", "", &mut out);
    out
}

fn parse(text: &str) -> Vec<Segment> {
    let mut root: Vec<Segment> = Vec::new();
    // Open conditionals, innermost last.
    let mut stack: Vec<Vec<Vec<Segment>>> = Vec::new();
    let mut last = 0;

    for cap in TAG.captures_iter(text) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        if whole.start() > last {
            push(&mut root, &mut stack, Segment::Text(text[last..whole.start()].to_string()));
        }
        last = whole.end();

        match name.as_str() {
            "if" | "unless" | "case" => stack.push(vec![Vec::new()]),
            "elsif" | "else" | "when" if !stack.is_empty() => {
                if let Some(frame) = stack.last_mut() {
                    frame.push(Vec::new());
                }
            }
            "endif" | "endunless" | "endcase" => {
                if let Some(frame) = stack.pop() {
                    push(&mut root, &mut stack, Segment::Conditional(frame));
                }
            }
            _ => push(&mut root, &mut stack, Segment::Text(" ".to_string())),
        }
    }

    if last < text.len() {
        push(&mut root, &mut stack, Segment::Text(text[last..].to_string()));
    }

    // Unclosed blocks end with the text.
    while let Some(frame) = stack.pop() {
        push(&mut root, &mut stack, Segment::Conditional(frame));
    }

    root
}

fn push(root: &mut Vec<Segment>, stack: &mut [Vec<Vec<Segment>>], segment: Segment) {
    match stack.last_mut().and_then(|frame| frame.last_mut()) {
        Some(branch) => branch.push(segment),
        None => root.push(segment),
    }
}

fn collect(segments: &[Segment], lead: &str, trail: &str, out: &mut Vec<String>) {
    let slot = out.len();
    out.push(String::new());

    let mut flat = String::from(lead);
    // Bytes at the head of the next text segment already moved into branches.
    let mut moved = 0;

    for (idx, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Text(text) => {
                flat.push_str(&text[moved..]);
                moved = 0;
            }
            Segment::Conditional(branches) => {
                // An identifier the conditional sits inside is completed in
                // every branch, and a FROM/JOIN right before it moves along.
                let suffix = match segments.get(idx + 1) {
                    Some(Segment::Text(next)) => identifier_head(next),
                    _ => "",
                };
                let mut prefix_start = identifier_tail_start(&flat);
                if is_clause_keyword(&flat[prefix_start..]) {
                    prefix_start = flat.len();
                }
                let glued = prefix_start < flat.len() || !suffix.is_empty();
                let cut = if glued { prefix_start } else { flat.len() };
                let start = TRAILING_KEYWORD
                    .find(&flat[..cut])
                    .map_or(cut, |m| m.start());

                let mut branch_lead = flat.split_off(start);
                if !glued && !branch_lead.is_empty() {
                    branch_lead.push(' ');
                }
                let branch_trail = if glued { suffix } else { "" };
                for branch in branches {
                    collect(branch, &branch_lead, branch_trail, out);
                }
                flat.push(' ');
                moved = branch_trail.len();
            }
        }
    }

    flat.push_str(trail);
    out[slot] = flat;
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '*' | '.' | '`' | '[' | ']')
}

fn is_clause_keyword(word: &str) -> bool {
    word.eq_ignore_ascii_case("from") || word.eq_ignore_ascii_case("join")
}

/// Byte offset where the identifier characters ending `text` begin.
fn identifier_tail_start(text: &str) -> usize {
    text.char_indices()
        .rev()
        .take_while(|&(_, c)| is_identifier_char(c))
        .last()
        .map_or(text.len(), |(idx, _)| idx)
}

/// Identifier characters starting `text`.
fn identifier_head(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|&(_, c)| !is_identifier_char(c))
        .map_or(text.len(), |(idx, _)| idx);
    &text[..end]
}

//! Heuristic SQL scanning.
//!
//! Nothing in here builds an AST. The matchers only find syntactically
//! possible table references in SQL text embedded in LookML:
//!
//! - [`normalize`] - comment stripping and quote normalization
//! - [`table_ref`] - table identifiers, suffix variants and qualification
//! - [`extract`] - `FROM`/`JOIN` reference extraction with CTE exclusion
//! - [`liquid`] - Liquid conditional branch extraction
//! - [`similarity`] - view/table name similarity for primary-table choice

pub mod extract;
pub mod liquid;
pub mod normalize;
pub mod similarity;
pub mod table_ref;

pub use extract::{choose_primary, cte_names, extract_table_references};
pub use liquid::{extract_templated_references, has_conditionals};
pub use normalize::{normalize, strip_double_quotes, strip_sql_comments};
pub use table_ref::{QualifyError, SuffixVariant, TableReference};

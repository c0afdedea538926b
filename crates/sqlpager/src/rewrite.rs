use crate::error::{PageError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder name the windowed query uses for the row offset.
pub const OFFSET_PARAM: &str = "offset";

/// Placeholder name the windowed query uses for the page size.
pub const LIMIT_PARAM: &str = "limit";

/// A LIMIT keyword introducing an actual limiting clause: surrounded by
/// whitespace and followed by a limit operand (number or placeholder). A
/// column literally named "limit" used in a comparison (`WHERE limit > 1000`)
/// is followed by an operator or an IN list instead and does not match.
static LIMIT_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\slimit\s+[\d:?$@]").expect("limit clause pattern"));

/// First `SELECT <column-list> FROM` segment, minimal match on the list.
static SELECT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)select\b.*?\bfrom\b").expect("select list pattern"));

static GROUP_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bgroup\s+by\b").expect("group by pattern"));

/// Pure text transformation of one base query into its windowed and
/// row-count variants.
///
/// This is a heuristic rewriter, not a SQL parser: detection of a
/// pre-existing limiting clause can be defeated by pathological input, and
/// callers must not declare placeholders named `offset` or `limit`
/// themselves. Both are accepted limitations of the contract; swapping the
/// heuristics for a SQL-aware tokenizer only touches this module.
pub struct QueryRewriter;

impl QueryRewriter {
    /// Reject a query that already carries its own limiting clause.
    pub fn ensure_no_limit(query: &str) -> Result<()> {
        if LIMIT_CLAUSE.is_match(query) {
            return Err(PageError::invalid_query(format!(
                "the query must not have a LIMIT clause of its own, got: {}",
                query
            )));
        }

        Ok(())
    }

    /// Remove a trailing statement terminator (and surrounding whitespace).
    pub fn strip_terminator(query: &str) -> &str {
        query.trim().trim_end_matches(';').trim_end()
    }

    /// Append the windowing clause with its named placeholders.
    ///
    /// `SELECT id FROM user` becomes
    /// `SELECT id FROM user LIMIT :offset, :limit`.
    pub fn windowed_query(query: &str) -> String {
        format!(
            "{} LIMIT :{}, :{}",
            Self::strip_terminator(query),
            OFFSET_PARAM,
            LIMIT_PARAM
        )
    }

    /// Derive the companion row-count query.
    ///
    /// `SELECT id FROM user WHERE active = :active` becomes
    /// `SELECT COUNT(*) AS total FROM user WHERE active = :active`.
    ///
    /// A grouped query would count per group, so it is wrapped in a subquery
    /// that counts the groups themselves. The wrap applies regardless of any
    /// trailing clauses (ORDER BY and friends).
    pub fn count_query(query: &str) -> String {
        let query = Self::strip_terminator(query);
        let counted = SELECT_LIST.replace(query, "SELECT COUNT(*) AS total FROM");

        if GROUP_BY.is_match(&counted) {
            format!("SELECT COUNT(*) AS total FROM ({}) AS temp", counted)
        } else {
            counted.into_owned()
        }
    }
}

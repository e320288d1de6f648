//! Centralized validation and helper functions.

use std::cmp::Ordering;
use std::path::Path;

/// Maximum number of rows accepted from a single input (spreadsheet, export, g2t)
pub const MAX_ROWS: usize = 1_000_000;

/// Check if adding another row would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new row.
/// Returns an error message if adding would exceed the limit, None if safe to add.
///
/// # Example
/// ```ignore
/// if check_row_limit(rows.len()).is_some() {
///     return Err(...);
/// }
/// rows.push(row); // Safe to add
/// ```
#[must_use]
pub fn check_row_limit(count: usize) -> Option<String> {
    if count >= MAX_ROWS {
        Some(format!(
            "Too many rows: adding another would exceed maximum of {MAX_ROWS}"
        ))
    } else {
        None
    }
}

/// Normalize a column header so differently styled headers compare equal.
///
/// # Examples
///
/// ```
/// use td_sync::utils::validation::normalize_column_name;
///
/// assert_eq!(normalize_column_name("Panel ID"), "panel_id");
/// assert_eq!(normalize_column_name("panel-version"), "panel_version");
/// assert_eq!(normalize_column_name(" Target/Genes "), "target_genes");
/// ```
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        match c {
            ' ' | '-' | '/' | '.' | '_' => {
                if !out.ends_with('_') {
                    out.push('_');
                }
            }
            c => out.extend(c.to_lowercase()),
        }
    }
    out.trim_matches('_').to_string()
}

/// Natural ordering for identifiers: all-digit strings compare by value and
/// sort before anything else, the rest compare lexically.
///
/// Ties between numerically equal strings (`"07"` vs `"7"`) fall back to the
/// lexical order so the ordering stays consistent with string equality.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a_num = parse_digits(a);
    let b_num = parse_digits(b);
    match (a_num, b_num) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn parse_digits(s: &str) -> Option<u128> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Split a free-text gene list cell into trimmed, non-empty tokens.
pub fn split_gene_list(cell: &str) -> Vec<&str> {
    cell.split([',', ';', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

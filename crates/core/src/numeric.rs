//! Numeric coercion for uploaded table cells.
//!
//! Counts in the source tables are formatted with thousands separators
//! (`"1,234"`). Unparseable cells are `None` everywhere: aggregation keeps
//! them missing and charts serialize them as `null`, which renders as a gap.

/// Parse a cell as a floating-point value after stripping separators.
///
/// Returns `None` for empty, non-numeric, or non-finite input.
pub fn parse_value(cell: &str) -> Option<f64> {
    let cleaned: String = cell.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a cell as an integer count (rounded to the nearest integer).
///
/// ```
/// use atlasboard_core::numeric::parse_count;
///
/// assert_eq!(parse_count("1,234"), Some(1234));
/// assert_eq!(parse_count("12.6"), Some(13));
/// assert_eq!(parse_count("-"), None);
/// ```
pub fn parse_count(cell: &str) -> Option<i64> {
    parse_value(cell).map(|v| v.round() as i64)
}

/// Sum optional counts. The result is `None` only when every input is
/// missing; otherwise missing inputs contribute nothing. Saturates at the
/// `i64` bounds.
pub fn sum_counts<I>(values: I) -> Option<i64>
where
    I: IntoIterator<Item = Option<i64>>,
{
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0).saturating_add(v)))
}

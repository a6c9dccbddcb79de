use crate::document::ReportDocument;
use crate::error::QueryResult;
use crate::number::parse_report_number;
use crate::xpath::Query;

/// Compiles `query` and extracts the numeric value of its first match.
///
/// `Ok(None)` covers both "nothing matched" and "the match is not a number".
pub fn extract(query: &str, document: &ReportDocument) -> QueryResult<Option<f64>> {
    let query = Query::parse(query)?;
    Ok(extract_compiled(&query, document))
}

/// Extracts the numeric value of an already compiled query.
#[must_use]
pub fn extract_compiled(query: &Query, document: &ReportDocument) -> Option<f64> {
    let raw = query.evaluate(document)?;
    let value = parse_report_number(raw);
    if value.is_none() {
        tracing::debug!(query = %query, raw, "matched value is not numeric");
    }
    value
}

/// Tries `queries` in order and returns the first one that yields a value.
pub fn extract_first<'q>(
    queries: impl IntoIterator<Item = &'q Query>,
    document: &ReportDocument,
) -> Option<f64> {
    queries
        .into_iter()
        .find_map(|query| extract_compiled(query, document))
}

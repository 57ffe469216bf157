//! Turns backend results into the summary line and CSV artifact.
//!
//! The CSV is deliberately naive: fields are joined with `,` and rows with `\n`,
//! with no quoting. A value containing a comma or newline will shift columns in
//! the artifact.

use crate::base::{
    messages,
    types::{QueryResponse, QueryResult, Res},
};

/// Render a backend outcome into what the relay posts back.
pub fn render_response(result: Res<QueryResult>) -> QueryResponse {
    match result {
        Ok(result) if result.rows.is_empty() => QueryResponse {
            summary: messages::NO_RESULTS.to_string(),
            csv: None,
        },
        Ok(result) => QueryResponse {
            summary: messages::row_summary(result.rows.len(), result.columns.len()),
            csv: Some(to_csv(&result)),
        },
        Err(err) => QueryResponse {
            summary: messages::error_summary(err),
            csv: None,
        },
    }
}

/// Header line of column names, then one line per row; `NULL` is an empty field.
pub fn to_csv(result: &QueryResult) -> String {
    let mut lines = Vec::with_capacity(result.rows.len() + 1);

    lines.push(result.columns.join(","));

    for row in &result.rows {
        let fields: Vec<&str> = row.iter().map(|v| v.as_deref().unwrap_or_default()).collect();
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows.into_iter().map(|r| r.into_iter().map(|v| v.map(str::to_string)).collect()).collect(),
        }
    }

    #[test]
    fn renders_rows_as_csv() {
        let response = render_response(Ok(result(&["id", "name"], vec![vec![Some("1"), Some("a")], vec![Some("2"), None]])));

        assert_eq!(response.summary, "Returned 2 row(s), 2 column(s)");
        assert_eq!(response.csv.as_deref(), Some("id,name\n1,a\n2,"));
    }

    #[test]
    fn empty_result_has_no_artifact() {
        let response = render_response(Ok(result(&["id"], vec![])));

        assert_eq!(response.summary, "_No results_");
        assert!(response.csv.is_none());
    }

    #[test]
    fn error_is_rendered_into_summary() {
        let response = render_response(Err(anyhow::anyhow!("boom")));

        assert_eq!(response.summary, "*Error:* `boom`");
        assert!(response.csv.is_none());
    }

    #[test]
    fn embedded_commas_are_not_escaped() {
        let csv = to_csv(&result(&["a", "b"], vec![vec![Some("x,y"), Some("z")]]));

        assert_eq!(csv, "a,b\nx,y,z");
    }

    #[test]
    fn single_column_all_null() {
        let csv = to_csv(&result(&["v"], vec![vec![None], vec![None]]));

        assert_eq!(csv, "v\n\n");
    }
}

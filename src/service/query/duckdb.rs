//! DuckDB query backend.
//!
//! Each prompt gets its own in-memory connection: the configured extension is
//! installed and loaded, then `<prefix> <prompt>;` is executed and the result
//! set collected. The connection is dropped when the call returns, whatever the
//! outcome.

use std::sync::Arc;

use ::duckdb::{
    Connection,
    types::{TimeUnit, Value},
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime};
use tracing::{debug, instrument};

use crate::base::{
    config::Config,
    types::{QueryResult, Res},
};

use super::{GenericQueryClient, QueryClient};

// Extra methods on `QueryClient` applied by the duckdb implementation.

impl QueryClient {
    /// Creates a new DuckDB-backed query client.
    pub fn duckdb(config: &Config) -> Self {
        let client = DuckDbQueryClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// DuckDB query client implementation.
#[derive(Clone, Debug)]
pub struct DuckDbQueryClient {
    extension: String,
    repository: String,
    statement_prefix: String,
}

impl DuckDbQueryClient {
    /// Create a new DuckDB query client.
    pub fn new(config: &Config) -> Self {
        Self {
            extension: config.query_extension.clone(),
            repository: config.query_extension_repository.clone(),
            statement_prefix: config.query_statement_prefix.clone(),
        }
    }

    /// The batch that prepares a fresh connection.
    fn setup_batch(&self) -> String {
        format!("INSTALL {ext} FROM {repo}; LOAD {ext};", ext = self.extension, repo = self.repository)
    }

    /// The statement that submits the prompt.
    ///
    /// The prompt is passed through verbatim, as the extension parses it as free text.
    fn statement(&self, prompt: &str) -> String {
        format!("{} {};", self.statement_prefix, prompt)
    }
}

#[async_trait]
impl GenericQueryClient for DuckDbQueryClient {
    #[instrument(name = "DuckDbQueryClient::query", skip_all)]
    async fn query(&self, prompt: &str) -> Res<QueryResult> {
        let setup = self.setup_batch();
        let statement = self.statement(prompt);

        debug!("Submitting statement: {}", statement);

        // DuckDB is blocking, so keep it off the async workers.
        tokio::task::spawn_blocking(move || run_statement(&setup, &statement)).await?
    }
}

// Helpers.

/// Open a connection, prepare it, and run the statement to completion.
fn run_statement(setup: &str, statement: &str) -> Res<QueryResult> {
    let conn = Connection::open_in_memory().context("failed to open DuckDB connection")?;

    conn.execute_batch(setup).context("failed to load query extension")?;

    let mut stmt = conn.prepare(statement)?;
    let mut rows = stmt.query([])?;

    // Column metadata is only available once the statement has run.
    let columns: Vec<String> = rows
        .as_ref()
        .map(|s| s.column_names().iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    let mut result = QueryResult { columns, rows: Vec::new() };

    while let Some(row) = rows.next()? {
        let values = (0..result.columns.len())
            .map(|i| row.get::<_, Value>(i).map(render_value))
            .collect::<Result<Vec<_>, _>>()?;

        result.rows.push(values);
    }

    Ok(result)
}

/// Render a DuckDB value in its default string form; `NULL` becomes `None`.
pub fn render_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(v) | Value::Enum(v) => Some(v),
        other => Some(value_text(&other)),
    }
}

/// DuckDB's text form of a value, as a `VARCHAR` cast would produce it.
///
/// Nested values are rendered recursively; a nested `NULL` is spelled out.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(v) => v.to_string(),
        Value::TinyInt(v) => v.to_string(),
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::HugeInt(v) => v.to_string(),
        Value::UHugeInt(v) => v.to_string(),
        Value::UTinyInt(v) => v.to_string(),
        Value::USmallInt(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::UBigInt(v) => v.to_string(),
        // `Debug` keeps the trailing `.0` on whole numbers, as DuckDB does.
        Value::Float(v) => format!("{v:?}"),
        Value::Double(v) => format!("{v:?}"),
        Value::Decimal(v) => v.to_string(),
        Value::Text(v) | Value::Enum(v) => v.clone(),
        Value::Blob(v) | Value::Geometry(v) => String::from_utf8_lossy(v).into_owned(),
        Value::Date32(days) => DateTime::from_timestamp(i64::from(*days) * 86_400, 0)
            .map(|dt| dt.date_naive().to_string())
            .unwrap_or_else(|| days.to_string()),
        Value::Timestamp(unit, v) => DateTime::from_timestamp_micros(to_micros(*unit, *v))
            .map(|dt| dt.naive_utc().to_string())
            .unwrap_or_else(|| v.to_string()),
        Value::Time64(unit, v) => {
            let micros = to_micros(*unit, *v);
            let secs = u32::try_from(micros.div_euclid(1_000_000)).unwrap_or_default();
            let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).unwrap_or_default();

            NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                .map(|t| t.to_string())
                .unwrap_or_else(|| v.to_string())
        }
        Value::Interval { months, days, nanos } => interval_text(*months, *days, *nanos),
        Value::List(items) | Value::Array(items) => {
            let items: Vec<String> = items.iter().map(value_text).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Struct(fields) => {
            let fields: Vec<String> = fields.iter().map(|(name, v)| format!("'{}': {}", name, value_text(v))).collect();
            format!("{{{}}}", fields.join(", "))
        }
        Value::Map(entries) => {
            let entries: Vec<String> = entries.iter().map(|(k, v)| format!("{}={}", value_text(k), value_text(v))).collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Union(v) => value_text(v),
        other => format!("{other:?}"),
    }
}

/// Interval text such as `1 year 2 months 3 days 04:05:06.5`; a zero interval is `00:00:00`.
fn interval_text(months: i32, days: i32, nanos: i64) -> String {
    fn unit(n: i64, name: &str) -> String {
        if n == 1 || n == -1 { format!("{n} {name}") } else { format!("{n} {name}s") }
    }

    let mut parts = Vec::new();

    let years = i64::from(months) / 12;
    let months = i64::from(months) % 12;

    if years != 0 {
        parts.push(unit(years, "year"));
    }
    if months != 0 {
        parts.push(unit(months, "month"));
    }
    if days != 0 {
        parts.push(unit(i64::from(days), "day"));
    }

    if nanos != 0 || parts.is_empty() {
        let sign = if nanos < 0 { "-" } else { "" };
        let micros = (nanos / 1_000).unsigned_abs();
        let (hours, rest) = (micros / 3_600_000_000, micros % 3_600_000_000);
        let (minutes, rest) = (rest / 60_000_000, rest % 60_000_000);
        let (seconds, fraction) = (rest / 1_000_000, rest % 1_000_000);

        let mut time = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
        if fraction != 0 {
            time.push_str(format!(".{fraction:06}").trim_end_matches('0'));
        }

        parts.push(time);
    }

    parts.join(" ")
}

fn to_micros(unit: TimeUnit, v: i64) -> i64 {
    match unit {
        TimeUnit::Second => v.saturating_mul(1_000_000),
        TimeUnit::Millisecond => v.saturating_mul(1_000),
        TimeUnit::Microsecond => v,
        TimeUnit::Nanosecond => v / 1_000,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ::duckdb::types::OrderedMap;

    use super::*;
    use crate::base::config::ConfigInner;

    fn config() -> Config {
        config_with_extension("acp")
    }

    fn config_with_extension(extension: &str) -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                slack_app_token: "xapp-test".to_string(),
                slack_bot_token: "xoxb-test".to_string(),
                query_extension: extension.to_string(),
                query_extension_repository: "community".to_string(),
                query_statement_prefix: "CLAUDE".to_string(),
            }),
        }
    }

    #[test]
    fn builds_setup_and_statement() {
        let client = DuckDbQueryClient::new(&config());

        assert_eq!(client.setup_batch(), "INSTALL acp FROM community; LOAD acp;");
        assert_eq!(client.statement("list users"), "CLAUDE list users;");
    }

    #[test]
    fn renders_scalars() {
        assert_eq!(render_value(Value::Null), None);
        assert_eq!(render_value(Value::Int(7)).as_deref(), Some("7"));
        assert_eq!(render_value(Value::Double(1.5)).as_deref(), Some("1.5"));
        assert_eq!(render_value(Value::Double(1.0)).as_deref(), Some("1.0"));
        assert_eq!(render_value(Value::Float(2.0)).as_deref(), Some("2.0"));
        assert_eq!(render_value(Value::Boolean(true)).as_deref(), Some("true"));
        assert_eq!(render_value(Value::Text("a".to_string())).as_deref(), Some("a"));
    }

    #[test]
    fn renders_temporals() {
        assert_eq!(render_value(Value::Date32(19_723)).as_deref(), Some("2024-01-01"));
        assert_eq!(
            render_value(Value::Timestamp(TimeUnit::Second, 1_704_067_200)).as_deref(),
            Some("2024-01-01 00:00:00")
        );
        assert_eq!(render_value(Value::Time64(TimeUnit::Microsecond, 3_600_000_000)).as_deref(), Some("01:00:00"));
    }

    #[test]
    fn runs_plain_sql_without_an_extension() {
        let result = run_statement("SET threads TO 1;", "SELECT 1 AS id, NULL AS name UNION ALL SELECT 2, 'b' ORDER BY id;").unwrap();

        assert_eq!(result.columns, vec!["id".to_string(), "name".to_string()]);
        assert_eq!(result.rows, vec![vec![Some("1".to_string()), None], vec![Some("2".to_string()), Some("b".to_string())]]);
    }

    #[test]
    fn statement_errors_are_returned() {
        let result = run_statement("SET threads TO 1;", "SELEC nonsense;");

        assert!(result.is_err());
    }

    #[test]
    fn renders_lists_and_arrays() {
        let list = Value::List(vec![Value::Int(1), Value::Null, Value::Text("a".to_string())]);
        let array = Value::Array(vec![Value::Double(1.0), Value::Double(2.5)]);

        assert_eq!(render_value(list).as_deref(), Some("[1, NULL, a]"));
        assert_eq!(render_value(array).as_deref(), Some("[1.0, 2.5]"));
        assert_eq!(render_value(Value::List(vec![])).as_deref(), Some("[]"));
    }

    #[test]
    fn renders_structs_maps_and_unions() {
        let fields = OrderedMap::from(vec![
            ("id".to_string(), Value::Int(1)),
            ("tags".to_string(), Value::List(vec![Value::Text("x".to_string())])),
        ]);
        let entries = OrderedMap::from(vec![(Value::Text("k".to_string()), Value::BigInt(2))]);

        assert_eq!(render_value(Value::Struct(fields)).as_deref(), Some("{'id': 1, 'tags': [x]}"));
        assert_eq!(render_value(Value::Map(entries)).as_deref(), Some("{k=2}"));
        assert_eq!(render_value(Value::Union(Box::new(Value::Boolean(false)))).as_deref(), Some("false"));
    }

    #[test]
    fn renders_intervals() {
        let interval = |months, days, nanos| render_value(Value::Interval { months, days, nanos });

        assert_eq!(interval(0, 1, 0).as_deref(), Some("1 day"));
        assert_eq!(interval(14, 3, 0).as_deref(), Some("1 year 2 months 3 days"));
        assert_eq!(interval(0, 2, 3_723_500_000_000).as_deref(), Some("2 days 01:02:03.5"));
        assert_eq!(interval(0, 0, 0).as_deref(), Some("00:00:00"));
    }

    #[test]
    fn runs_composites_through_duckdb() {
        let result = run_statement("SET threads TO 1;", "SELECT [1,2] AS l, INTERVAL 1 DAY AS i, 1.0::DOUBLE AS d, TRUE AS b;").unwrap();

        assert_eq!(
            result.rows,
            vec![vec![Some("[1, 2]".to_string()), Some("1 day".to_string()), Some("1.0".to_string()), Some("true".to_string())]]
        );
    }

    #[tokio::test]
    async fn extension_setup_failure_is_rendered_as_error() {
        let client = QueryClient::duckdb(&config_with_extension("nonexistent_ext_zz"));

        let response = client.execute("list users").await;

        assert!(response.summary.starts_with("*Error:*"));
        assert!(response.summary.contains("failed to load query extension"));
        assert!(response.csv.is_none());
    }
}

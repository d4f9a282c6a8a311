//! Normalisation of analysis-service payloads
//!
//! The service does not always emit strict JSON: pandas `NaN` values leak into
//! bodies as bare tokens, and per-column describe() output arrives as the
//! Python `str()` of a dict. Everything here turns those bodies into the typed
//! structures in [`crate::core`] without touching session state.

use crate::core::{
    CellValue, ClientError, ClientResult, ColumnMap, ColumnStatistics, DType, DescriptiveReport,
    FillMissingOutcome, ParseError, PreviewRow, STATISTIC_NAMES, SummaryStats, UniqueSummary,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    /// Python float repr tokens that are not valid JSON
    static ref PY_NON_FINITE: Regex = Regex::new(r"-?\b(?:nan|NaN|inf)\b").unwrap();
}

/// Parsed reply to a dataset upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResponse {
    pub message: Option<String>,
    pub filename: Option<String>,
    pub head: Vec<PreviewRow>,
}

/// Stateless decoder for every response the client consumes
pub struct ResultParser;

impl ResultParser {
    /// Rewrite bare `NaN` tokens outside string literals to `null`
    pub fn sanitize_body(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut in_string = false;
        let mut escaped = false;
        let mut rest = raw;

        while let Some(ch) = rest.chars().next() {
            if in_string {
                out.push(ch);
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    in_string = false;
                }
                rest = &rest[ch.len_utf8()..];
                continue;
            }

            if ch == '"' {
                in_string = true;
            } else if rest.starts_with("NaN") {
                let prev_is_word = out.chars().last().is_some_and(|c| c.is_alphanumeric() || c == '_');
                let next_is_word = rest[3..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_');
                if !prev_is_word && !next_is_word {
                    out.push_str("null");
                    rest = &rest[3..];
                    continue;
                }
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        out
    }

    /// Parse a response body that must be a JSON object after `NaN` fixup
    pub fn parse_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
        let cleaned = Self::sanitize_body(raw);
        match serde_json::from_str::<Value>(&cleaned) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ParseError::Body(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
            Err(e) => Err(ParseError::Body(e.to_string())),
        }
    }

    /// Extract the service's `{ "error": ... }` message from a failed response, if any
    pub fn error_message(raw: &str) -> Option<String> {
        let map = Self::parse_object(raw).ok()?;
        map.get("error").and_then(Value::as_str).map(str::to_string)
    }

    pub fn parse_upload(raw: &str) -> ClientResult<UploadResponse> {
        let map = Self::parse_object(raw)?;
        let head = match map.get("head") {
            Some(value) => Self::parse_rows(value, "head")?,
            None => return Err(ClientError::unexpected("upload response has no 'head' field")),
        };
        Ok(UploadResponse {
            message: optional_string(&map, "message"),
            filename: optional_string(&map, "filename"),
            head,
        })
    }

    /// Trailing rows, either under `tail` or as a bare array
    pub fn parse_tail(raw: &str) -> ClientResult<Vec<PreviewRow>> {
        let cleaned = Self::sanitize_body(raw);
        let value: Value =
            serde_json::from_str(&cleaned).map_err(|e| ParseError::Body(e.to_string()))?;
        match &value {
            Value::Array(_) => Self::parse_rows(&value, "tail"),
            Value::Object(map) => match map.get("tail") {
                Some(rows) => Self::parse_rows(rows, "tail"),
                None => Err(ClientError::unexpected("tail response has no 'tail' field")),
            },
            other => Err(ClientError::unexpected(format!(
                "tail response is {}",
                json_kind(other)
            ))),
        }
    }

    /// Decode an array of row objects; every row must carry the same column set
    pub fn parse_rows(value: &Value, field: &str) -> ClientResult<Vec<PreviewRow>> {
        let Value::Array(items) = value else {
            return Err(ClientError::unexpected(format!(
                "'{field}' is {}, expected an array",
                json_kind(value)
            )));
        };

        let mut rows = Vec::with_capacity(items.len());
        let mut expected: Option<Vec<String>> = None;
        for (idx, item) in items.iter().enumerate() {
            let Value::Object(obj) = item else {
                return Err(ClientError::unexpected(format!(
                    "'{field}' row {idx} is {}, expected an object",
                    json_kind(item)
                )));
            };

            let mut keys: Vec<String> = obj.keys().cloned().collect();
            keys.sort();
            match &expected {
                Some(first) if *first != keys => {
                    return Err(ClientError::unexpected(format!(
                        "'{field}' row {idx} has a different column set than row 0"
                    )));
                }
                Some(_) => {}
                None => expected = Some(keys),
            }

            let cells = obj
                .iter()
                .map(|(name, cell)| Ok((name.clone(), Self::parse_cell(cell, name)?)))
                .collect::<ClientResult<Vec<_>>>()?;
            rows.push(PreviewRow::new(cells));
        }
        Ok(rows)
    }

    fn parse_cell(value: &Value, column: &str) -> ClientResult<CellValue> {
        match value {
            Value::Null => Ok(CellValue::Null),
            Value::Bool(b) => Ok(CellValue::Bool(*b)),
            Value::Number(n) => Ok(CellValue::Number(n.clone())),
            Value::String(s) => Ok(CellValue::Text(s.clone())),
            other => Err(ClientError::unexpected(format!(
                "column '{column}' holds {}, expected a scalar",
                json_kind(other)
            ))),
        }
    }

    /// Decode the four-part describe report.
    ///
    /// Structural problems fail the whole report; a single column's
    /// undecodable statistics are kept as a per-column error instead.
    pub fn parse_report(raw: &str) -> ClientResult<DescriptiveReport> {
        let map = Self::parse_object(raw)?;
        let Some(Value::Object(data)) = map.get("data") else {
            return Err(ClientError::unexpected("describe response has no 'data' object"));
        };

        let mut report = DescriptiveReport::default();

        for (column, value) in required_object(data, "data_types")? {
            let tag = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            report.data_types.insert(column.as_str(), DType::from_tag(&tag));
        }

        for (column, value) in required_object(data, "missing_values")? {
            let count = as_count(value).ok_or_else(|| {
                ClientError::unexpected(format!(
                    "missing-value count for '{column}' is not a non-negative integer"
                ))
            })?;
            report.missing_values.insert(column.as_str(), count);
        }

        for (column, value) in required_object(data, "unique_values")? {
            let summary = match value {
                Value::Array(items) => UniqueSummary::List(
                    items
                        .iter()
                        .map(|item| Self::parse_cell(item, column))
                        .collect::<ClientResult<Vec<_>>>()?,
                ),
                scalar => UniqueSummary::Scalar(Self::parse_cell(scalar, column)?),
            };
            report.unique_values.insert(column.as_str(), summary);
        }

        for (column, value) in required_object(data, "summary_statistics")? {
            let stats = match value {
                Value::String(encoded) => Self::decode_statistics(column, encoded),
                Value::Object(obj) => Ok(stats_from_object(obj)),
                other => Err(ParseError::Column {
                    column: column.clone(),
                    reason: format!("statistics are {}, expected an encoded record", json_kind(other)),
                }),
            };
            if let Err(e) = &stats {
                tracing::warn!("summary statistics unavailable: {e}");
            }
            report.summary_statistics.insert(column.as_str(), stats);
        }

        if let Some(Value::Object(memory)) = data.get("memory_usage") {
            report.memory_usage = memory
                .iter()
                .filter_map(|(column, value)| as_count(value).map(|bytes| (column.as_str(), bytes)))
                .collect::<ColumnMap<u64>>();
        }

        if let Some(Value::Array(dims)) = data.get("shape")
            && let [rows, cols] = dims.as_slice()
            && let (Some(rows), Some(cols)) = (as_count(rows), as_count(cols))
        {
            report.shape = Some((rows, cols));
        }

        Ok(report)
    }

    /// Decode one column's statistics from the single-quoted pseudo-JSON the service sends.
    ///
    /// `"{'count': 5, 'mean': 2.0}"` becomes a record with `count` and `mean`
    /// set and the remaining six statistics absent.
    pub fn decode_statistics(column: &str, encoded: &str) -> ColumnStatistics {
        let column_error = |reason: String| ParseError::Column {
            column: column.to_string(),
            reason,
        };

        let trimmed = encoded.trim();
        let unquoted = strip_one_quote_layer(trimmed);
        let rewritten = unquoted.replace('\'', "\"");
        let normalized = PY_NON_FINITE.replace_all(&rewritten, "null");

        match serde_json::from_str::<Value>(&normalized) {
            Ok(Value::Object(obj)) => Ok(stats_from_object(&obj)),
            Ok(other) => Err(column_error(format!(
                "decoded statistics are {}, expected a record",
                json_kind(&other)
            ))),
            Err(e) => Err(column_error(e.to_string())),
        }
    }

    pub fn parse_mse(raw: &str) -> ClientResult<f64> {
        let map = Self::parse_object(raw)?;
        map.get("mse")
            .and_then(Value::as_f64)
            .ok_or_else(|| ClientError::unexpected("train response has no numeric 'mse'"))
    }

    /// Acknowledgement text for fire-and-forget requests; any body is accepted
    pub fn parse_ack(raw: &str) -> String {
        match Self::parse_object(raw) {
            Ok(map) => optional_string(&map, "message").unwrap_or_default(),
            Err(_) => raw.trim().to_string(),
        }
    }

    /// Best-effort decode of the null-imputation reply; absent parts stay empty
    pub fn parse_fill_outcome(raw: &str) -> FillMissingOutcome {
        let mut outcome = FillMissingOutcome::default();
        let Ok(map) = Self::parse_object(raw) else {
            return outcome;
        };
        let Some(Value::Object(data)) = map.get("data") else {
            return outcome;
        };
        if let Some(Value::Object(means)) = data.get("mean_values") {
            outcome.mean_values = means
                .iter()
                .map(|(column, value)| (column.as_str(), value.as_f64()))
                .collect();
        }
        if let Some(Value::Object(nulls)) = data.get("null_values_sum") {
            outcome.remaining_nulls = nulls
                .iter()
                .filter_map(|(column, value)| as_count(value).map(|n| (column.as_str(), n)))
                .collect();
        }
        if let Some(Value::Array(rows)) = data.get("updated_df") {
            outcome.updated_rows = rows.len();
        }
        outcome
    }
}

fn strip_one_quote_layer(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn stats_from_object(obj: &Map<String, Value>) -> SummaryStats {
    let mut stats = SummaryStats::default();
    for name in STATISTIC_NAMES {
        let value = obj.get(name).and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        });
        stats.set(name, value);
    }
    stats
}

fn required_object<'a>(
    data: &'a Map<String, Value>,
    field: &str,
) -> ClientResult<&'a Map<String, Value>> {
    match data.get(field) {
        Some(Value::Object(obj)) => Ok(obj),
        Some(other) => Err(ClientError::unexpected(format!(
            "'{field}' is {}, expected an object",
            json_kind(other)
        ))),
        None => Err(ClientError::unexpected(format!("describe data has no '{field}'"))),
    }
}

fn optional_string(map: &Map<String, Value>, field: &str) -> Option<String> {
    map.get(field).and_then(Value::as_str).map(str::to_string)
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

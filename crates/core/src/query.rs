//! Filter and ordering rules for list endpoints.
//!
//! Query strings are turned into an [`IndexQuery`] before any database work,
//! so an unknown column fails fast as a validation error. The predicate is
//! rendered with numbered placeholders; values are always bound, never
//! interpolated.

use std::collections::BTreeMap;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Column used when `order_by` is absent.
pub const DEFAULT_ORDER_COLUMN: &str = "created_at";

/// Largest accepted `limit`.
pub const MAX_LIMIT: i64 = 10_000;

/// Query parameters that control the listing itself rather than filter rows.
pub const RESERVED_PARAMS: &[&str] = &["order_by", "desc", "limit", "include_images"];

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    /// Case-insensitive substring match.
    Like,
    In,
}

impl FilterOp {
    /// Split `column__op` into the column and its operator.
    fn split(param: &str) -> (&str, Self) {
        match param.rsplit_once("__") {
            Some((column, "ne")) => (column, Self::Ne),
            Some((column, "like")) => (column, Self::Like),
            Some((column, "in")) => (column, Self::In),
            Some((column, "eq")) => (column, Self::Eq),
            _ => (param, Self::Eq),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub values: Vec<String>,
}

/// SQL fragment plus the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPredicate {
    pub sql: String,
    pub binds: Vec<String>,
}

/// Render `filters` as an AND-ed predicate whose first placeholder is `$first`.
///
/// Columns are compared through a TEXT cast so one bind type serves every
/// column type. An empty filter list renders as `TRUE`.
pub fn render_predicate(filters: &[Filter], first: usize) -> RenderedPredicate {
    let mut clauses = Vec::with_capacity(filters.len());
    let mut binds = Vec::new();
    let mut next = first;

    for filter in filters {
        let target = format!("CAST(\"{}\" AS TEXT)", filter.column);
        match filter.op {
            FilterOp::Eq | FilterOp::Ne => {
                let op = if filter.op == FilterOp::Eq { "=" } else { "<>" };
                clauses.push(format!("{target} {op} ${next}"));
                binds.push(filter.values.first().cloned().unwrap_or_default());
                next += 1;
            }
            FilterOp::Like => {
                clauses.push(format!("{target} ILIKE ${next}"));
                let needle = filter.values.first().map(String::as_str).unwrap_or_default();
                binds.push(format!("%{needle}%"));
                next += 1;
            }
            FilterOp::In => {
                let placeholders: Vec<String> = filter
                    .values
                    .iter()
                    .map(|value| {
                        binds.push(value.clone());
                        next += 1;
                        format!("${}", next - 1)
                    })
                    .collect();
                if placeholders.is_empty() {
                    clauses.push("FALSE".to_string());
                } else {
                    clauses.push(format!("{target} IN ({})", placeholders.join(", ")));
                }
            }
        }
    }

    let sql = if clauses.is_empty() {
        "TRUE".to_string()
    } else {
        clauses.join(" AND ")
    };
    RenderedPredicate { sql, binds }
}

// ---------------------------------------------------------------------------
// Index query
// ---------------------------------------------------------------------------

/// Validated listing request: filters, ordering and an optional limit.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub filters: Vec<Filter>,
    pub order_by: String,
    pub descending: bool,
    pub limit: Option<i64>,
}

impl Default for IndexQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            order_by: DEFAULT_ORDER_COLUMN.to_string(),
            descending: true,
            limit: None,
        }
    }
}

impl IndexQuery {
    /// Build from raw query parameters, checking every column against `columns`.
    pub fn from_params(
        params: &BTreeMap<String, String>,
        columns: &[&str],
    ) -> Result<Self, CoreError> {
        let mut query = Self::default();

        if let Some(order_by) = params.get("order_by") {
            query.order_by = validate_order_by(order_by, columns)?.to_string();
        }
        if let Some(desc) = params.get("desc") {
            query.descending = parse_bool("desc", desc)?;
        }
        if let Some(limit) = params.get("limit") {
            query.limit = Some(parse_limit(limit)?);
        }

        for (param, raw) in params {
            if RESERVED_PARAMS.contains(&param.as_str()) {
                continue;
            }
            let (column, op) = FilterOp::split(param);
            if !columns.contains(&column) {
                return Err(CoreError::Validation(format!(
                    "Invalid filter column: {column}"
                )));
            }
            let values = match op {
                FilterOp::In => raw
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect(),
                _ => vec![raw.clone()],
            };
            query.filters.push(Filter {
                column: column.to_string(),
                op,
                values,
            });
        }

        Ok(query)
    }

    /// `ORDER BY` body, e.g. `"created_at" DESC`.
    pub fn order_clause(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("\"{}\" {direction}", self.order_by)
    }
}

/// Fail fast on an `order_by` naming a column the resource does not have.
pub fn validate_order_by<'a>(column: &'a str, columns: &[&str]) -> Result<&'a str, CoreError> {
    if columns.contains(&column) {
        Ok(column)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid order_by column: {column}"
        )))
    }
}

/// Parse a boolean query flag (`true`/`false`/`1`/`0`).
pub fn parse_bool(name: &str, raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(CoreError::Validation(format!(
            "Invalid value for {name}: '{raw}'. Expected true or false"
        ))),
    }
}

fn parse_limit(raw: &str) -> Result<i64, CoreError> {
    match raw.trim().parse::<i64>() {
        Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(CoreError::Validation(format!(
            "Invalid limit '{raw}'. Must be an integer between 1 and {MAX_LIMIT}"
        ))),
    }
}

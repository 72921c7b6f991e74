//! Compilation of [`FilterGroup`]s into a Postgres predicate.
//!
//! Groups are OR-ed, conditions inside a group AND-ed. Field names are
//! looked up in a fixed column table, so no client string ever reaches
//! the SQL text; every value goes through `push_bind`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Postgres, QueryBuilder};

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_core::types::{FilterField, FilterGroup, FilterOp, FilterValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Text,
    Boolean,
    Date,
    Timestamp,
    Status,
    /// Membership in `document_cases`.
    Case,
}

#[derive(Debug)]
struct Column {
    name: &'static str,
    sql: &'static str,
    kind: ColumnKind,
}

const DOCUMENT_COLUMNS: &[Column] = &[
    Column { name: "id", sql: "d.id", kind: ColumnKind::Integer },
    Column { name: "is_outgoing", sql: "d.is_outgoing", kind: ColumnKind::Boolean },
    Column { name: "number", sql: "d.number", kind: ColumnKind::Text },
    Column { name: "description", sql: "d.description", kind: ColumnKind::Text },
    Column { name: "creation_date", sql: "d.creation_date", kind: ColumnKind::Date },
    Column { name: "registration_date", sql: "d.registration_date", kind: ColumnKind::Date },
    Column { name: "status", sql: "d.status::text", kind: ColumnKind::Status },
    Column { name: "project_id", sql: "d.project_id", kind: ColumnKind::Integer },
    Column { name: "offer_id", sql: "d.offer_id", kind: ColumnKind::Integer },
    Column { name: "editor_id", sql: "d.editor_id", kind: ColumnKind::Integer },
    Column { name: "last_updated", sql: "d.last_updated", kind: ColumnKind::Timestamp },
    Column { name: "case_id", sql: "dc.case_id", kind: ColumnKind::Case },
];

const STATUSES: [&str; 5] = ["CREATED", "APPROVED", "SENT", "CHANGED", "CANCELED"];

fn column(field: &str) -> AppResult<&'static Column> {
    DOCUMENT_COLUMNS
        .iter()
        .find(|c| c.name == field)
        .ok_or_else(|| AppError::validation(format!("Unknown filter field '{field}'")))
}

/// Append the predicate for `groups` to `builder`.
///
/// An empty list, or a list containing an empty group, matches every row.
pub fn push_filter_groups(
    builder: &mut QueryBuilder<'_, Postgres>,
    groups: &[FilterGroup],
) -> AppResult<()> {
    if groups.is_empty() || groups.iter().any(|g| g.conditions.is_empty()) {
        builder.push("TRUE");
        return Ok(());
    }

    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push("(");
        for (j, condition) in group.conditions.iter().enumerate() {
            if j > 0 {
                builder.push(" AND ");
            }
            push_condition(builder, condition)?;
        }
        builder.push(")");
    }
    Ok(())
}

fn push_condition(builder: &mut QueryBuilder<'_, Postgres>, cond: &FilterField) -> AppResult<()> {
    let col = column(&cond.field)?;

    if col.kind == ColumnKind::Case {
        return push_case_condition(builder, col, cond);
    }

    match cond.op {
        FilterOp::IsNull => {
            builder.push(col.sql).push(" IS NULL");
            Ok(())
        }
        FilterOp::IsNotNull => {
            builder.push(col.sql).push(" IS NOT NULL");
            Ok(())
        }
        FilterOp::Contains => {
            let FilterValue::String(needle) = &cond.value else {
                return Err(type_mismatch(col, "a string"));
            };
            if col.kind != ColumnKind::Text {
                return Err(AppError::validation(format!(
                    "Operator 'contains' is not supported on '{}'",
                    col.name
                )));
            }
            builder
                .push(col.sql)
                .push(" ILIKE ")
                .push_bind(format!("%{}%", escape_like(needle)));
            Ok(())
        }
        FilterOp::In => {
            builder.push(col.sql).push(" = ANY(");
            push_list(builder, col, &cond.value)?;
            builder.push(")");
            Ok(())
        }
        op => {
            let ordered = matches!(op, FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte);
            if ordered && matches!(col.kind, ColumnKind::Boolean | ColumnKind::Status) {
                return Err(AppError::validation(format!(
                    "Ordering operators are not supported on '{}'",
                    col.name
                )));
            }
            builder.push(col.sql).push(comparison(op));
            push_scalar(builder, col, &cond.value)
        }
    }
}

fn push_case_condition(
    builder: &mut QueryBuilder<'_, Postgres>,
    col: &Column,
    cond: &FilterField,
) -> AppResult<()> {
    builder.push("EXISTS (SELECT 1 FROM document_cases dc WHERE dc.document_id = d.id AND ");
    match cond.op {
        FilterOp::Eq => {
            let FilterValue::Integer(id) = cond.value else {
                return Err(type_mismatch(col, "an integer"));
            };
            builder.push(col.sql).push(" = ").push_bind(id);
        }
        FilterOp::In => {
            let FilterValue::IntegerList(ids) = &cond.value else {
                return Err(type_mismatch(col, "a list of integers"));
            };
            builder.push(col.sql).push(" = ANY(").push_bind(ids.clone()).push(")");
        }
        _ => {
            return Err(AppError::validation(
                "Field 'case_id' supports only 'eq' and 'in'",
            ));
        }
    }
    builder.push(")");
    Ok(())
}

fn comparison(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Ne => " <> ",
        FilterOp::Gt => " > ",
        FilterOp::Gte => " >= ",
        FilterOp::Lt => " < ",
        FilterOp::Lte => " <= ",
        _ => " = ",
    }
}

fn push_scalar(
    builder: &mut QueryBuilder<'_, Postgres>,
    col: &Column,
    value: &FilterValue,
) -> AppResult<()> {
    match (col.kind, value) {
        (ColumnKind::Integer, FilterValue::Integer(v)) => {
            builder.push_bind(*v);
        }
        (ColumnKind::Boolean, FilterValue::Boolean(v)) => {
            builder.push_bind(*v);
        }
        (ColumnKind::Text, FilterValue::String(v)) => {
            builder.push_bind(v.clone());
        }
        (ColumnKind::Status, FilterValue::String(v)) => {
            builder.push_bind(status(col, v)?);
        }
        (ColumnKind::Date, FilterValue::String(v)) => {
            builder.push_bind(date(col, v)?);
        }
        (ColumnKind::Timestamp, FilterValue::String(v)) => {
            builder.push_bind(timestamp(col, v)?);
        }
        _ => return Err(type_mismatch(col, expected_scalar(col.kind))),
    }
    Ok(())
}

fn push_list(
    builder: &mut QueryBuilder<'_, Postgres>,
    col: &Column,
    value: &FilterValue,
) -> AppResult<()> {
    match (col.kind, value) {
        (ColumnKind::Integer, FilterValue::IntegerList(v)) => {
            builder.push_bind(v.clone());
        }
        (ColumnKind::Text, FilterValue::StringList(v)) => {
            builder.push_bind(v.clone());
        }
        (ColumnKind::Status, FilterValue::StringList(v)) => {
            let values = v.iter().map(|s| status(col, s)).collect::<AppResult<Vec<_>>>()?;
            builder.push_bind(values);
        }
        (ColumnKind::Date, FilterValue::StringList(v)) => {
            let values = v.iter().map(|s| date(col, s)).collect::<AppResult<Vec<_>>>()?;
            builder.push_bind(values);
        }
        _ => return Err(type_mismatch(col, "a list")),
    }
    Ok(())
}

fn expected_scalar(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Integer | ColumnKind::Case => "an integer",
        ColumnKind::Boolean => "a boolean",
        ColumnKind::Date => "a date (YYYY-MM-DD)",
        ColumnKind::Timestamp => "an RFC 3339 timestamp",
        ColumnKind::Text | ColumnKind::Status => "a string",
    }
}

fn type_mismatch(col: &Column, expected: &str) -> AppError {
    AppError::validation(format!("Value for '{}' must be {expected}", col.name))
}

fn status(col: &Column, raw: &str) -> AppResult<String> {
    let upper = raw.trim().to_ascii_uppercase();
    if STATUSES.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(AppError::validation(format!(
            "Unknown value '{raw}' for '{}'",
            col.name
        )))
    }
}

fn date(col: &Column, raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| type_mismatch(col, expected_scalar(ColumnKind::Date)))
}

fn timestamp(col: &Column, raw: &str) -> AppResult<DateTime<Utc>> {
    raw.trim()
        .parse::<DateTime<Utc>>()
        .map_err(|_| type_mismatch(col, expected_scalar(ColumnKind::Timestamp)))
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

//! Renders a [`PredicateSet`] into a parameterized SQL `WHERE` clause.
//!
//! Column names and operators come from closed enums, and every operand is
//! bound as a parameter, so no caller-supplied text ever reaches the SQL
//! string.

use std::fmt::Write as _;

use switchy_database::DatabaseValue;
use worm_watch_database_models::{PredicateSet, PredicateValue};

/// A rendered `WHERE` clause and its bound values.
#[derive(Debug)]
pub struct WhereClause {
    /// Either empty or a string starting with `" WHERE "`.
    pub sql: String,
    /// Values for the `$n` placeholders in `sql`, in order.
    pub params: Vec<DatabaseValue>,
}

/// Renders `set` as a conjunction, numbering placeholders from
/// `first_param`.
#[must_use]
pub fn where_clause(set: &PredicateSet, first_param: usize) -> WhereClause {
    let mut sql = String::new();
    let mut params = Vec::with_capacity(set.predicates().len());

    for (offset, predicate) in set.predicates().iter().enumerate() {
        sql.push_str(if offset == 0 { " WHERE " } else { " AND " });
        let _ = write!(
            sql,
            "{} {} ${}",
            predicate.column.name(),
            predicate.comparison.operator(),
            first_param + offset,
        );
        params.push(to_database_value(predicate.value));
    }

    WhereClause { sql, params }
}

fn to_database_value(value: PredicateValue) -> DatabaseValue {
    match value {
        PredicateValue::Timestamp(at) => DatabaseValue::DateTime(at.naive_utc()),
        PredicateValue::Real(v) => DatabaseValue::Real64(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worm_watch_database_models::DeleteFilter;

    #[test]
    fn empty_set_renders_nothing() {
        let clause = where_clause(&PredicateSet::new(), 1);
        assert!(clause.sql.is_empty());
        assert!(clause.params.is_empty());
    }

    #[test]
    fn full_filter_renders_all_conditions() {
        let filter = DeleteFilter {
            since: Some("2026-05-15T20:00:00Z".parse().unwrap()),
            lat_min: Some(49.87),
            lat_max: Some(49.90),
            lng_min: Some(-97.17),
            lng_max: Some(-97.14),
        };

        let clause = where_clause(&filter.predicates(), 1);

        assert_eq!(
            clause.sql,
            " WHERE created_at >= $1 AND lat >= $2 AND lat <= $3 AND lng >= $4 AND lng <= $5"
        );
        assert_eq!(clause.params.len(), 5);
        assert!(matches!(clause.params[0], DatabaseValue::DateTime(_)));
        assert!(matches!(clause.params[4], DatabaseValue::Real64(v) if (v + 97.14).abs() < 1e-9));
    }

    #[test]
    fn partial_filter_numbers_placeholders_densely() {
        let filter = DeleteFilter {
            lat_max: Some(49.90),
            lng_min: Some(-97.17),
            ..DeleteFilter::default()
        };

        let clause = where_clause(&filter.predicates(), 3);

        assert_eq!(clause.sql, " WHERE lat <= $3 AND lng >= $4");
        assert_eq!(clause.params.len(), 2);
    }
}

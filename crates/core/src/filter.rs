//! Structured filter grammar for book searches.
//!
//! Callers send filters as JSON text. The text is decoded into a closed,
//! typed [`BookFilter`]; nothing is ever forwarded verbatim to the store.
//!
//! ```text
//! {}                                          every book
//! {"author": "Frank Herbert"}                 equality
//! {"year": {"$gte": 1960, "$lt": 1970}}       operators on one field are ANDed
//! {"title": {"$contains": "Dune"}}            literal substring
//! {"$or": [{"author": "A"}, {"year": 1965}]}  disjunction
//! ```
//!
//! Text fields (`title`, `author`) accept `$eq`, `$ne`, `$in`, `$nin`,
//! `$contains` and `$startsWith`. `year` accepts `$eq`, `$ne`, `$gt`, `$gte`,
//! `$lt`, `$lte`, `$in` and `$nin`. Logical `$and` / `$or` take non-empty
//! arrays of filters.

use serde_json::{Map, Value};

use crate::error::{FilterError, FilterResult};
use crate::models::Book;

/// Maximum accepted filter text length in bytes.
pub const MAX_FILTER_LENGTH: usize = 4096;

/// Maximum nesting depth of `$and` / `$or`.
pub const MAX_FILTER_DEPTH: usize = 8;

// =============================================================================
// Filter Types
// =============================================================================

/// A predicate over book fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    /// All clauses must match. An empty list matches every book.
    And(Vec<BookFilter>),
    /// At least one clause must match.
    Or(Vec<BookFilter>),
    Title(TextMatch),
    Author(TextMatch),
    Year(YearMatch),
}

/// Condition on a text field. Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Eq(String),
    Ne(String),
    In(Vec<String>),
    Nin(Vec<String>),
    /// Literal substring.
    Contains(String),
    /// Literal prefix.
    StartsWith(String),
}

/// Condition on the publication year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearMatch {
    Eq(i32),
    Ne(i32),
    Gt(i32),
    Gte(i32),
    Lt(i32),
    Lte(i32),
    In(Vec<i32>),
    Nin(Vec<i32>),
}

impl BookFilter {
    /// Filter matching every book.
    pub fn all() -> Self {
        BookFilter::And(Vec::new())
    }

    /// Whether this filter matches every book without inspecting it.
    pub fn is_all(&self) -> bool {
        matches!(self, BookFilter::And(clauses) if clauses.is_empty())
    }

    /// Decode filter text.
    pub fn parse(text: &str) -> FilterResult<Self> {
        if text.len() > MAX_FILTER_LENGTH {
            return Err(FilterError::TooLong {
                max: MAX_FILTER_LENGTH,
                actual: text.len(),
            });
        }

        let value: Value =
            serde_json::from_str(text).map_err(|e| FilterError::InvalidJson(e.to_string()))?;

        parse_filter(&value, 0)
    }

    /// Evaluate the filter against a book.
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::And(clauses) => clauses.iter().all(|c| c.matches(book)),
            BookFilter::Or(clauses) => clauses.iter().any(|c| c.matches(book)),
            BookFilter::Title(m) => m.matches(&book.title),
            BookFilter::Author(m) => m.matches(&book.author),
            BookFilter::Year(m) => m.matches(book.year),
        }
    }
}

impl TextMatch {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            TextMatch::Eq(v) => value == v,
            TextMatch::Ne(v) => value != v,
            TextMatch::In(vs) => vs.iter().any(|v| v == value),
            TextMatch::Nin(vs) => !vs.iter().any(|v| v == value),
            TextMatch::Contains(v) => value.contains(v.as_str()),
            TextMatch::StartsWith(v) => value.starts_with(v.as_str()),
        }
    }
}

impl YearMatch {
    pub fn matches(&self, value: i32) -> bool {
        match self {
            YearMatch::Eq(v) => value == *v,
            YearMatch::Ne(v) => value != *v,
            YearMatch::Gt(v) => value > *v,
            YearMatch::Gte(v) => value >= *v,
            YearMatch::Lt(v) => value < *v,
            YearMatch::Lte(v) => value <= *v,
            YearMatch::In(vs) => vs.contains(&value),
            YearMatch::Nin(vs) => !vs.contains(&value),
        }
    }
}

// -----------------------------------------------------------------------------
// Decoding
// -----------------------------------------------------------------------------

fn parse_filter(value: &Value, depth: usize) -> FilterResult<BookFilter> {
    if depth > MAX_FILTER_DEPTH {
        return Err(FilterError::TooDeep(MAX_FILTER_DEPTH));
    }

    let Value::Object(entries) = value else {
        return Err(FilterError::NotAnObject(json_type(value)));
    };

    let mut clauses = Vec::with_capacity(entries.len());
    for (key, operand) in entries {
        match key.as_str() {
            "$and" => clauses.push(BookFilter::And(parse_branches(key, operand, depth)?)),
            "$or" => clauses.push(BookFilter::Or(parse_branches(key, operand, depth)?)),
            "title" => clauses.extend(
                parse_text_condition(key, operand)?
                    .into_iter()
                    .map(BookFilter::Title),
            ),
            "author" => clauses.extend(
                parse_text_condition(key, operand)?
                    .into_iter()
                    .map(BookFilter::Author),
            ),
            "year" => clauses.extend(
                parse_year_condition(key, operand)?
                    .into_iter()
                    .map(BookFilter::Year),
            ),
            other => return Err(FilterError::UnknownField(other.to_string())),
        }
    }

    if clauses.len() == 1 {
        // Single clause, no need for a wrapping conjunction.
        return Ok(clauses.remove(0));
    }
    Ok(BookFilter::And(clauses))
}

fn parse_branches(key: &str, operand: &Value, depth: usize) -> FilterResult<Vec<BookFilter>> {
    let Value::Array(items) = operand else {
        return Err(FilterError::TypeMismatch {
            field: key.to_string(),
            expected: "an array of filters",
        });
    };
    if items.is_empty() {
        return Err(FilterError::Empty(key.to_string()));
    }

    items
        .iter()
        .map(|item| parse_filter(item, depth + 1))
        .collect()
}

fn parse_text_condition(field: &str, operand: &Value) -> FilterResult<Vec<TextMatch>> {
    match operand {
        Value::String(s) => Ok(vec![TextMatch::Eq(s.clone())]),
        Value::Object(ops) => {
            operators(field, ops)?
                .map(|(op, v)| {
                    Ok(match op.as_str() {
                        "$eq" => TextMatch::Eq(expect_string(field, v)?),
                        "$ne" => TextMatch::Ne(expect_string(field, v)?),
                        "$in" => TextMatch::In(expect_array(field, v, expect_string)?),
                        "$nin" => TextMatch::Nin(expect_array(field, v, expect_string)?),
                        "$contains" => TextMatch::Contains(expect_string(field, v)?),
                        "$startsWith" => TextMatch::StartsWith(expect_string(field, v)?),
                        _ => return Err(unknown_operator(field, op)),
                    })
                })
                .collect()
        }
        _ => Err(FilterError::TypeMismatch {
            field: field.to_string(),
            expected: "a string or an operator object",
        }),
    }
}

fn parse_year_condition(field: &str, operand: &Value) -> FilterResult<Vec<YearMatch>> {
    match operand {
        Value::Number(_) => Ok(vec![YearMatch::Eq(expect_i32(field, operand)?)]),
        Value::Object(ops) => operators(field, ops)?
            .map(|(op, v)| {
                Ok(match op.as_str() {
                    "$eq" => YearMatch::Eq(expect_i32(field, v)?),
                    "$ne" => YearMatch::Ne(expect_i32(field, v)?),
                    "$gt" => YearMatch::Gt(expect_i32(field, v)?),
                    "$gte" => YearMatch::Gte(expect_i32(field, v)?),
                    "$lt" => YearMatch::Lt(expect_i32(field, v)?),
                    "$lte" => YearMatch::Lte(expect_i32(field, v)?),
                    "$in" => YearMatch::In(expect_array(field, v, expect_i32)?),
                    "$nin" => YearMatch::Nin(expect_array(field, v, expect_i32)?),
                    _ => return Err(unknown_operator(field, op)),
                })
            })
            .collect(),
        _ => Err(FilterError::TypeMismatch {
            field: field.to_string(),
            expected: "an integer or an operator object",
        }),
    }
}

fn operators<'a>(
    field: &str,
    ops: &'a Map<String, Value>,
) -> FilterResult<impl Iterator<Item = (&'a String, &'a Value)>> {
    if ops.is_empty() {
        return Err(FilterError::Empty(format!("Operator object for {field}")));
    }
    Ok(ops.iter())
}

fn expect_string(field: &str, value: &Value) -> FilterResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| FilterError::TypeMismatch {
            field: field.to_string(),
            expected: "a string",
        })
}

fn expect_i32(field: &str, value: &Value) -> FilterResult<i32> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| FilterError::TypeMismatch {
            field: field.to_string(),
            expected: "a 32-bit integer",
        })
}

fn expect_array<T>(
    field: &str,
    value: &Value,
    item: fn(&str, &Value) -> FilterResult<T>,
) -> FilterResult<Vec<T>> {
    let Value::Array(items) = value else {
        return Err(FilterError::TypeMismatch {
            field: field.to_string(),
            expected: "an array",
        });
    };
    items.iter().map(|v| item(field, v)).collect()
}

fn unknown_operator(field: &str, op: &str) -> FilterError {
    FilterError::UnknownOperator {
        field: field.to_string(),
        op: op.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookId;

    fn book(title: &str, author: &str, year: i32) -> Book {
        Book {
            id: BookId::from("000000000000000000000001"),
            title: title.into(),
            author: author.into(),
            year,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = BookFilter::parse("{}").unwrap();
        assert!(filter.is_all());
        assert!(filter.matches(&book("Dune", "Frank Herbert", 1965)));
    }

    #[test]
    fn test_equality_shorthand() {
        let filter = BookFilter::parse(r#"{"author": "Frank Herbert"}"#).unwrap();
        assert_eq!(
            filter,
            BookFilter::Author(TextMatch::Eq("Frank Herbert".into()))
        );
        assert!(filter.matches(&book("Dune", "Frank Herbert", 1965)));
        assert!(!filter.matches(&book("Emma", "Jane Austen", 1815)));
    }

    #[test]
    fn test_year_range_is_conjunction() {
        let filter = BookFilter::parse(r#"{"year": {"$gte": 1960, "$lt": 1970}}"#).unwrap();
        assert!(filter.matches(&book("Dune", "Frank Herbert", 1965)));
        assert!(!filter.matches(&book("Neuromancer", "William Gibson", 1984)));
        assert!(!filter.matches(&book("Solaris", "Stanislaw Lem", 1970)));
    }

    #[test]
    fn test_or_and_membership() {
        let filter = BookFilter::parse(
            r#"{"$or": [{"author": {"$in": ["Jane Austen", "Stanislaw Lem"]}}, {"year": {"$nin": [1965, 1984]}}]}"#,
        )
        .unwrap();
        assert!(filter.matches(&book("Emma", "Jane Austen", 1815)));
        assert!(filter.matches(&book("Foundation", "Isaac Asimov", 1951)));
        assert!(!filter.matches(&book("Dune", "Frank Herbert", 1965)));
    }

    #[test]
    fn test_contains_is_literal() {
        let filter = BookFilter::parse(r#"{"title": {"$contains": "C++"}}"#).unwrap();
        assert!(filter.matches(&book("The C++ Programming Language", "Bjarne Stroustrup", 1985)));
        assert!(!filter.matches(&book("The CC Book", "Someone", 2000)));

        let filter = BookFilter::parse(r#"{"title": {"$startsWith": "Dune"}}"#).unwrap();
        assert!(filter.matches(&book("Dune Messiah", "Frank Herbert", 1969)));
        assert!(!filter.matches(&book("Children of Dune", "Frank Herbert", 1976)));
    }

    // Test critique: le texte libre n'est jamais accepté
    #[test]
    fn test_rejects_non_json_text() {
        assert!(matches!(
            BookFilter::parse("title=Dune"),
            Err(FilterError::InvalidJson(_))
        ));
        assert_eq!(
            BookFilter::parse("[]"),
            Err(FilterError::NotAnObject("an array"))
        );
    }

    #[test]
    fn test_rejects_unknown_fields_and_operators() {
        assert_eq!(
            BookFilter::parse(r#"{"isbn": "123"}"#),
            Err(FilterError::UnknownField("isbn".into()))
        );
        // Opérateurs natifs du store (injection prevention)
        assert_eq!(
            BookFilter::parse(r#"{"title": {"$regex": ".*"}}"#),
            Err(FilterError::UnknownOperator {
                field: "title".into(),
                op: "$regex".into()
            })
        );
        assert!(BookFilter::parse(r#"{"$where": "sleep(1000)"}"#).is_err());
        assert!(BookFilter::parse(r#"{"title": {"$gt": "A"}}"#).is_err());
    }

    #[test]
    fn test_rejects_type_mismatches() {
        assert!(matches!(
            BookFilter::parse(r#"{"year": "1965"}"#),
            Err(FilterError::TypeMismatch { .. })
        ));
        assert!(BookFilter::parse(r#"{"year": 1965.5}"#).is_err());
        assert!(BookFilter::parse(r#"{"year": 99999999999}"#).is_err());
        assert!(BookFilter::parse(r#"{"title": 42}"#).is_err());
        assert!(BookFilter::parse(r#"{"title": {"$in": "Dune"}}"#).is_err());
        assert!(BookFilter::parse(r#"{"$and": {"title": "Dune"}}"#).is_err());
    }

    #[test]
    fn test_rejects_empty_groups() {
        assert_eq!(
            BookFilter::parse(r#"{"$or": []}"#),
            Err(FilterError::Empty("$or".into()))
        );
        assert!(BookFilter::parse(r#"{"year": {}}"#).is_err());
    }

    #[test]
    fn test_depth_and_length_limits() {
        let mut nested = String::from(r#"{"title": "Dune"}"#);
        for _ in 0..MAX_FILTER_DEPTH {
            nested = format!(r#"{{"$and": [{nested}]}}"#);
        }
        assert!(BookFilter::parse(&nested).is_ok());

        let too_deep = format!(r#"{{"$and": [{nested}]}}"#);
        assert_eq!(
            BookFilter::parse(&too_deep),
            Err(FilterError::TooDeep(MAX_FILTER_DEPTH))
        );

        let long = format!(r#"{{"title": "{}"}}"#, "x".repeat(MAX_FILTER_LENGTH));
        assert!(matches!(
            BookFilter::parse(&long),
            Err(FilterError::TooLong { .. })
        ));
    }
}

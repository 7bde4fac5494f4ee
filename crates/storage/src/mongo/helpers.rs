//! Shared helpers for BSON query building and document conversion.

use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{Error as DriverError, ErrorKind};

use folio_core::error::{StorageError, StorageResult};
use folio_core::filter::{BookFilter, TextMatch, YearMatch};

// -----------------------------------------------------------------------------
// Filter translation
// -----------------------------------------------------------------------------

/// Translate a decoded filter into a MongoDB query document.
///
/// Only operators produced here ever reach the server; regex operands are
/// escaped so `$contains` / `$startsWith` stay literal.
pub fn filter_to_document(filter: &BookFilter) -> Document {
    if filter.is_all() {
        return Document::new();
    }

    match filter {
        BookFilter::And(clauses) => doc! { "$and": clauses_to_array(clauses) },
        BookFilter::Or(clauses) => doc! { "$or": clauses_to_array(clauses) },
        BookFilter::Title(m) => doc! { "title": text_condition(m) },
        BookFilter::Author(m) => doc! { "author": text_condition(m) },
        BookFilter::Year(m) => doc! { "year": year_condition(m) },
    }
}

fn clauses_to_array(clauses: &[BookFilter]) -> Vec<Bson> {
    clauses
        .iter()
        .map(|c| Bson::Document(filter_to_document(c)))
        .collect()
}

fn text_condition(m: &TextMatch) -> Document {
    match m {
        TextMatch::Eq(v) => doc! { "$eq": v.as_str() },
        TextMatch::Ne(v) => doc! { "$ne": v.as_str() },
        TextMatch::In(vs) => doc! { "$in": vs.clone() },
        TextMatch::Nin(vs) => doc! { "$nin": vs.clone() },
        TextMatch::Contains(v) => doc! { "$regex": regex::escape(v) },
        TextMatch::StartsWith(v) => doc! { "$regex": format!("^{}", regex::escape(v)) },
    }
}

fn year_condition(m: &YearMatch) -> Document {
    match m {
        YearMatch::Eq(v) => doc! { "$eq": *v },
        YearMatch::Ne(v) => doc! { "$ne": *v },
        YearMatch::Gt(v) => doc! { "$gt": *v },
        YearMatch::Gte(v) => doc! { "$gte": *v },
        YearMatch::Lt(v) => doc! { "$lt": *v },
        YearMatch::Lte(v) => doc! { "$lte": *v },
        YearMatch::In(vs) => doc! { "$in": vs.clone() },
        YearMatch::Nin(vs) => doc! { "$nin": vs.clone() },
    }
}

// -----------------------------------------------------------------------------
// Document conversion
// -----------------------------------------------------------------------------

/// Canonical string form of a document identifier.
///
/// `ObjectId`s become their 24-character hex form.
pub fn bson_to_id(value: &Bson) -> String {
    match value {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read an integer field that may have been written as int32, int64 or
/// an integral double (JavaScript clients store numbers as doubles).
pub fn bson_to_i32(value: Option<&Bson>, field_name: &str) -> StorageResult<i32> {
    let out_of_range = || {
        StorageError::SerializationError(format!(
            "{} is out of range for a 32-bit integer",
            field_name
        ))
    };

    match value {
        Some(Bson::Int32(n)) => Ok(*n),
        Some(Bson::Int64(n)) => i32::try_from(*n).map_err(|_| out_of_range()),
        Some(Bson::Double(f)) if f.fract() == 0.0 => {
            if *f < f64::from(i32::MIN) || *f > f64::from(i32::MAX) {
                return Err(out_of_range());
            }
            Ok(*f as i32)
        }
        Some(Bson::Null) | None => Err(StorageError::SerializationError(format!(
            "{} is missing",
            field_name
        ))),
        Some(other) => Err(StorageError::SerializationError(format!(
            "{} has unexpected type {:?}",
            field_name,
            other.element_type()
        ))),
    }
}

/// Classify a driver error.
///
/// Reachability problems become `ConnectionError`; everything else is
/// reported as a failed query.
pub fn map_driver_error(err: DriverError) -> StorageError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::Authentication { .. } => StorageError::ConnectionError(err.to_string()),
        _ => StorageError::QueryError(err.to_string()),
    }
}

//! Classification of insert failures caused by an already existing row.

use crate::core::DbError;
use std::error::Error;

/// Message fragments that backends without a typed constraint error use
/// for duplicate keys. Matched case-sensitively.
pub const DUPLICATE_MARKERS: [&str; 2] = ["Duplicate entry", "Integrity constraint violation"];

/// Returns true when `err`, or any error in its source chain, is a
/// unique/primary-key violation.
///
/// A typed [`DbError::UniqueViolation`] always counts regardless of its text.
/// Anything else counts only if its message contains one of
/// [`DUPLICATE_MARKERS`].
pub fn is_duplicate_entry(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(DbError::UniqueViolation { .. }) = e.downcast_ref::<DbError>() {
            return true;
        }
        let message = e.to_string();
        if DUPLICATE_MARKERS.iter().any(|marker| message.contains(marker)) {
            return true;
        }
        current = e.source();
    }
    false
}

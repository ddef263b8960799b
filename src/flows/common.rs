//! Shared helpers for flow implementations.

// crates.io
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{_prelude::*, auth::ScopeSet};

const UTC_TIMESTAMP: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");

/// Formats `instant` as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn utc_timestamp(instant: OffsetDateTime) -> String {
	let instant = instant.to_offset(time::UtcOffset::UTC);

	instant.format(UTC_TIMESTAMP).unwrap_or_else(|_| instant.unix_timestamp().to_string())
}

/// Current instant formatted by [`utc_timestamp`].
pub fn utc_timestamp_now() -> String {
	utc_timestamp(OffsetDateTime::now_utc())
}

/// Joins normalized scopes with the provider's delimiter; `None` when there are none.
pub(crate) fn format_scope(scope: &ScopeSet, delimiter: char) -> Option<String> {
	if scope.is_empty() {
		return None;
	}

	Some(scope.joined(delimiter))
}

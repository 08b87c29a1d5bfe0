//! Run-unique identifier assignment.
//!
//! Every written item gets a filesystem-safe uid derived from its slug or
//! title, optionally date-prefixed. Uids are memoized by `(namespace, wp_id)`
//! so an item referenced twice (e.g. as itself and as a parent) resolves to
//! the same name, and collisions within a namespace get numeric suffixes.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use unpress_export::Item;

/// Partition of the uid space. Posts and pages never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Date-prefixed post uids.
    Posts,
    /// Page uids, used as directory names.
    Pages,
}

/// Run-scoped uid registry. Single writer per run.
#[derive(Debug, Default)]
pub struct UidRegistry {
    assigned: HashMap<(Namespace, String), String>,
    taken: HashMap<Namespace, HashSet<String>>,
}

impl UidRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign (or return the previously assigned) uid for an item.
    ///
    /// `date_format` is the strftime format the item's date is parsed with
    /// when `date_prefix` is requested; an unparseable date falls back to
    /// today and logs a warning.
    pub fn assign(
        &mut self,
        item: &Item,
        namespace: Namespace,
        date_prefix: bool,
        date_format: &str,
    ) -> String {
        if let Some(uid) = self.assigned.get(&(namespace, item.wp_id.clone())) {
            return uid.clone();
        }

        let mut base = String::new();
        if date_prefix {
            let date = parse_date(item, date_format);
            base.push_str(&date.format("%Y-%m-%d-").to_string());
        }

        let source = if item.slug.is_empty() {
            if item.title.is_empty() {
                "untitled"
            } else {
                &item.title
            }
        } else {
            &item.slug
        };
        base.push_str(&sanitize(source));

        let taken = self.taken.entry(namespace).or_default();
        let mut uid = base.clone();
        let mut n = 1;
        while taken.contains(&uid) {
            n += 1;
            uid = format!("{base}_{n}");
        }

        taken.insert(uid.clone());
        self.assigned
            .insert((namespace, item.wp_id.clone()), uid.clone());
        uid
    }
}

/// Parse the item date for prefixing, falling back to today.
fn parse_date(item: &Item, date_format: &str) -> NaiveDate {
    NaiveDateTime::parse_from_str(&item.date, date_format).map_or_else(
        |_| {
            warn!(title = %item.title, date = %item.date, "unparseable item date, using today");
            Utc::now().date_naive()
        },
        |dt| dt.date(),
    )
}

/// Replace spaces with underscores, then strip everything outside
/// `[A-Za-z0-9_-]`.
fn sanitize(s: &str) -> String {
    s.replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect()
}

//! Report categories and their index families

use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

/// Category of report, used to select the index family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Jobs,
    Requests,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Jobs, Collection::Requests];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Requests => "requests",
        }
    }

    /// Index name template with `{date}` left as a placeholder,
    /// e.g. `prd_reports-jobs-{date}`.
    pub fn index_template(&self, prefix: &str) -> String {
        format!("{}reports-{}-{{date}}", prefix, self.as_str())
    }

    /// Name of the index template resource, e.g. `prd_reports-jobs`.
    pub fn template_name(&self, prefix: &str) -> String {
        format!("{}reports-{}", prefix, self.as_str())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a date the way partitions are suffixed: `YYYY.MM.DD`.
pub fn partition_date(date: Date) -> String {
    format!(
        "{:04}.{:02}.{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Daily partition a report of `collection` lands in on `date`.
pub fn index_name(prefix: &str, collection: Collection, date: Date) -> String {
    collection
        .index_template(prefix)
        .replace("{date}", &partition_date(date))
}

//! Index retention patterns
//!
//! The store can only delete by pattern, so a retention window is expressed
//! as a catch-all include followed by exclusions for the partitions to keep.
//! Exclusions are as coarse as the window allows: whole years, then whole
//! months, then single days. Today's partition is always kept while any
//! window is given, since reports are still being written to it.

use std::fmt;
use time::{Date, Duration, Month};

use crate::collection::{Collection, partition_date};
use crate::error::{CoreError, Result};

/// One entry of a multi-index delete expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSelector {
    pub pattern: String,
    pub exclude: bool,
}

impl IndexSelector {
    fn include(pattern: String) -> Self {
        Self {
            pattern,
            exclude: false,
        }
    }

    fn exclude(pattern: String) -> Self {
        Self {
            pattern,
            exclude: true,
        }
    }
}

impl fmt::Display for IndexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exclude {
            write!(f, "-{}", self.pattern)
        } else {
            f.write_str(&self.pattern)
        }
    }
}

/// Ordered selectors, the include always first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPattern {
    selectors: Vec<IndexSelector>,
}

impl RetentionPattern {
    pub fn selectors(&self) -> &[IndexSelector] {
        &self.selectors
    }

    pub fn rendered(&self) -> Vec<String> {
        self.selectors.iter().map(ToString::to_string).collect()
    }

    /// Comma-joined form accepted by the store
    pub fn to_expression(&self) -> String {
        self.rendered().join(",")
    }
}

/// Whole calendar months from `from` to `to` (`from <= to`)
fn whole_months_between(from: Date, to: Date) -> i32 {
    let months = (to.year() - from.year()) * 12 + i32::from(u8::from(to.month()))
        - i32::from(u8::from(from.month()));

    if to.day() < from.day() {
        months - 1
    } else {
        months
    }
}

fn out_of_range(date: Date) -> CoreError {
    CoreError::DateOutOfRange(date.to_string())
}

/// Build the delete expression that removes every partition of `collection`
/// except those dated in `[today - keep_days, today]`.
///
/// `keep_days = 0` yields only the include, deleting the whole family.
pub fn retention_pattern(
    prefix: &str,
    collection: Collection,
    today: Date,
    keep_days: i64,
) -> Result<RetentionPattern> {
    if keep_days < 0 {
        return Err(CoreError::InvalidRetention(keep_days));
    }

    let template = collection.index_template(prefix);
    let mut selectors = vec![IndexSelector::include(template.replace("{date}", "*"))];

    let target = keep_days
        .checked_mul(86_400)
        .map(Duration::seconds)
        .and_then(|window| today.checked_sub(window))
        .ok_or_else(|| out_of_range(today))?;

    if keep_days == 0 {
        return Ok(RetentionPattern { selectors });
    }

    let mut cursor = today.previous_day().ok_or_else(|| out_of_range(today))?;
    let mut today_kept = false;

    while cursor >= target {
        let months = whole_months_between(target, cursor);

        let (date_part, next) = if months >= 12 {
            today_kept |= cursor.year() == today.year();
            (
                format!("{:04}.*.*", cursor.year()),
                Date::from_calendar_date(cursor.year() - 1, Month::December, 31).ok(),
            )
        } else if months >= 1 {
            today_kept |= cursor.year() == today.year() && cursor.month() == today.month();
            (
                format!("{:04}.{:02}.*", cursor.year(), u8::from(cursor.month())),
                cursor
                    .replace_day(1)
                    .ok()
                    .and_then(|first| first.previous_day()),
            )
        } else {
            (partition_date(cursor), cursor.previous_day())
        };

        selectors.push(IndexSelector::exclude(
            template.replace("{date}", &date_part),
        ));
        cursor = next.ok_or_else(|| out_of_range(cursor))?;
    }

    if !today_kept {
        selectors.insert(
            1,
            IndexSelector::exclude(template.replace("{date}", &partition_date(today))),
        );
    }

    Ok(RetentionPattern { selectors })
}

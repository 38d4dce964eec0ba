//! Shared models and listing logic for the PageFlow blog backend.
//!
//! The crate holds the read-only post model, the typed query interface the
//! views call into, and the listing context builder that paginates posts and
//! assembles the sidebar aggregates.

use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub mod listing;
pub mod store;

pub use listing::{
    ArchiveEntry, CategoryCount, ListingContext, ListingContextBuilder, Page, PageRangeEntry,
    PageState, Paginator,
};
pub use store::{MemoryPostStore, PostFilter, PostQuery};

// 完整文章数据模型
/// A blog post with its Markdown body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Stable post id (the content file stem).
    pub id: String,
    /// Post title.
    pub title: String,
    /// Author display name.
    pub author: String,
    /// Id of the category the post belongs to.
    pub category: String,
    /// Markdown body.
    pub content: String,
    /// Publication timestamp.
    pub created_at: NaiveDateTime,
    /// Last modification timestamp.
    pub updated_at: NaiveDateTime,
}

// 列表项（精简版）
/// Listing projection of a [`Post`], without the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Stable post id.
    pub id: String,
    /// Post title.
    pub title: String,
    /// Author display name.
    pub author: String,
    /// Id of the category the post belongs to.
    pub category: String,
    /// Publication timestamp.
    pub created_at: NaiveDateTime,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        PostSummary {
            id: post.id.clone(),
            title: post.title.clone(),
            author: post.author.clone(),
            category: post.category.clone(),
            created_at: post.created_at,
        }
    }
}

/// A post category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable category id used in URLs.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A calendar month, used by the date archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    /// Calendar year.
    pub year: i32,
    /// Month in `1..=12`.
    pub month: u32,
}

impl YearMonth {
    /// Builds a month, returning `None` when `month` is outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self {
            year,
            month,
        })
    }

    /// Month a timestamp falls into.
    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }

    /// Whether `timestamp` falls into this month.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        Self::of(timestamp) == *self
    }

    /// Sidebar / heading label, e.g. `2024年3月`.
    pub fn label(&self) -> String {
        format!("{}年{}月", self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(8, 30, 0))
            .expect("valid date")
    }

    #[test]
    fn year_month_rejects_out_of_range_months() {
        assert!(YearMonth::new(2024, 0).is_none());
        assert!(YearMonth::new(2024, 13).is_none());
        assert_eq!(
            YearMonth::new(2024, 12),
            Some(YearMonth {
                year: 2024,
                month: 12
            })
        );
    }

    #[test]
    fn year_month_matches_timestamps_in_the_same_month() {
        let march = YearMonth::of(&at(2024, 3, 15));
        assert!(march.contains(&at(2024, 3, 1)));
        assert!(!march.contains(&at(2024, 4, 1)));
        assert!(!march.contains(&at(2023, 3, 15)));
        assert_eq!(march.label(), "2024年3月");
        assert_eq!(march.to_string(), "2024-03");
    }

    #[test]
    fn months_order_chronologically() {
        let mut months = vec![
            YearMonth::of(&at(2023, 12, 1)),
            YearMonth::of(&at(2024, 2, 1)),
            YearMonth::of(&at(2024, 1, 1)),
        ];
        months.sort();
        assert_eq!(
            months.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["2023-12", "2024-01", "2024-02"]
        );
    }
}

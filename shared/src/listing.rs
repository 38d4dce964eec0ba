//! Listing context assembly shared by every post listing view.
//!
//! A listing view hands over its candidate posts (already filtered and
//! ordered) together with the raw `page` query value. The builder slices out
//! the requested page, computes the compressed page range shown by the
//! pagination control, and attaches the sidebar aggregates: post counts per
//! category and the month archive.

use std::num::{IntErrorKind, NonZeroUsize};

use anyhow::Result;
use serde::{Serialize, Serializer};

use crate::{Category, PostFilter, PostQuery, PostSummary};

/// Marker rendered in place of skipped page numbers.
pub const ELLIPSIS: &str = "...";

/// Number of pages shown on each side of the current page.
const PAGE_WINDOW: usize = 2;

/// One slot of the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRangeEntry {
    /// A clickable page number.
    Page(usize),
    /// A gap of skipped pages.
    Ellipsis,
}

impl Serialize for PageRangeEntry {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PageRangeEntry::Page(number) => serializer.serialize_u64(*number as u64),
            PageRangeEntry::Ellipsis => serializer.serialize_str(ELLIPSIS),
        }
    }
}

/// Pagination metadata for the page being rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageState {
    /// Current page, always within `1..=total_pages`.
    pub number: usize,
    /// Number of pages; at least 1 even for an empty listing.
    pub total_pages: usize,
    /// Configured items per page.
    pub page_size: usize,
    /// Number of items across all pages.
    pub total_items: usize,
    /// Whether a page precedes this one.
    pub has_previous: bool,
    /// Whether a page follows this one.
    pub has_next: bool,
    /// Number of the preceding page.
    pub previous_page_number: Option<usize>,
    /// Number of the following page.
    pub next_page_number: Option<usize>,
    /// 1-based index of the first item on this page, 0 when empty.
    pub start_index: usize,
    /// 1-based index of the last item on this page, 0 when empty.
    pub end_index: usize,
}

/// The items of one page plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page, in listing order.
    pub items: Vec<T>,
    /// Where this page sits in the listing.
    pub state: PageState,
}

/// Splits listings into fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: NonZeroUsize,
}

impl Paginator {
    /// Creates a paginator with `page_size` items per page.
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            page_size,
        }
    }

    /// Items per page.
    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    /// Number of pages needed for `total_items`. An empty listing still has
    /// one page.
    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size()).max(1)
    }

    /// Turns the raw `page` query value into a valid page number.
    ///
    /// A missing or non-integer value selects the first page. An integer
    /// outside `1..=total_pages` selects the last page.
    pub fn resolve_page(&self, requested: Option<&str>, total_items: usize) -> usize {
        let total_pages = self.total_pages(total_items);
        let Some(raw) = requested else {
            return 1;
        };

        match without_digit_separators(raw.trim()).parse::<i64>() {
            Ok(number) => usize::try_from(number)
                .ok()
                .filter(|number| (1..=total_pages).contains(number))
                .unwrap_or(total_pages),
            Err(err)
                if matches!(err.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) =>
            {
                total_pages
            },
            Err(_) => {
                tracing::debug!(page = raw, "non-numeric page parameter, using first page");
                1
            },
        }
    }

    /// Returns the requested page of `items`.
    pub fn paginate<T>(&self, items: Vec<T>, requested: Option<&str>) -> Page<T> {
        let total_items = items.len();
        let total_pages = self.total_pages(total_items);
        let number = self.resolve_page(requested, total_items);
        let page_size = self.page_size();
        let offset = (number - 1) * page_size;

        let items = items
            .into_iter()
            .skip(offset)
            .take(page_size)
            .collect::<Vec<_>>();

        let (start_index, end_index) = if items.is_empty() {
            (0, 0)
        } else {
            (offset + 1, offset + items.len())
        };
        let has_previous = number > 1;
        let has_next = number < total_pages;

        Page {
            items,
            state: PageState {
                number,
                total_pages,
                page_size,
                total_items,
                has_previous,
                has_next,
                previous_page_number: has_previous.then(|| number - 1),
                next_page_number: has_next.then(|| number + 1),
                start_index,
                end_index,
            },
        }
    }
}

/// Drops `_` separators that sit between two digits (`1_000` -> `1000`).
/// Any other underscore is left in place so the value fails to parse.
fn without_digit_separators(raw: &str) -> String {
    let bytes = raw.as_bytes();
    raw.char_indices()
        .filter(|&(index, ch)| {
            let between_digits = index > 0
                && bytes.get(index - 1).is_some_and(u8::is_ascii_digit)
                && bytes.get(index + 1).is_some_and(u8::is_ascii_digit);
            !(ch == '_' && between_digits)
        })
        .map(|(_, ch)| ch)
        .collect()
}

/// Compressed page range for the pagination control.
///
/// Shows up to two pages on each side of `current`, always includes the
/// first and last page, and puts an ellipsis wherever at least one page is
/// skipped between the window and a boundary page. For 20 pages and
/// `current == 10` this yields `[1, …, 8, 9, 10, 11, 12, …, 20]`.
pub fn page_range(current: usize, total_pages: usize) -> Vec<PageRangeEntry> {
    let total_pages = total_pages.max(1);
    let current = current.clamp(1, total_pages);
    let window_start = current.saturating_sub(PAGE_WINDOW).max(1);
    let window_end = (current + PAGE_WINDOW).min(total_pages);

    let mut range = Vec::with_capacity(window_end - window_start + 5);
    if window_start - 1 >= 2 {
        range.push(PageRangeEntry::Ellipsis);
    }
    range.extend((window_start..=window_end).map(PageRangeEntry::Page));
    if total_pages - window_end >= 2 {
        range.push(PageRangeEntry::Ellipsis);
    }

    if range.first() != Some(&PageRangeEntry::Page(1)) {
        range.insert(0, PageRangeEntry::Page(1));
    }
    if range.last() != Some(&PageRangeEntry::Page(total_pages)) {
        range.push(PageRangeEntry::Page(total_pages));
    }
    range
}

/// A category with the number of posts filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// Category id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Posts in the category, possibly zero.
    pub post_count: usize,
}

/// One month of the date archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    /// Calendar year.
    pub year: i32,
    /// Month in `1..=12`.
    pub month: u32,
    /// Display label, e.g. `2024年3月`.
    pub label: String,
    /// Posts created during the month.
    pub post_count: usize,
}

/// Post counts for every category, including empty ones, in name order.
pub fn category_counts(store: &dyn PostQuery) -> Result<Vec<CategoryCount>> {
    store
        .categories()?
        .into_iter()
        .map(|category| {
            let post_count = store.count(&PostFilter::Category(category.id.clone()))?;
            Ok(CategoryCount {
                id: category.id,
                name: category.name,
                post_count,
            })
        })
        .collect()
}

/// Months that have posts, newest first, each with its own count query.
pub fn archive(store: &dyn PostQuery) -> Result<Vec<ArchiveEntry>> {
    store
        .distinct_months()?
        .into_iter()
        .map(|month| {
            let post_count = store.count(&PostFilter::Month(month))?;
            Ok(ArchiveEntry {
                year: month.year,
                month: month.month,
                label: month.label(),
                post_count,
            })
        })
        .collect()
}

/// Everything a listing page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingContext {
    /// Posts on the current page.
    pub posts: Vec<PostSummary>,
    /// Pagination metadata.
    pub page: PageState,
    /// Page numbers and gaps for the pagination control.
    pub page_range: Vec<PageRangeEntry>,
    /// Sidebar: post counts per category.
    pub categories: Vec<CategoryCount>,
    /// Sidebar: post counts per month.
    pub archives: Vec<ArchiveEntry>,
    /// Category selected by a category listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Month label selected by a date listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_label: Option<String>,
}

impl ListingContext {
    /// Marks the listing as filtered by `category`.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Marks the listing as filtered by the month labelled `label`.
    pub fn with_month_label(mut self, label: impl Into<String>) -> Self {
        self.month_label = Some(label.into());
        self
    }
}

/// Builds [`ListingContext`]s with a fixed page size.
#[derive(Debug, Clone, Copy)]
pub struct ListingContextBuilder {
    paginator: Paginator,
}

impl ListingContextBuilder {
    /// Creates a builder paginating with `paginator`.
    pub fn new(paginator: Paginator) -> Self {
        Self {
            paginator,
        }
    }

    /// The paginator used for every listing.
    pub fn paginator(&self) -> Paginator {
        self.paginator
    }

    /// Paginates `posts` and gathers the sidebar aggregates from `store`.
    pub fn build(
        &self,
        store: &dyn PostQuery,
        posts: Vec<PostSummary>,
        requested_page: Option<&str>,
    ) -> Result<ListingContext> {
        let page = self.paginator.paginate(posts, requested_page);
        let page_range = page_range(page.state.number, page.state.total_pages);

        Ok(ListingContext {
            posts: page.items,
            page: page.state,
            page_range,
            categories: category_counts(store)?,
            archives: archive(store)?,
            category: None,
            month_label: None,
        })
    }
}

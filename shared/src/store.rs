//! Read-only post queries.

use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::Result;

use crate::{Category, Post, PostSummary, YearMonth};

/// Which posts a listing query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post.
    All,
    /// Posts in the category with this id.
    Category(String),
    /// Posts created during this month.
    Month(YearMonth),
}

impl PostFilter {
    fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Category(id) => post.category == *id,
            PostFilter::Month(month) => month.contains(&post.created_at),
        }
    }
}

/// Query capabilities the listing views need from the post store.
///
/// Listings are always ordered newest first.
pub trait PostQuery: Send + Sync {
    /// Posts selected by `filter`, newest first.
    fn posts(&self, filter: &PostFilter) -> Result<Vec<PostSummary>>;

    /// Number of posts selected by `filter`.
    fn count(&self, filter: &PostFilter) -> Result<usize>;

    /// Distinct months that have at least one post, newest first.
    fn distinct_months(&self) -> Result<Vec<YearMonth>>;

    /// All categories ordered by name.
    fn categories(&self) -> Result<Vec<Category>>;

    /// Looks up one category.
    fn category(&self, id: &str) -> Result<Option<Category>>;

    /// Looks up one post including its body.
    fn post(&self, id: &str) -> Result<Option<Post>>;

    /// The oldest post created strictly after `post`.
    fn newer_neighbor(&self, post: &Post) -> Result<Option<PostSummary>>;

    /// The newest post created strictly before `post`.
    fn older_neighbor(&self, post: &Post) -> Result<Option<PostSummary>>;
}

/// [`PostQuery`] over posts held in memory.
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    /// Sorted newest first, ties broken by id descending.
    posts: Vec<Post>,
    id_to_index: HashMap<String, usize>,
    categories: Vec<Category>,
}

impl MemoryPostStore {
    /// Builds the store. Categories referenced by posts but missing from
    /// `categories` are registered with their id as name.
    pub fn new(mut posts: Vec<Post>, mut categories: Vec<Category>) -> Self {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let mut seen = HashSet::new();
        categories.retain(|category| seen.insert(category.id.clone()));

        for post in &posts {
            if categories.iter().all(|category| category.id != post.category) {
                tracing::warn!(
                    post = %post.id,
                    category = %post.category,
                    "post references an undeclared category"
                );
                categories.push(Category {
                    id: post.category.clone(),
                    name: post.category.clone(),
                });
            }
        }
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let id_to_index = posts
            .iter()
            .enumerate()
            .map(|(index, post)| (post.id.clone(), index))
            .collect();

        Self {
            posts,
            id_to_index,
            categories,
        }
    }

    /// Number of posts loaded.
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    fn selected<'a>(&'a self, filter: &'a PostFilter) -> impl Iterator<Item = &'a Post> + 'a {
        self.posts.iter().filter(move |post| filter.matches(post))
    }
}

impl PostQuery for MemoryPostStore {
    fn posts(&self, filter: &PostFilter) -> Result<Vec<PostSummary>> {
        Ok(self.selected(filter).map(PostSummary::from).collect())
    }

    fn count(&self, filter: &PostFilter) -> Result<usize> {
        Ok(self.selected(filter).count())
    }

    fn distinct_months(&self) -> Result<Vec<YearMonth>> {
        let months = self
            .posts
            .iter()
            .map(|post| YearMonth::of(&post.created_at))
            .collect::<BTreeSet<_>>();
        Ok(months.into_iter().rev().collect())
    }

    fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    fn category(&self, id: &str) -> Result<Option<Category>> {
        Ok(self.categories.iter().find(|category| category.id == id).cloned())
    }

    fn post(&self, id: &str) -> Result<Option<Post>> {
        Ok(self
            .id_to_index
            .get(id)
            .and_then(|&index| self.posts.get(index))
            .cloned())
    }

    fn newer_neighbor(&self, post: &Post) -> Result<Option<PostSummary>> {
        Ok(self
            .posts
            .iter()
            .rev()
            .find(|candidate| candidate.created_at > post.created_at)
            .map(PostSummary::from))
    }

    fn older_neighbor(&self, post: &Post) -> Result<Option<PostSummary>> {
        Ok(self
            .posts
            .iter()
            .find(|candidate| candidate.created_at < post.created_at)
            .map(PostSummary::from))
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use gray_matter::{engine::YAML, Matter};
use pageflow_shared::{Category, Post};
use serde::Deserialize;
use tokio::fs;

/// Optional file declaring categories, so empty ones are still listed.
pub const CATEGORIES_FILE: &str = "categories.json";

const DEFAULT_AUTHOR: &str = "admin";

#[derive(Debug, Deserialize)]
struct Frontmatter {
    pub title: String,
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

/// Scan content directory and return every post plus the declared categories
pub async fn scan_content(content_dir: &Path) -> Result<(Vec<Post>, Vec<Category>)> {
    if !fs::try_exists(content_dir).await.unwrap_or(false) {
        anyhow::bail!("Content directory does not exist: {}", content_dir.display());
    }

    let categories = load_categories(content_dir).await?;
    let mut posts = Vec::new();

    let mut entries = fs::read_dir(content_dir)
        .await
        .with_context(|| format!("Failed to read {}", content_dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let file_path = entry.path();

        // Only process .md files
        if file_path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }

        // "hello-rust.md" -> "hello-rust"
        let Some(id) = file_path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!("Skipping {}: file name is not UTF-8", file_path.display());
            continue;
        };

        match load_post(&file_path, id).await {
            Ok(post) => posts.push(post),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {:#}", file_path.display(), e);
            },
        }
    }

    Ok((posts, categories))
}

async fn load_categories(content_dir: &Path) -> Result<Vec<Category>> {
    let path = content_dir.join(CATEGORIES_FILE);
    if !fs::try_exists(&path).await.unwrap_or(false) {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid {}", path.display()))
}

async fn load_post(file_path: &Path, id: &str) -> Result<Post> {
    let content = fs::read_to_string(file_path)
        .await
        .context("Failed to read file")?;
    parse_post(id, &content)
}

/// Parse a Markdown document with YAML front matter into a post
pub fn parse_post(id: &str, content: &str) -> Result<Post> {
    let matter = Matter::<YAML>::new();
    let parsed = matter.parse(content);

    let frontmatter: Frontmatter = parsed
        .data
        .ok_or_else(|| anyhow::anyhow!("No frontmatter found"))?
        .deserialize()
        .context("Failed to deserialize frontmatter")?;

    let created_at = parse_timestamp(&frontmatter.date)?;
    let updated_at = match frontmatter.updated.as_deref() {
        Some(updated) => parse_timestamp(updated)?,
        None => created_at,
    };

    Ok(Post {
        id: id.to_string(),
        title: frontmatter.title,
        author: frontmatter
            .author
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        category: frontmatter.category.trim().to_string(),
        content: parsed.content,
        created_at,
        updated_at,
    })
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.naive_local());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(timestamp);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .with_context(|| format!("Unrecognized date `{raw}`"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &TempDir, name: &str, body: &str) {
        let mut file = std::fs::File::create(dir.path().join(name)).expect("create file");
        file.write_all(body.as_bytes()).expect("write file");
    }

    #[test]
    fn parse_post_reads_frontmatter_and_body() {
        let markdown = r#"---
title: "Hello"
category: rust
author: "Ada"
date: "2024-03-09 18:30:00"
updated: "2024-03-10"
---

# Heading

Body content.
"#;
        let post = parse_post("hello", markdown).expect("parse post");
        assert_eq!(post.id, "hello");
        assert_eq!(post.title, "Hello");
        assert_eq!(post.category, "rust");
        assert_eq!(post.author, "Ada");
        assert_eq!(post.created_at.hour(), 18);
        assert_eq!(post.updated_at.day(), 10);
        assert!(post.content.contains("Body content."));
    }

    #[test]
    fn parse_post_requires_frontmatter() {
        assert!(parse_post("bare", "# Just markdown").is_err());
        assert!(parse_post("no-date", "---\ntitle: x\ncategory: y\n---\nbody").is_err());
    }

    #[test]
    fn parse_timestamp_accepts_common_formats() {
        let rfc = parse_timestamp("2024-01-02T03:04:05+08:00").expect("rfc3339");
        assert_eq!((rfc.day(), rfc.hour()), (2, 3));
        let bare = parse_timestamp(" 2024-01-02 ").expect("date only");
        assert_eq!((bare.month(), bare.hour()), (1, 0));
        assert!(parse_timestamp("02/01/2024").is_err());
    }

    #[tokio::test]
    async fn scan_content_loads_posts_and_categories() {
        let dir = TempDir::new().expect("temp dir");
        write_file(
            &dir,
            CATEGORIES_FILE,
            r#"[{"id": "rust", "name": "Rust"}, {"id": "ops", "name": "DevOps"}]"#,
        );
        write_file(&dir, "first.md", "---\ntitle: First\ncategory: rust\ndate: 2024-01-01\n---\nOne");
        write_file(&dir, "second.md", "---\ntitle: Second\ncategory: web\ndate: 2024-02-01\n---\nTwo");
        write_file(&dir, "broken.md", "no front matter here");
        write_file(&dir, "notes.txt", "ignored");

        let (mut posts, categories) = scan_content(dir.path()).await.expect("scan content");
        posts.sort_by(|a, b| a.id.cmp(&b.id));

        let ids = posts.iter().map(|post| post.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(posts[0].author, DEFAULT_AUTHOR);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].name, "DevOps");
    }

    #[tokio::test]
    async fn scan_content_without_categories_file() {
        let dir = TempDir::new().expect("temp dir");
        write_file(&dir, "only.md", "---\ntitle: Only\ncategory: misc\ndate: 2024-05-05\n---\n");

        let (posts, categories) = scan_content(dir.path()).await.expect("scan content");
        assert_eq!(posts.len(), 1);
        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn scan_content_rejects_missing_directory() {
        let dir = TempDir::new().expect("temp dir");
        let missing = dir.path().join("nope");
        assert!(scan_content(&missing).await.is_err());
    }
}

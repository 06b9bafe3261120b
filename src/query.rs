//! Stateless query operations over a catalog snapshot.
//!
//! Every function borrows the entry slice and returns owned result values;
//! nothing here mutates the snapshot.

use chrono::{DateTime, Utc};
use rand::Rng;
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use crate::entry::{CATEGORY_ALL, Entry};

pub const LIST_LIMIT_DEFAULT: usize = 20;
pub const LIST_LIMIT_MAX: usize = 100;
pub const FEATURE_LIMIT_DEFAULT: usize = 10;
pub const FEATURE_LIMIT_MAX: usize = 50;
pub const RANDOM_COUNT_DEFAULT: usize = 5;
pub const RANDOM_COUNT_MAX: usize = 20;

fn default_category() -> String {
    CATEGORY_ALL.to_string()
}

fn default_list_limit() -> usize {
    LIST_LIMIT_DEFAULT
}

fn default_feature_limit() -> usize {
    FEATURE_LIMIT_DEFAULT
}

fn default_random_count() -> usize {
    RANDOM_COUNT_DEFAULT
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema, Eq, PartialEq)]
pub struct ListParams {
    #[serde(default = "default_category")]
    #[schemars(description = "Category to list: reference, official, community or all (default all)")]
    pub category: String,
    #[serde(default)]
    #[schemars(description = "Only keep entries whose name, description or author contains this text")]
    pub search: Option<String>,
    #[serde(default = "default_list_limit")]
    #[schemars(description = "Maximum number of entries to return, 1-100 (default 20); values outside the range are clamped")]
    pub limit: usize,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            category: default_category(),
            search: None,
            limit: LIST_LIMIT_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema, Eq, PartialEq)]
pub struct DetailsParams {
    #[schemars(description = "Exact entry name, matched case-insensitively")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema, Eq, PartialEq)]
pub struct FeatureParams {
    #[schemars(description = "Feature or keyword to look for in entry names and descriptions")]
    pub feature: String,
    #[serde(default = "default_feature_limit")]
    #[schemars(description = "Maximum number of entries to return, 1-50 (default 10); values outside the range are clamped")]
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema, Eq, PartialEq)]
pub struct RandomParams {
    #[serde(default = "default_random_count")]
    #[schemars(description = "Number of entries to sample, 1-20 (default 5); values outside the range are clamped")]
    pub count: usize,
    #[serde(default = "default_category")]
    #[schemars(description = "Category to sample from: reference, official, community or all (default all)")]
    pub category: String,
}

impl Default for RandomParams {
    fn default() -> Self {
        Self {
            count: RANDOM_COUNT_DEFAULT,
            category: default_category(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ListResult {
    /// Matches before truncation.
    pub total: usize,
    pub showing: usize,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct FeatureResult {
    pub feature: String,
    pub count: usize,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct RandomResult {
    pub category: String,
    pub count: usize,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct RefreshResult {
    pub success: bool,
    pub total: usize,
    pub fetched_at: DateTime<Utc>,
}

fn in_category<'a>(entries: &'a [Entry], category: &'a str) -> impl Iterator<Item = &'a Entry> {
    entries
        .iter()
        .filter(move |entry| entry.category.matches_filter(category))
}

/// Filters by category and optional search text, then truncates.
pub fn list(entries: &[Entry], params: &ListParams) -> ListResult {
    let limit = params.limit.clamp(1, LIST_LIMIT_MAX);
    let needle = params
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let matches: Vec<&Entry> = in_category(entries, &params.category)
        .filter(|entry| {
            needle
                .as_deref()
                .is_none_or(|needle| entry.mentions_with_author(needle))
        })
        .collect();

    let entries: Vec<Entry> = matches.iter().take(limit).map(|&e| e.clone()).collect();
    ListResult {
        total: matches.len(),
        showing: entries.len(),
        entries,
    }
}

/// First entry whose name equals `name`, ignoring case.
pub fn get_details<'a>(entries: &'a [Entry], name: &str) -> Option<&'a Entry> {
    let wanted = name.to_lowercase();
    entries
        .iter()
        .find(|entry| entry.name.to_lowercase() == wanted)
}

/// Entries whose name or description mentions the feature text.
pub fn search_by_feature(entries: &[Entry], params: &FeatureParams) -> FeatureResult {
    let limit = params.limit.clamp(1, FEATURE_LIMIT_MAX);
    let needle = params.feature.to_lowercase();

    let entries: Vec<Entry> = entries
        .iter()
        .filter(|entry| entry.mentions(&needle))
        .take(limit)
        .cloned()
        .collect();

    FeatureResult {
        feature: params.feature.clone(),
        count: entries.len(),
        entries,
    }
}

/// Uniform in-place permutation, walking from the last index down to 1.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Samples up to `count` distinct entries from the chosen category.
pub fn random_sample<R: Rng>(
    entries: &[Entry],
    params: &RandomParams,
    rng: &mut R,
) -> RandomResult {
    let count = params.count.clamp(1, RANDOM_COUNT_MAX);
    let mut pool: Vec<&Entry> = in_category(entries, &params.category).collect();
    shuffle(&mut pool, rng);

    let entries: Vec<Entry> = pool.into_iter().take(count).cloned().collect();
    RandomResult {
        category: params.category.clone(),
        count: entries.len(),
        entries,
    }
}

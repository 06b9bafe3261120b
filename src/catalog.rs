use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::cache::{CatalogCache, Snapshot};
use crate::entry::Entry;
use crate::fetcher::FetchError;
use crate::query::{
    self, DetailsParams, FeatureParams, FeatureResult, ListParams, ListResult, RandomParams,
    RandomResult, RefreshResult,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to load catalog: {0}")]
    Fetch(#[from] FetchError),

    #[error("No entry named '{0}' in the catalog")]
    NotFound(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid arguments for {operation}: {source}")]
    InvalidArguments {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode result: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Names of the operations the catalog answers.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Operation {
    List,
    GetDetails,
    SearchByFeature,
    GetRandom,
    Refresh,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::List,
        Operation::GetDetails,
        Operation::SearchByFeature,
        Operation::GetRandom,
        Operation::Refresh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::GetDetails => "getDetails",
            Operation::SearchByFeature => "searchByFeature",
            Operation::GetRandom => "getRandom",
            Operation::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownOperation(s.to_string()))
    }
}

/// Answers catalog queries against an owned, lazily refreshed cache.
pub struct CatalogService {
    cache: CatalogCache,
    rng: Mutex<StdRng>,
}

impl CatalogService {
    pub fn new(cache: CatalogCache) -> Self {
        Self::with_rng(cache, StdRng::from_entropy())
    }

    pub fn with_rng(cache: CatalogCache, rng: StdRng) -> Self {
        Self {
            cache,
            rng: Mutex::new(rng),
        }
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    async fn snapshot(&self) -> Result<std::sync::Arc<Snapshot>, CatalogError> {
        Ok(self.cache.ensure_fresh().await?)
    }

    pub async fn list(&self, params: &ListParams) -> Result<ListResult, CatalogError> {
        let snapshot = self.snapshot().await?;
        Ok(query::list(&snapshot.entries, params))
    }

    pub async fn get_details(&self, name: &str) -> Result<Entry, CatalogError> {
        let snapshot = self.snapshot().await?;
        query::get_details(&snapshot.entries, name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    pub async fn search_by_feature(
        &self,
        params: &FeatureParams,
    ) -> Result<FeatureResult, CatalogError> {
        let snapshot = self.snapshot().await?;
        Ok(query::search_by_feature(&snapshot.entries, params))
    }

    pub async fn get_random(&self, params: &RandomParams) -> Result<RandomResult, CatalogError> {
        let snapshot = self.snapshot().await?;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(query::random_sample(&snapshot.entries, params, &mut *rng))
    }

    pub async fn refresh(&self) -> Result<RefreshResult, CatalogError> {
        let snapshot = self.cache.force_refresh().await?;
        Ok(RefreshResult {
            success: true,
            total: snapshot.entries.len(),
            fetched_at: snapshot.fetched_at,
        })
    }

    /// Runs the operation called `operation` with JSON arguments and returns
    /// its JSON result.
    pub async fn dispatch(&self, operation: &str, args: Value) -> Result<Value, CatalogError> {
        let op: Operation = operation.parse()?;
        tracing::debug!("Dispatching {} with {}", op, args);

        match op {
            Operation::List => encode(self.list(&decode(op, args)?).await?),
            Operation::GetDetails => {
                let params: DetailsParams = decode(op, args)?;
                encode(self.get_details(&params.name).await?)
            }
            Operation::SearchByFeature => encode(self.search_by_feature(&decode(op, args)?).await?),
            Operation::GetRandom => encode(self.get_random(&decode(op, args)?).await?),
            Operation::Refresh => encode(self.refresh().await?),
        }
    }
}

fn decode<T: DeserializeOwned>(operation: Operation, args: Value) -> Result<T, CatalogError> {
    // Missing arguments behave like an empty object so defaults apply.
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|source| CatalogError::InvalidArguments {
        operation,
        source,
    })
}

fn encode<T: Serialize>(value: T) -> Result<Value, CatalogError> {
    serde_json::to_value(value).map_err(CatalogError::Encode)
}

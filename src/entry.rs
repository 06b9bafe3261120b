use serde::{Deserialize, Serialize};
use std::fmt;

/// Section of the catalog an entry was listed under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Reference,
    Official,
    Community,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Reference => "reference",
            Category::Official => "official",
            Category::Community => "community",
        }
    }

    /// Returns true if this category passes a user supplied filter.
    ///
    /// `"all"` matches every category. Comparison ignores ASCII case.
    pub fn matches_filter(&self, filter: &str) -> bool {
        filter.eq_ignore_ascii_case(CATEGORY_ALL) || filter.eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter value accepted by the query operations to select every category.
pub const CATEGORY_ALL: &str = "all";

/// One catalog item extracted from the source document.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Entry {
    pub name: String,
    pub description: String,
    pub category: Category,
    /// Absolute URL of the entry, if the source gave one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Raw URL when it points at github.com.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Entry {
    /// Case-insensitive substring check against name and description.
    pub fn mentions(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
    }

    /// Like [`Entry::mentions`] but also looks at the author attribution.
    pub fn mentions_with_author(&self, needle_lower: &str) -> bool {
        self.mentions(needle_lower)
            || self
                .author
                .as_deref()
                .is_some_and(|author| author.to_lowercase().contains(needle_lower))
    }
}

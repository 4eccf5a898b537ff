//! Item identifiers and the ordered catalog.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// A Workshop item identifier (all ASCII digits).
///
/// Ids order numerically, so sorted output reads the way Steam lists them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Parse an id, rejecting empty or non-numeric input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public detail page for this item.
    pub fn details_url(&self) -> String {
        format!(
            "https://steamcommunity.com/sharedfiles/filedetails/?id={}",
            self.0
        )
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.0.trim_start_matches('0');
        let b = other.0.trim_start_matches('0');
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<String> for ItemId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ItemId::parse(&value).ok_or_else(|| format!("not a numeric item id: {:?}", value))
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Ordered, duplicate-free list of items the caller wants.
///
/// Order is the caller's priority and is preserved by every downstream
/// selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    ids: Vec<ItemId>,
}

impl Catalog {
    /// Build a catalog, keeping the first occurrence of each id.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = ItemId>,
    {
        let mut seen = HashSet::new();
        let ids = ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self { ids }
    }

    /// Parse newline-delimited ids; blank and non-numeric lines are skipped.
    pub fn from_text(text: &str) -> Self {
        Self::from_ids(text.lines().filter_map(ItemId::parse))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.ids.iter()
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    /// Catalog members that are in `selected`, in catalog order.
    pub fn retain_order(&self, selected: &HashSet<ItemId>) -> Vec<ItemId> {
        let mut seen = HashSet::new();
        self.ids
            .iter()
            .filter(|id| selected.contains(*id) && seen.insert((*id).clone()))
            .cloned()
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ItemId;
    type IntoIter = std::slice::Iter<'a, ItemId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// Allocation set data model
use crate::constants::{WEIGHT_SUM_TOLERANCE, WEIGHT_TOTAL};
use crate::tokens::TokenIdentity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected cart mutation; the set is left untouched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CartError {
    #[error("Token {mint} is already in the cart")]
    DuplicateToken { mint: String },

    #[error("Cart is full ({max_items} tokens maximum)")]
    CapacityReached { max_items: usize },

    #[error("Token {mint} is not in the cart")]
    TokenNotFound { mint: String },

    #[error("Invalid weight {weight} for {mint}")]
    InvalidWeight { mint: String, weight: f64 },
}

/// One token and its percentage share of the next investment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationItem {
    pub token: TokenIdentity,
    /// Percentage in [0, 100]
    pub weight: f64,
}

impl AllocationItem {
    pub fn new(token: TokenIdentity, weight: f64) -> Self {
        Self { token, weight }
    }

    pub fn mint(&self) -> &str {
        self.token.key()
    }
}

/// Ordered set of allocations with unique mints
///
/// Order is insertion order and only matters for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationSet {
    items: Vec<AllocationItem>,
}

impl AllocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw items without normalizing
    ///
    /// Callers loading untrusted data should check [`AllocationSet::is_valid`].
    pub fn from_items(items: Vec<AllocationItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[AllocationItem] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<AllocationItem> {
        &mut self.items
    }

    pub fn into_items(self) -> Vec<AllocationItem> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AllocationItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, mint: &str) -> bool {
        self.position(mint).is_some()
    }

    pub fn get(&self, mint: &str) -> Option<&AllocationItem> {
        self.items.iter().find(|item| item.mint() == mint)
    }

    pub(crate) fn position(&self, mint: &str) -> Option<usize> {
        self.items.iter().position(|item| item.mint() == mint)
    }

    pub fn total_weight(&self) -> f64 {
        self.items.iter().map(|item| item.weight).sum()
    }

    /// Weights sum to 100 within tolerance (vacuously true when empty)
    pub fn is_normalized(&self) -> bool {
        self.is_empty() || (self.total_weight() - WEIGHT_TOTAL).abs() <= WEIGHT_SUM_TOLERANCE
    }

    pub fn has_unique_mints(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.items.iter().all(|item| seen.insert(item.mint()))
    }

    /// Every weight lies in [0, 100]
    pub fn weights_in_range(&self) -> bool {
        self.items
            .iter()
            .all(|item| item.weight.is_finite() && (0.0..=WEIGHT_TOTAL).contains(&item.weight))
    }

    /// Both set invariants hold and every weight is a percentage
    pub fn is_valid(&self) -> bool {
        self.weights_in_range()
            && self.has_unique_mints()
            && self.is_normalized()
    }
}

impl<'a> IntoIterator for &'a AllocationSet {
    type Item = &'a AllocationItem;
    type IntoIter = std::slice::Iter<'a, AllocationItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Allocation store - the single owner of the user's cart
///
/// Add, remove, update-weight and clear are the entire mutation surface.
/// Every successful mutation goes through the normalization engine and is
/// then handed to the persistence backend. The store is owned by the
/// composition root and mutated through `&mut self`; the swap orchestrator
/// only ever sees a cloned snapshot.
use super::normalize::{self, NormalizationRules};
use super::persistence::CartPersistence;
use super::types::{AllocationSet, CartError};
use crate::constants::WEIGHT_TOTAL;
use crate::logger::{self, LogTag};
use crate::tokens::TokenIdentity;

pub struct AllocationStore {
    set: AllocationSet,
    rules: NormalizationRules,
    persistence: Box<dyn CartPersistence>,
}

impl AllocationStore {
    /// Empty store; nothing is loaded from the backend
    pub fn new(rules: NormalizationRules, persistence: Box<dyn CartPersistence>) -> Self {
        Self {
            set: AllocationSet::new(),
            rules,
            persistence,
        }
    }

    /// Store rehydrated from the persistence backend
    ///
    /// A persisted cart that breaks the set invariants (duplicates, bad sum,
    /// weights outside [0, 100], over capacity) is repaired: duplicates and overflow are dropped and
    /// the weights re-split equally. A load failure starts an empty cart.
    pub fn rehydrate(rules: NormalizationRules, persistence: Box<dyn CartPersistence>) -> Self {
        let set = match persistence.load() {
            Ok(Some(set)) => set,
            Ok(None) => AllocationSet::new(),
            Err(e) => {
                logger::warning(
                    LogTag::Cart,
                    &format!("Failed to load saved cart, starting empty: {}", e),
                );
                AllocationSet::new()
            }
        };

        let set = if set.is_valid() && set.len() <= rules.max_items {
            set
        } else {
            logger::warning(
                LogTag::Cart,
                &format!(
                    "Saved cart is inconsistent ({} items, total weight {:.4}), re-normalizing",
                    set.len(),
                    set.total_weight()
                ),
            );
            repair(set, &rules)
        };

        logger::debug(
            LogTag::Cart,
            &format!("Cart rehydrated with {} tokens", set.len()),
        );

        Self {
            set,
            rules,
            persistence,
        }
    }

    pub fn rules(&self) -> &NormalizationRules {
        &self.rules
    }

    /// Read-only view of the current cart
    pub fn set(&self) -> &AllocationSet {
        &self.set
    }

    /// Owned copy for a swap cycle
    pub fn snapshot(&self) -> AllocationSet {
        self.set.clone()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn add(&mut self, token: TokenIdentity) -> Result<(), CartError> {
        let label = token.label();
        let next = normalize::add(&self.set, token, &self.rules).map_err(|e| {
            logger::debug(LogTag::Cart, &format!("Add {} rejected: {}", label, e));
            e
        })?;
        self.commit(next);
        logger::info(
            LogTag::Cart,
            &format!("Added {} ({} tokens in cart)", label, self.set.len()),
        );
        Ok(())
    }

    pub fn remove(&mut self, mint: &str) -> Result<(), CartError> {
        let next = normalize::remove(&self.set, mint, &self.rules)?;
        self.commit(next);
        logger::info(
            LogTag::Cart,
            &format!("Removed {} ({} tokens in cart)", mint, self.set.len()),
        );
        Ok(())
    }

    /// Set a token's weight, clamped to [0, 100], and rescale the rest
    pub fn update_weight(&mut self, mint: &str, weight: f64) -> Result<(), CartError> {
        if !weight.is_finite() {
            return Err(CartError::InvalidWeight {
                mint: mint.to_string(),
                weight,
            });
        }
        let clamped = weight.clamp(0.0, WEIGHT_TOTAL);
        let next = normalize::update_weight(&self.set, mint, clamped, &self.rules)?;
        self.commit(next);
        logger::debug(
            LogTag::Cart,
            &format!("Weight of {} set to {:.2}%", mint, clamped),
        );
        Ok(())
    }

    /// Empty the cart (explicitly, or after a successful swap cycle)
    pub fn clear(&mut self) {
        self.commit(AllocationSet::new());
        logger::info(LogTag::Cart, "Cart cleared");
    }

    fn commit(&mut self, next: AllocationSet) {
        self.set = next;
        if let Err(e) = self.persistence.save(&self.set) {
            logger::warning(LogTag::Cart, &format!("Failed to persist cart: {}", e));
        }
    }
}

/// Drop duplicate mints and overflow, then re-split equally
fn repair(set: AllocationSet, rules: &NormalizationRules) -> AllocationSet {
    let mut repaired = AllocationSet::new();
    for item in set.into_items() {
        if repaired.len() >= rules.max_items {
            break;
        }
        if !repaired.contains(item.mint()) {
            repaired.items_mut().push(item);
        }
    }
    normalize::equalize(&mut repaired, rules.weight_decimals);
    repaired
}

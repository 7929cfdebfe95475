/// Weight normalization engine
///
/// Pure functions over an [`AllocationSet`]: each takes the prior set and
/// returns the next one, or a [`CartError`] with the input left untouched.
/// Every successful result sums to 100 within rounding tolerance.
use super::types::{AllocationItem, AllocationSet, CartError};
use crate::config::CartConfig;
use crate::constants::WEIGHT_TOTAL;
use crate::tokens::TokenIdentity;

/// Capacity and precision applied by the normalization functions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationRules {
    pub max_items: usize,
    pub weight_decimals: u32,
}

impl NormalizationRules {
    pub fn from_config(config: &CartConfig) -> Self {
        Self {
            max_items: config.max_items,
            weight_decimals: config.weight_decimals,
        }
    }
}

impl Default for NormalizationRules {
    fn default() -> Self {
        Self::from_config(&CartConfig::default())
    }
}

/// Round a weight to the configured number of decimal places
pub fn round_weight(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Give every item the same share of 100
pub fn equalize(set: &mut AllocationSet, decimals: u32) {
    let count = set.len();
    if count == 0 {
        return;
    }
    let share = round_weight(WEIGHT_TOTAL / count as f64, decimals);
    for item in set.items_mut() {
        item.weight = share;
    }
}

/// Add a token and re-split equally across all items
pub fn add(
    set: &AllocationSet,
    token: TokenIdentity,
    rules: &NormalizationRules,
) -> Result<AllocationSet, CartError> {
    if set.contains(token.key()) {
        return Err(CartError::DuplicateToken {
            mint: token.mint.clone(),
        });
    }
    if set.len() >= rules.max_items {
        return Err(CartError::CapacityReached {
            max_items: rules.max_items,
        });
    }

    let mut next = set.clone();
    next.items_mut().push(AllocationItem::new(token, 0.0));
    equalize(&mut next, rules.weight_decimals);
    Ok(next)
}

/// Remove a token and re-split equally across the remaining items
pub fn remove(
    set: &AllocationSet,
    mint: &str,
    rules: &NormalizationRules,
) -> Result<AllocationSet, CartError> {
    let index = set.position(mint).ok_or_else(|| CartError::TokenNotFound {
        mint: mint.to_string(),
    })?;

    let mut next = set.clone();
    next.items_mut().remove(index);
    equalize(&mut next, rules.weight_decimals);
    Ok(next)
}

/// Set one token's weight and rescale the others so the total stays 100
///
/// The others keep their relative proportions. When they all hold zero the
/// remainder is split equally among them instead. `new_weight` is not
/// clamped here.
pub fn update_weight(
    set: &AllocationSet,
    mint: &str,
    new_weight: f64,
    rules: &NormalizationRules,
) -> Result<AllocationSet, CartError> {
    let index = set.position(mint).ok_or_else(|| CartError::TokenNotFound {
        mint: mint.to_string(),
    })?;
    if !new_weight.is_finite() {
        return Err(CartError::InvalidWeight {
            mint: mint.to_string(),
            weight: new_weight,
        });
    }

    let decimals = rules.weight_decimals;
    let mut next = set.clone();
    let target_weight = round_weight(new_weight, decimals);
    next.items_mut()[index].weight = target_weight;

    let others = next.len() - 1;
    if others == 0 {
        return Ok(next);
    }

    let sum_of_others: f64 = set
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, item)| item.weight)
        .sum();
    let remainder = WEIGHT_TOTAL - target_weight;

    for (i, item) in next.items_mut().iter_mut().enumerate() {
        if i == index {
            continue;
        }
        let rescaled = if sum_of_others > 0.0 {
            item.weight / sum_of_others * remainder
        } else {
            remainder / others as f64
        };
        item.weight = round_weight(rescaled, decimals);
    }

    Ok(next)
}

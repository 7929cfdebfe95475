/// Platform fee calculation
///
/// The fee is withheld from the gross input before it is split across the
/// cart. `calculate_fee_with` is the pure core; `calculate_fee` reads the
/// global `[fees]` section.
use crate::config::{with_config, FeesConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub fee_amount: f64,
    pub net_amount: f64,
}

impl FeeBreakdown {
    fn no_fee(gross_amount: f64) -> Self {
        Self {
            fee_amount: 0.0,
            net_amount: gross_amount,
        }
    }
}

/// Split a gross amount into fee and net using the given settings
///
/// Disabled fees or a non-positive (or non-finite) gross amount pass the
/// amount through untouched.
pub fn calculate_fee_with(settings: &FeesConfig, gross_amount: f64) -> FeeBreakdown {
    if !settings.enabled || !gross_amount.is_finite() || gross_amount <= 0.0 {
        return FeeBreakdown::no_fee(gross_amount);
    }

    let fee_amount = gross_amount * settings.fee_percent / 100.0;
    FeeBreakdown {
        fee_amount,
        net_amount: gross_amount - fee_amount,
    }
}

/// Split a gross amount using the active configuration
pub fn calculate_fee(gross_amount: f64) -> FeeBreakdown {
    let settings = with_config(|cfg| cfg.fees.clone());
    calculate_fee_with(&settings, gross_amount)
}

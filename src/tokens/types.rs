/// Token identity and input currency types
use crate::constants::{SOL_DECIMALS, SOL_MINT, USDC_DECIMALS, USDC_MINT};
use serde::{Deserialize, Serialize};

/// Identity of a token held in a cart
///
/// Keyed by `mint`; the other fields are display data and never change once
/// the token is in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenIdentity {
    pub mint: String,
    pub symbol: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

impl TokenIdentity {
    pub fn new(mint: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            symbol: symbol.into(),
            name: name.into(),
            logo_uri: None,
            decimals: None,
        }
    }

    pub fn with_logo(mut self, logo_uri: impl Into<String>) -> Self {
        self.logo_uri = Some(logo_uri.into());
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Stable key used for uniqueness within a cart
    pub fn key(&self) -> &str {
        &self.mint
    }

    /// Short label for logs: symbol, or the mint prefix when the symbol is unknown
    pub fn label(&self) -> String {
        if self.symbol.is_empty() {
            short_mint(&self.mint)
        } else {
            self.symbol.clone()
        }
    }
}

/// Currency the user pays with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputCurrency {
    Sol,
    Usdc,
}

impl InputCurrency {
    pub fn mint(&self) -> &'static str {
        match self {
            InputCurrency::Sol => SOL_MINT,
            InputCurrency::Usdc => USDC_MINT,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            InputCurrency::Sol => "SOL",
            InputCurrency::Usdc => "USDC",
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            InputCurrency::Sol => SOL_DECIMALS,
            InputCurrency::Usdc => USDC_DECIMALS,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, InputCurrency::Sol)
    }

    /// Convert a UI amount (e.g. 1.5 SOL) to smallest units, rounding down
    ///
    /// Non-finite or non-positive amounts convert to 0.
    pub fn to_smallest_unit(&self, ui_amount: f64) -> u64 {
        if !ui_amount.is_finite() || ui_amount <= 0.0 {
            return 0;
        }
        let scaled = (ui_amount * 10f64.powi(self.decimals() as i32)).floor();
        if scaled >= u64::MAX as f64 {
            u64::MAX
        } else {
            scaled as u64
        }
    }

    pub fn to_ui_amount(&self, smallest_units: u64) -> f64 {
        smallest_units as f64 / 10f64.powi(self.decimals() as i32)
    }

    pub fn identity(&self) -> TokenIdentity {
        let name = match self {
            InputCurrency::Sol => "Wrapped SOL",
            InputCurrency::Usdc => "USD Coin",
        };
        TokenIdentity::new(self.mint(), self.symbol(), name).with_decimals(self.decimals())
    }
}

impl std::fmt::Display for InputCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl std::str::FromStr for InputCurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sol" | "wsol" => Ok(InputCurrency::Sol),
            "usdc" => Ok(InputCurrency::Usdc),
            other => Err(format!("Unsupported input currency '{}' (expected sol or usdc)", other)),
        }
    }
}

/// First 8 characters of a mint, for log lines
pub fn short_mint(mint: &str) -> String {
    mint.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smallest_unit_conversion() {
        assert_eq!(InputCurrency::Sol.to_smallest_unit(1.5), 1_500_000_000);
        assert_eq!(InputCurrency::Usdc.to_smallest_unit(2.25), 2_250_000);
        assert_eq!(InputCurrency::Usdc.to_smallest_unit(0.0000001), 0);
        assert_eq!(InputCurrency::Sol.to_smallest_unit(-1.0), 0);
        assert_eq!(InputCurrency::Sol.to_smallest_unit(f64::NAN), 0);
    }

    #[test]
    fn test_parse_input_currency() {
        assert_eq!("SOL".parse::<InputCurrency>().unwrap(), InputCurrency::Sol);
        assert_eq!(" usdc ".parse::<InputCurrency>().unwrap(), InputCurrency::Usdc);
        assert!("bonk".parse::<InputCurrency>().is_err());
    }

    #[test]
    fn test_label_falls_back_to_mint_prefix() {
        let token = TokenIdentity::new("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263", "", "");
        assert_eq!(token.label(), "DezXAZ8z");
    }
}

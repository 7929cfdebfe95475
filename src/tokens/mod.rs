//! Token identity types shared by the cart, the swap pipeline and the CLI

pub mod types;

pub use types::{short_mint, InputCurrency, TokenIdentity};

use super::{ChainRpc, RpcError};
use crate::logger::{self, LogTag};
use crate::tokens::InputCurrency;

/// Wallet balance of the input currency in UI units
pub async fn fetch_input_balance(
    rpc: &dyn ChainRpc,
    owner: &str,
    currency: InputCurrency,
) -> Result<f64, RpcError> {
    let raw = if currency.is_native() {
        rpc.get_balance(owner).await?
    } else {
        rpc.get_token_account_balance(owner, currency.mint()).await?
    };

    let balance = currency.to_ui_amount(raw);
    logger::debug(
        LogTag::Wallet,
        &format!("{} balance of {}: {}", currency.symbol(), owner, balance),
    );
    Ok(balance)
}

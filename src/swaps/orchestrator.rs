/// Batch swap orchestrator
///
/// One cycle turns a cart snapshot and an input amount into a `BatchReport`:
///
/// 1. validate the amount and withhold the platform fee
/// 2. split the net amount by weight and quote every token concurrently
/// 3. build an unsigned transaction for every token that has a route
/// 4. sign through the wallet using the strategy negotiated on connect
/// 5. (sign-all path) submit and confirm each transaction in order
///
/// Every token gets exactly one outcome and a failure on one token never
/// touches the others. Only one cycle may run at a time per orchestrator.
use super::resolver::{QuoteResolver, Resolution};
use super::router::{BuildOptions, SwapAggregator};
use super::types::{BatchReport, CycleError, CycleState, Route, SwapOutcome, SwapStatus};
use crate::cart::AllocationSet;
use crate::config::{Config, FeesConfig};
use crate::constants::WEIGHT_TOTAL;
use crate::fees::calculate_fee_with;
use crate::logger::{self, LogTag};
use crate::rpc::ChainRpc;
use crate::tokens::{short_mint, InputCurrency, TokenIdentity};
use crate::wallet::{ConnectedWallet, SigningStrategy};
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub slippage_bps: u16,
    pub build_options: BuildOptions,
    pub fees: FeesConfig,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            slippage_bps: config.swaps.slippage_bps,
            build_options: BuildOptions::from_config(&config.swaps),
            fees: config.fees.clone(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Input for one cycle
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Cart snapshot; the live cart is never touched
    pub allocation: AllocationSet,
    pub input_currency: InputCurrency,
    /// Gross amount in UI units, before the platform fee
    pub amount: f64,
    /// Wallet balance in UI units, when the caller knows it
    pub known_balance: Option<f64>,
}

/// One token's slice of the net input
#[derive(Debug, Clone)]
struct Leg {
    token: TokenIdentity,
    input_amount: u64,
}

/// A leg with a built, unsigned transaction
struct PendingLeg {
    index: usize,
    expected_output: u64,
    transaction: String,
}

/// Releases the busy flag when a cycle ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct BatchSwapOrchestrator {
    aggregator: Arc<dyn SwapAggregator>,
    resolver: QuoteResolver,
    rpc: Arc<dyn ChainRpc>,
    settings: OrchestratorSettings,
    state: Mutex<CycleState>,
    busy: AtomicBool,
}

impl BatchSwapOrchestrator {
    pub fn new(
        aggregator: Arc<dyn SwapAggregator>,
        rpc: Arc<dyn ChainRpc>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            resolver: QuoteResolver::new(aggregator.clone(), settings.slippage_bps),
            aggregator,
            rpc,
            settings,
            state: Mutex::new(CycleState::Idle),
            busy: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> CycleState {
        *self.state.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn set_state(&self, state: CycleState) {
        let mut current = self.state.lock();
        if *current != state {
            logger::verbose(
                LogTag::Swap,
                &format!("Cycle state {:?} → {:?}", *current, state),
            );
            *current = state;
        }
    }

    /// Run one batch swap cycle
    pub async fn execute(
        &self,
        wallet: &ConnectedWallet,
        request: BatchRequest,
    ) -> Result<BatchReport, CycleError> {
        let _guard = BusyGuard::acquire(&self.busy).ok_or_else(|| {
            logger::warning(LogTag::Swap, "Batch swap rejected: a cycle is already running");
            CycleError::Busy
        })?;
        let start = Instant::now();
        self.set_state(CycleState::Idle);

        let currency = request.input_currency;
        if let Err(reason) = validate_amount(request.amount, request.known_balance) {
            self.set_state(CycleState::NoValidInput);
            logger::warning(LogTag::Swap, &format!("Batch swap not started: {}", reason));
            return Err(CycleError::NoValidInput { reason });
        }
        if let Err(reason) = validate_allocation(&request.allocation) {
            self.set_state(CycleState::NoValidInput);
            logger::warning(LogTag::Swap, &format!("Batch swap not started: {}", reason));
            return Err(CycleError::InvalidAllocation { reason });
        }

        let fee = calculate_fee_with(&self.settings.fees, request.amount);
        logger::info(
            LogTag::Fees,
            &format!(
                "Input {:.6} {}: fee {:.6}, net {:.6}",
                request.amount,
                currency.symbol(),
                fee.fee_amount,
                fee.net_amount
            ),
        );

        let (legs, skipped) = plan_legs(&request.allocation, currency, fee.net_amount);
        for token in &skipped {
            logger::warning(
                LogTag::Swap,
                &format!(
                    "Skipping {}: it is the input currency",
                    token.label()
                ),
            );
        }
        if legs.is_empty() {
            self.set_state(CycleState::NothingToSwap);
            return Err(CycleError::EmptyAllocation);
        }

        logger::info(
            LogTag::Swap,
            &format!(
                "Starting batch swap of {} tokens with {} {}",
                legs.len(),
                fee.net_amount,
                currency.symbol()
            ),
        );

        // Quote and build every leg concurrently
        self.set_state(CycleState::BuildingQuotes);
        let mut slots: Vec<Option<SwapOutcome>> = vec![None; legs.len()];
        let routes = self.resolve_legs(currency, &legs, &mut slots).await;
        let pending = self.build_legs(wallet, &legs, routes, &mut slots).await;

        let strategy = if pending.is_empty() {
            None
        } else {
            self.set_state(CycleState::AwaitingSignature);
            let strategy = wallet.strategy();
            match strategy {
                SigningStrategy::BatchSignAndSend => {
                    self.sign_and_send_batch(wallet, &legs, &pending, &mut slots)
                        .await
                }
                SigningStrategy::SignAllThenSubmit => {
                    self.sign_then_submit(wallet, &legs, &pending, &mut slots)
                        .await
                }
            }
            Some(strategy)
        };

        let report = BatchReport {
            input_currency: currency,
            gross_amount: request.amount,
            fee,
            outcomes: slots.into_iter().flatten().collect(),
            skipped,
            strategy,
        };

        let breakdown = report.breakdown();
        logger::info(
            LogTag::Swap,
            &format!(
                "Batch swap finished in {:.2}s: {} succeeded, {} without route, {} failed",
                start.elapsed().as_secs_f64(),
                breakdown.succeeded,
                breakdown.no_route,
                breakdown.failed
            ),
        );

        if report.completed_count() == 0 {
            self.set_state(CycleState::AllFailed);
            Err(CycleError::AllFailed(report))
        } else {
            self.set_state(CycleState::Completed);
            Ok(report)
        }
    }

    /// Quote every leg; legs without a route get their outcome immediately
    async fn resolve_legs(
        &self,
        currency: InputCurrency,
        legs: &[Leg],
        slots: &mut [Option<SwapOutcome>],
    ) -> Vec<(usize, Route)> {
        let resolutions = join_all(legs.iter().map(|leg| async move {
            if leg.input_amount == 0 {
                return None;
            }
            Some(
                self.resolver
                    .resolve(currency.mint(), &leg.token.mint, leg.input_amount)
                    .await,
            )
        }))
        .await;

        let mut routes = Vec::new();
        for (index, (leg, resolution)) in legs.iter().zip(resolutions).enumerate() {
            match resolution {
                None => {
                    slots[index] = Some(SwapOutcome::failed(
                        leg.token.clone(),
                        SwapStatus::QuoteError,
                        format!("Share is below one {} unit", currency.symbol()),
                        0,
                    ))
                }
                Some(Resolution::Route(route)) => routes.push((index, route)),
                Some(Resolution::NoRouteFound { reason }) => {
                    slots[index] = Some(SwapOutcome::failed(
                        leg.token.clone(),
                        SwapStatus::NoRoute,
                        reason,
                        leg.input_amount,
                    ))
                }
                Some(Resolution::QuoteError { message }) => {
                    slots[index] = Some(SwapOutcome::failed(
                        leg.token.clone(),
                        SwapStatus::QuoteError,
                        message,
                        leg.input_amount,
                    ))
                }
            }
        }
        routes
    }

    async fn build_legs(
        &self,
        wallet: &ConnectedWallet,
        legs: &[Leg],
        routes: Vec<(usize, Route)>,
        slots: &mut [Option<SwapOutcome>],
    ) -> Vec<PendingLeg> {
        let options = self.settings.build_options;
        let user = wallet.public_key();
        let builds = join_all(routes.iter().map(|(_, route)| {
            self.aggregator.build_transaction(route, user, options)
        }))
        .await;

        let mut pending = Vec::new();
        for ((index, route), build) in routes.into_iter().zip(builds) {
            let leg = &legs[index];
            match build {
                Ok(transaction) => pending.push(PendingLeg {
                    index,
                    expected_output: route.out_amount,
                    transaction,
                }),
                Err(e) => {
                    logger::warning(
                        LogTag::Swap,
                        &format!("Build failed for {}: {}", leg.token.label(), e),
                    );
                    slots[index] = Some(
                        SwapOutcome::failed(
                            leg.token.clone(),
                            SwapStatus::BuildError,
                            e.to_string(),
                            leg.input_amount,
                        )
                        .with_expected_output(route.out_amount),
                    );
                }
            }
        }
        pending
    }

    /// Single wallet prompt; the i-th returned signature belongs to the i-th
    /// transaction, and transactions past the returned count were not signed
    async fn sign_and_send_batch(
        &self,
        wallet: &ConnectedWallet,
        legs: &[Leg],
        pending: &[PendingLeg],
        slots: &mut [Option<SwapOutcome>],
    ) {
        let transactions: Vec<String> = pending.iter().map(|p| p.transaction.clone()).collect();
        match wallet.sign_and_send_all(&transactions).await {
            Ok(signatures) => {
                if signatures.len() < pending.len() {
                    logger::warning(
                        LogTag::Wallet,
                        &format!(
                            "Wallet returned {} signatures for {} transactions",
                            signatures.len(),
                            pending.len()
                        ),
                    );
                }
                for (position, leg_tx) in pending.iter().enumerate() {
                    let leg = &legs[leg_tx.index];
                    slots[leg_tx.index] = Some(match signatures.get(position) {
                        Some(signature) => SwapOutcome::completed(
                            leg.token.clone(),
                            leg.input_amount,
                            leg_tx.expected_output,
                            signature.clone(),
                        ),
                        None => SwapOutcome::failed(
                            leg.token.clone(),
                            SwapStatus::SignError,
                            "Wallet did not return a signature for this transaction",
                            leg.input_amount,
                        )
                        .with_expected_output(leg_tx.expected_output),
                    });
                }
            }
            Err(e) => {
                logger::warning(LogTag::Wallet, &format!("Batch signing failed: {}", e));
                fail_all(legs, pending, slots, SwapStatus::SignError, &e.to_string());
            }
        }
    }

    async fn sign_then_submit(
        &self,
        wallet: &ConnectedWallet,
        legs: &[Leg],
        pending: &[PendingLeg],
        slots: &mut [Option<SwapOutcome>],
    ) {
        let transactions: Vec<String> = pending.iter().map(|p| p.transaction.clone()).collect();
        let signed = match wallet.sign_all(&transactions).await {
            Ok(signed) => signed,
            Err(e) => {
                logger::warning(LogTag::Wallet, &format!("Signing failed: {}", e));
                fail_all(legs, pending, slots, SwapStatus::SignError, &e.to_string());
                return;
            }
        };

        self.set_state(CycleState::Submitting);
        for (position, leg_tx) in pending.iter().enumerate() {
            let leg = &legs[leg_tx.index];
            let outcome = match signed.get(position) {
                Some(transaction) => self.submit_leg(leg, leg_tx, transaction).await,
                None => SwapOutcome::failed(
                    leg.token.clone(),
                    SwapStatus::SignError,
                    "Wallet did not return this transaction signed",
                    leg.input_amount,
                )
                .with_expected_output(leg_tx.expected_output),
            };
            slots[leg_tx.index] = Some(outcome);
        }
    }

    async fn submit_leg(&self, leg: &Leg, leg_tx: &PendingLeg, transaction: &str) -> SwapOutcome {
        let failed = |detail: String| {
            SwapOutcome::failed(
                leg.token.clone(),
                SwapStatus::SubmitError,
                detail,
                leg.input_amount,
            )
            .with_expected_output(leg_tx.expected_output)
        };

        let signature = match self.rpc.send_raw_transaction(transaction).await {
            Ok(signature) => signature,
            Err(e) => {
                logger::warning(
                    LogTag::Swap,
                    &format!("Submit failed for {}: {}", leg.token.label(), e),
                );
                return failed(e.to_string());
            }
        };

        match self.rpc.confirm_transaction(&signature).await {
            Ok(true) => {
                logger::info(
                    LogTag::Swap,
                    &format!(
                        "Swapped into {} ({}): {}",
                        leg.token.label(),
                        short_mint(&leg.token.mint),
                        signature
                    ),
                );
                SwapOutcome::completed(
                    leg.token.clone(),
                    leg.input_amount,
                    leg_tx.expected_output,
                    signature,
                )
            }
            Ok(false) => failed(format!("Not confirmed before timeout: {}", signature))
                .with_signature(signature),
            Err(e) => failed(e.to_string()).with_signature(signature),
        }
    }
}

fn validate_amount(amount: f64, known_balance: Option<f64>) -> Result<(), String> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(format!("amount must be a positive number, got {}", amount));
    }
    if let Some(balance) = known_balance {
        if amount > balance {
            return Err(format!(
                "amount {} exceeds wallet balance {}",
                amount, balance
            ));
        }
    }
    Ok(())
}

/// Shares are only bounded by the net amount when the snapshot is a valid set
fn validate_allocation(allocation: &AllocationSet) -> Result<(), String> {
    if !allocation.weights_in_range() {
        return Err("every weight must be between 0 and 100".to_string());
    }
    if !allocation.has_unique_mints() {
        return Err("a token appears more than once".to_string());
    }
    if !allocation.is_normalized() {
        return Err(format!(
            "weights sum to {:.4} instead of {}",
            allocation.total_weight(),
            WEIGHT_TOTAL
        ));
    }
    Ok(())
}

/// Split the net amount across positive-weight items in cart order
fn plan_legs(
    allocation: &AllocationSet,
    currency: InputCurrency,
    net_amount: f64,
) -> (Vec<Leg>, Vec<TokenIdentity>) {
    let mut legs = Vec::new();
    let mut skipped = Vec::new();

    for item in allocation {
        if item.weight <= 0.0 {
            continue;
        }
        if item.mint() == currency.mint() {
            skipped.push(item.token.clone());
            continue;
        }
        let share = net_amount * item.weight / WEIGHT_TOTAL;
        legs.push(Leg {
            token: item.token.clone(),
            input_amount: currency.to_smallest_unit(share),
        });
    }

    (legs, skipped)
}

fn fail_all(
    legs: &[Leg],
    pending: &[PendingLeg],
    slots: &mut [Option<SwapOutcome>],
    status: SwapStatus,
    detail: &str,
) {
    for leg_tx in pending {
        let leg = &legs[leg_tx.index];
        slots[leg_tx.index] = Some(
            SwapOutcome::failed(leg.token.clone(), status, detail, leg.input_amount)
                .with_expected_output(leg_tx.expected_output),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::AllocationItem;
    use crate::rpc::RpcError;
    use crate::swaps::types::{AggregatorError, QuoteRequest, QuoteResponse, RouteCandidate};
    use crate::wallet::{WalletCapabilities, WalletError, WalletProvider};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    // ------------------------------------------------------------------
    // scripted collaborators
    // ------------------------------------------------------------------

    #[derive(Clone, Copy)]
    enum Script {
        Route(u64),
        NoRoute,
        QuoteFails,
        BuildFails,
    }

    #[derive(Default)]
    struct ScriptedAggregator {
        scripts: HashMap<String, Script>,
        quote_delay: Option<Duration>,
        quotes: Mutex<Vec<QuoteRequest>>,
    }

    impl ScriptedAggregator {
        fn with(mut self, mint: &str, script: Script) -> Self {
            self.scripts.insert(mint.to_string(), script);
            self
        }

        fn quoted_amount(&self, mint: &str) -> Option<u64> {
            self.quotes
                .lock()
                .iter()
                .find(|q| q.output_mint == mint)
                .map(|q| q.amount)
        }
    }

    #[async_trait]
    impl SwapAggregator for ScriptedAggregator {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        async fn get_quote(
            &self,
            request: &QuoteRequest,
        ) -> Result<QuoteResponse, AggregatorError> {
            if let Some(delay) = self.quote_delay {
                tokio::time::sleep(delay).await;
            }
            self.quotes.lock().push(request.clone());
            let candidate = |out_amount: u64| RouteCandidate {
                out_amount,
                price_impact_pct: 0.0,
                route_label: "Direct".to_string(),
                raw: serde_json::json!({}),
            };
            match self.scripts.get(&request.output_mint) {
                Some(Script::Route(out)) => Ok(QuoteResponse::single(candidate(*out))),
                Some(Script::BuildFails) => Ok(QuoteResponse::single(candidate(1))),
                Some(Script::QuoteFails) => Err(AggregatorError::Http {
                    status: 500,
                    body: "boom".to_string(),
                }),
                Some(Script::NoRoute) | None => Ok(QuoteResponse::empty()),
            }
        }

        async fn build_transaction(
            &self,
            route: &Route,
            _user_public_key: &str,
            _options: BuildOptions,
        ) -> Result<String, AggregatorError> {
            match self.scripts.get(&route.output_mint) {
                Some(Script::BuildFails) => {
                    Err(AggregatorError::Parse("missing swapTransaction".to_string()))
                }
                _ => Ok(format!("tx:{}", route.output_mint)),
            }
        }
    }

    struct ScriptedWallet {
        batch: bool,
        /// Batch path only: how many signatures the wallet hands back
        batch_limit: Option<usize>,
        reject: bool,
    }

    impl ScriptedWallet {
        fn sign_all_then_submit() -> Self {
            Self {
                batch: false,
                batch_limit: None,
                reject: false,
            }
        }

        fn batch(batch_limit: Option<usize>) -> Self {
            Self {
                batch: true,
                batch_limit,
                reject: false,
            }
        }
    }

    #[async_trait]
    impl WalletProvider for ScriptedWallet {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn connect(&self) -> Result<String, WalletError> {
            Ok("User1111111111111111111111111111111111111111".to_string())
        }

        fn capabilities(&self) -> WalletCapabilities {
            WalletCapabilities {
                sign_and_send_all: self.batch,
            }
        }

        async fn sign_transaction(&self, transaction: &str) -> Result<String, WalletError> {
            if self.reject {
                return Err(WalletError::Rejected("user closed the popup".to_string()));
            }
            Ok(format!("signed:{}", transaction))
        }

        async fn sign_and_send_all_transactions(
            &self,
            transactions: &[String],
        ) -> Result<Vec<String>, WalletError> {
            if self.reject {
                return Err(WalletError::Rejected("user closed the popup".to_string()));
            }
            let count = self
                .batch_limit
                .unwrap_or(transactions.len())
                .min(transactions.len());
            Ok(transactions[..count]
                .iter()
                .map(|tx| format!("sig:{}", tx))
                .collect())
        }
    }

    /// Submits everything except transactions for mints in `failing`
    #[derive(Default)]
    struct ScriptedRpc {
        failing: Vec<String>,
        unconfirmed: Vec<String>,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChainRpc for ScriptedRpc {
        async fn get_balance(&self, _address: &str) -> Result<u64, RpcError> {
            Ok(0)
        }

        async fn get_token_account_balance(
            &self,
            _owner: &str,
            _mint: &str,
        ) -> Result<u64, RpcError> {
            Ok(0)
        }

        async fn send_raw_transaction(&self, signed: &str) -> Result<String, RpcError> {
            self.sent.lock().push(signed.to_string());
            if self.failing.iter().any(|mint| signed.ends_with(mint.as_str())) {
                return Err(RpcError::Rpc {
                    code: -32002,
                    message: "Transaction simulation failed".to_string(),
                });
            }
            Ok(format!("sig:{}", signed))
        }

        async fn confirm_transaction(&self, signature: &str) -> Result<bool, RpcError> {
            Ok(!self
                .unconfirmed
                .iter()
                .any(|mint| signature.ends_with(mint.as_str())))
        }
    }

    // ------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------

    fn mint(symbol: &str) -> String {
        format!("{}Mint1111111111111111111111111111", symbol)
    }

    fn token(symbol: &str) -> TokenIdentity {
        TokenIdentity::new(mint(symbol), symbol, symbol)
    }

    fn allocation(weights: &[(&str, f64)]) -> AllocationSet {
        AllocationSet::from_items(
            weights
                .iter()
                .map(|(symbol, weight)| AllocationItem::new(token(symbol), *weight))
                .collect(),
        )
    }

    fn request(allocation: AllocationSet, amount: f64) -> BatchRequest {
        BatchRequest {
            allocation,
            input_currency: InputCurrency::Sol,
            amount,
            known_balance: None,
        }
    }

    async fn connect(wallet: ScriptedWallet) -> ConnectedWallet {
        ConnectedWallet::connect(Arc::new(wallet)).await.unwrap()
    }

    fn orchestrator(
        aggregator: Arc<ScriptedAggregator>,
        rpc: Arc<ScriptedRpc>,
    ) -> BatchSwapOrchestrator {
        BatchSwapOrchestrator::new(aggregator, rpc, OrchestratorSettings::default())
    }

    // ------------------------------------------------------------------
    // tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_happy_path_sign_all_then_submit() {
        let aggregator = Arc::new(
            ScriptedAggregator::default()
                .with(&mint("AAA"), Script::Route(100))
                .with(&mint("BBB"), Script::Route(200))
                .with(&mint("CCC"), Script::Route(300)),
        );
        let rpc = Arc::new(ScriptedRpc::default());
        let orch = orchestrator(aggregator.clone(), rpc.clone());
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        let report = orch
            .execute(
                &wallet,
                request(allocation(&[("AAA", 50.0), ("BBB", 25.0), ("CCC", 25.0)]), 1.0),
            )
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.is_full_success());
        assert_eq!(report.strategy, Some(SigningStrategy::SignAllThenSubmit));
        assert_eq!(orch.state(), CycleState::Completed);

        // shares follow the weights, in lamports
        assert_eq!(aggregator.quoted_amount(&mint("AAA")), Some(500_000_000));
        assert_eq!(aggregator.quoted_amount(&mint("BBB")), Some(250_000_000));
        assert_eq!(aggregator.quoted_amount(&mint("CCC")), Some(250_000_000));

        // outcomes stay in cart order with their own signatures
        let symbols: Vec<&str> = report.outcomes.iter().map(|o| o.token.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "BBB", "CCC"]);
        assert_eq!(
            report.outcomes[1].signature.as_deref(),
            Some(format!("sig:signed:tx:{}", mint("BBB")).as_str())
        );
        assert_eq!(report.outcomes[2].expected_output, Some(300));
        assert_eq!(rpc.sent.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_failures_are_isolated_per_token() {
        let aggregator = Arc::new(
            ScriptedAggregator::default()
                .with(&mint("AAA"), Script::Route(100))
                .with(&mint("BBB"), Script::NoRoute)
                .with(&mint("CCC"), Script::QuoteFails)
                .with(&mint("DDD"), Script::BuildFails)
                .with(&mint("EEE"), Script::Route(500)),
        );
        let rpc = Arc::new(ScriptedRpc {
            failing: vec![mint("EEE")],
            ..ScriptedRpc::default()
        });
        let orch = orchestrator(aggregator, rpc);
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        let report = orch
            .execute(
                &wallet,
                request(
                    allocation(&[
                        ("AAA", 20.0),
                        ("BBB", 20.0),
                        ("CCC", 20.0),
                        ("DDD", 20.0),
                        ("EEE", 20.0),
                    ]),
                    1.0,
                ),
            )
            .await
            .unwrap();

        let status = |symbol: &str| report.outcome_for(&mint(symbol)).unwrap().status;
        assert_eq!(status("AAA"), SwapStatus::Completed);
        assert_eq!(status("BBB"), SwapStatus::NoRoute);
        assert_eq!(status("CCC"), SwapStatus::QuoteError);
        assert_eq!(status("DDD"), SwapStatus::BuildError);
        assert_eq!(status("EEE"), SwapStatus::SubmitError);

        let breakdown = report.breakdown();
        assert_eq!(breakdown.succeeded, 1);
        assert_eq!(breakdown.no_route, 1);
        assert_eq!(breakdown.failed, 3);
    }

    #[tokio::test]
    async fn test_submit_continues_after_failure() {
        let aggregator = Arc::new(
            ScriptedAggregator::default()
                .with(&mint("AAA"), Script::Route(1))
                .with(&mint("BBB"), Script::Route(2))
                .with(&mint("CCC"), Script::Route(3)),
        );
        let rpc = Arc::new(ScriptedRpc {
            failing: vec![mint("AAA")],
            unconfirmed: vec![mint("BBB")],
            ..ScriptedRpc::default()
        });
        let orch = orchestrator(aggregator, rpc.clone());
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        let report = orch
            .execute(
                &wallet,
                request(allocation(&[("AAA", 50.0), ("BBB", 25.0), ("CCC", 25.0)]), 1.0),
            )
            .await
            .unwrap();

        assert_eq!(rpc.sent.lock().len(), 3);
        assert_eq!(report.outcomes[0].status, SwapStatus::SubmitError);
        assert_eq!(report.outcomes[1].status, SwapStatus::SubmitError);
        assert!(report.outcomes[1].signature.is_some());
        assert_eq!(report.outcomes[2].status, SwapStatus::Completed);
    }

    #[tokio::test]
    async fn test_batch_signatures_map_positionally() {
        let aggregator = Arc::new(
            ScriptedAggregator::default()
                .with(&mint("AAA"), Script::Route(1))
                .with(&mint("BBB"), Script::NoRoute)
                .with(&mint("CCC"), Script::Route(3))
                .with(&mint("DDD"), Script::Route(4)),
        );
        let rpc = Arc::new(ScriptedRpc::default());
        let orch = orchestrator(aggregator, rpc.clone());
        let wallet = connect(ScriptedWallet::batch(Some(2))).await;

        let report = orch
            .execute(
                &wallet,
                request(
                    allocation(&[("AAA", 25.0), ("BBB", 25.0), ("CCC", 25.0), ("DDD", 25.0)]),
                    1.0,
                ),
            )
            .await
            .unwrap();

        assert_eq!(report.strategy, Some(SigningStrategy::BatchSignAndSend));
        // AAA and CCC were the first two built transactions
        assert_eq!(report.outcomes[0].status, SwapStatus::Completed);
        assert_eq!(
            report.outcomes[0].signature.as_deref(),
            Some(format!("sig:tx:{}", mint("AAA")).as_str())
        );
        assert_eq!(report.outcomes[1].status, SwapStatus::NoRoute);
        assert_eq!(report.outcomes[2].status, SwapStatus::Completed);
        assert_eq!(report.outcomes[3].status, SwapStatus::SignError);
        // the wallet broadcasts, RPC is not used
        assert!(rpc.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_signature_fails_every_built_leg() {
        let aggregator = Arc::new(
            ScriptedAggregator::default()
                .with(&mint("AAA"), Script::Route(1))
                .with(&mint("BBB"), Script::NoRoute),
        );
        let orch = orchestrator(aggregator, Arc::new(ScriptedRpc::default()));
        let wallet = connect(ScriptedWallet {
            batch: false,
            batch_limit: None,
            reject: true,
        })
        .await;

        let err = orch
            .execute(&wallet, request(allocation(&[("AAA", 50.0), ("BBB", 50.0)]), 1.0))
            .await
            .unwrap_err();

        match err {
            CycleError::AllFailed(report) => {
                assert_eq!(report.outcomes[0].status, SwapStatus::SignError);
                assert_eq!(report.outcomes[1].status, SwapStatus::NoRoute);
            }
            other => panic!("expected AllFailed, got {:?}", other),
        }
        assert_eq!(orch.state(), CycleState::AllFailed);
    }

    #[tokio::test]
    async fn test_all_no_route_is_all_failed() {
        let aggregator = Arc::new(ScriptedAggregator::default());
        let orch = orchestrator(aggregator, Arc::new(ScriptedRpc::default()));
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        let err = orch
            .execute(&wallet, request(allocation(&[("AAA", 60.0), ("BBB", 40.0)]), 1.0))
            .await
            .unwrap_err();

        match err {
            CycleError::AllFailed(report) => {
                assert_eq!(report.outcomes.len(), 2);
                assert_eq!(report.breakdown().no_route, 2);
                assert_eq!(report.strategy, None);
            }
            other => panic!("expected AllFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_amounts_are_rejected() {
        let aggregator = Arc::new(ScriptedAggregator::default().with(&mint("AAA"), Script::Route(1)));
        let orch = orchestrator(aggregator.clone(), Arc::new(ScriptedRpc::default()));
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        for amount in [0.0, -1.0, f64::NAN] {
            let err = orch
                .execute(&wallet, request(allocation(&[("AAA", 100.0)]), amount))
                .await
                .unwrap_err();
            assert!(matches!(err, CycleError::NoValidInput { .. }));
        }

        let mut over_balance = request(allocation(&[("AAA", 100.0)]), 2.0);
        over_balance.known_balance = Some(1.5);
        let err = orch.execute(&wallet, over_balance).await.unwrap_err();
        assert!(matches!(err, CycleError::NoValidInput { .. }));
        assert_eq!(orch.state(), CycleState::NoValidInput);

        // nothing reached the aggregator
        assert!(aggregator.quotes.lock().is_empty());
    }

    #[tokio::test]
    async fn test_input_currency_token_is_skipped() {
        let aggregator = Arc::new(ScriptedAggregator::default().with(&mint("AAA"), Script::Route(1)));
        let orch = orchestrator(aggregator.clone(), Arc::new(ScriptedRpc::default()));
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        let set = AllocationSet::from_items(vec![
            AllocationItem::new(InputCurrency::Sol.identity(), 50.0),
            AllocationItem::new(token("AAA"), 50.0),
        ]);
        let report = orch.execute(&wallet, request(set, 1.0)).await.unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].mint, InputCurrency::Sol.mint());
        assert_eq!(aggregator.quotes.lock().len(), 1);

        let only_sol = AllocationSet::from_items(vec![AllocationItem::new(
            InputCurrency::Sol.identity(),
            100.0,
        )]);
        let err = orch.execute(&wallet, request(only_sol, 1.0)).await.unwrap_err();
        assert_eq!(err, CycleError::EmptyAllocation);
        assert_eq!(orch.state(), CycleState::NothingToSwap);
    }

    #[tokio::test]
    async fn test_invalid_allocation_is_rejected_before_quoting() {
        let aggregator = Arc::new(
            ScriptedAggregator::default()
                .with(&mint("AAA"), Script::Route(1))
                .with(&mint("BBB"), Script::Route(1)),
        );
        let orch = orchestrator(aggregator.clone(), Arc::new(ScriptedRpc::default()));
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        let bad_sets = [
            allocation(&[("AAA", 150.0), ("BBB", -50.0)]),
            allocation(&[("AAA", 60.0), ("BBB", 60.0)]),
            allocation(&[("AAA", 50.0), ("AAA", 50.0)]),
        ];
        for set in bad_sets {
            let mut bad = request(set, 1.0);
            bad.known_balance = Some(1.0);
            let err = orch.execute(&wallet, bad).await.unwrap_err();
            assert!(matches!(err, CycleError::InvalidAllocation { .. }), "{:?}", err);
            assert_eq!(orch.state(), CycleState::NoValidInput);
        }

        assert!(aggregator.quotes.lock().is_empty());
    }

    #[tokio::test]
    async fn test_zero_weight_and_dust_legs() {
        let aggregator = Arc::new(
            ScriptedAggregator::default()
                .with(&mint("AAA"), Script::Route(1))
                .with(&mint("BBB"), Script::Route(1)),
        );
        let orch = orchestrator(aggregator.clone(), Arc::new(ScriptedRpc::default()));
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        // BBB has no weight and is not attempted
        let report = orch
            .execute(&wallet, request(allocation(&[("AAA", 100.0), ("BBB", 0.0)]), 1.0))
            .await
            .unwrap();
        assert_eq!(report.outcomes.len(), 1);

        // a share below one lamport is a quote error without a request
        let set = allocation(&[("AAA", 99.5), ("BBB", 0.5)]);
        let report = orch.execute(&wallet, request(set, 0.000_000_1)).await.unwrap();
        assert_eq!(report.outcomes[1].status, SwapStatus::QuoteError);
        assert_eq!(report.outcomes[1].input_amount, 0);
    }

    #[tokio::test]
    async fn test_fee_is_withheld_before_split() {
        let aggregator = Arc::new(ScriptedAggregator::default().with(&mint("AAA"), Script::Route(1)));
        let settings = OrchestratorSettings {
            fees: FeesConfig {
                enabled: true,
                fee_percent: 1.0,
            },
            ..OrchestratorSettings::default()
        };
        let orch = BatchSwapOrchestrator::new(
            aggregator.clone(),
            Arc::new(ScriptedRpc::default()),
            settings,
        );
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        let report = orch
            .execute(&wallet, request(allocation(&[("AAA", 100.0)]), 100.0))
            .await
            .unwrap();

        assert_eq!(report.fee.fee_amount, 1.0);
        assert_eq!(report.fee.net_amount, 99.0);
        assert_eq!(aggregator.quoted_amount(&mint("AAA")), Some(99_000_000_000));
    }

    #[tokio::test]
    async fn test_concurrent_cycle_is_rejected() {
        let aggregator = Arc::new(ScriptedAggregator {
            quote_delay: Some(Duration::from_millis(100)),
            ..ScriptedAggregator::default().with(&mint("AAA"), Script::Route(1))
        });
        let orch = orchestrator(aggregator, Arc::new(ScriptedRpc::default()));
        let wallet = connect(ScriptedWallet::sign_all_then_submit()).await;

        let (first, second) = tokio::join!(
            orch.execute(&wallet, request(allocation(&[("AAA", 100.0)]), 1.0)),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                assert!(orch.is_busy());
                orch.execute(&wallet, request(allocation(&[("AAA", 100.0)]), 1.0))
                    .await
            }
        );

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), CycleError::Busy);
        assert!(!orch.is_busy());

        // the guard is released for the next cycle
        assert!(orch
            .execute(&wallet, request(allocation(&[("AAA", 100.0)]), 1.0))
            .await
            .is_ok());
    }
}

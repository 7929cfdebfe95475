use anyhow::{bail, Context, Result};
use cartswap::{
    apis::TokenDataClient,
    cart::{AllocationStore, JsonFilePersistence, NormalizationRules},
    config::{self, Config},
    display,
    fees::calculate_fee,
    logger::{self, LogTag},
    paths,
    rpc::{fetch_input_balance, SolanaRpcClient},
    swaps::{BatchRequest, BatchSwapOrchestrator, CycleError, JupiterAggregator, OrchestratorSettings},
    tokens::InputCurrency,
    wallet::{ConnectedWallet, KeypairWallet, WalletProvider},
};
use clap::{Args, Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Buy a basket of Solana tokens in one go
#[derive(Parser, Debug)]
#[command(name = "cartswap", version, about)]
struct Cli {
    /// Config file (defaults to the data directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logs for a tag (repeatable, or "all")
    #[arg(long, global = true, value_name = "TAG", value_delimiter = ',')]
    debug: Vec<String>,

    /// Enable verbose logs for every debug-enabled tag
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect or edit the cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Swap an amount of SOL or USDC into every token in the cart
    Execute(ExecuteArgs),
}

#[derive(Subcommand, Debug)]
enum CartCommand {
    Show {
        /// Include current USD prices
        #[arg(long)]
        prices: bool,
    },
    Add {
        mint: String,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    Remove {
        mint: String,
    },
    /// Set a token's weight in percent; the others are rescaled
    Set {
        mint: String,
        weight: f64,
    },
    Clear,
}

#[derive(Args, Debug)]
struct ExecuteArgs {
    /// Gross amount to spend, before the platform fee
    #[arg(long)]
    amount: f64,

    /// Currency to pay with: sol or usdc
    #[arg(long, default_value = "sol")]
    input: InputCurrency,

    /// solana-keygen JSON file (defaults to wallet.private_key in config)
    #[arg(long, value_name = "PATH")]
    keypair: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logger needs the logs directory
    if let Err(e) = paths::ensure_all_directories() {
        eprintln!("❌ Failed to create required directories: {}", e);
        std::process::exit(1);
    }

    logger::init(&cli.debug, cli.verbose);

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            logger::error(LogTag::System, &format!("{:#}", e));
            1
        }
    };

    logger::flush();
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(paths::get_config_path);
    let first_run = !config_path.exists();
    config::load_config_from_path(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if first_run {
        match config::save_config(&config_path) {
            Ok(()) => logger::info(
                LogTag::Config,
                &format!("Wrote default configuration to {}", config_path.display()),
            ),
            Err(e) => logger::warning(
                LogTag::Config,
                &format!("Could not write {}: {}", config_path.display(), e),
            ),
        }
    }
    let cfg = config::get_config_clone();

    let mut store = AllocationStore::rehydrate(
        NormalizationRules::from_config(&cfg.cart),
        Box::new(JsonFilePersistence::new(paths::get_cart_path())),
    );

    match cli.command {
        Command::Cart(command) => run_cart(command, &mut store, &cfg).await,
        Command::Execute(args) => run_execute(args, &mut store, &cfg).await,
    }
}

async fn run_cart(command: CartCommand, store: &mut AllocationStore, cfg: &Config) -> Result<()> {
    match command {
        CartCommand::Show { prices } => {
            if store.is_empty() {
                println!("Cart is empty");
                return Ok(());
            }

            let price_map = if prices {
                let mints: Vec<String> = store.set().iter().map(|item| item.mint().to_string()).collect();
                match TokenDataClient::new(&cfg.tokens)?.get_prices(&mints).await {
                    Ok(map) => Some(map),
                    Err(e) => {
                        logger::warning(LogTag::Tokens, &format!("Prices unavailable: {}", e));
                        None
                    }
                }
            } else {
                None
            };

            println!("{}", display::cart_table(store.set(), price_map.as_ref()));
            println!(
                "{}/{} tokens, total weight {:.2}%",
                store.len(),
                store.rules().max_items,
                store.set().total_weight()
            );
        }
        CartCommand::Add { mint, symbol, name } => {
            Pubkey::from_str(&mint).with_context(|| format!("'{}' is not a valid mint address", mint))?;
            if store.set().contains(&mint) {
                println!("{} is already in the cart", mint);
                return Ok(());
            }
            let client = TokenDataClient::new(&cfg.tokens)?;
            let token = client.resolve_identity(&mint, symbol, name).await;
            store.add(token)?;
            println!("{}", display::cart_table(store.set(), None));
        }
        CartCommand::Remove { mint } => {
            store.remove(&mint)?;
            println!("{}", display::cart_table(store.set(), None));
        }
        CartCommand::Set { mint, weight } => {
            store.update_weight(&mint, weight)?;
            println!("{}", display::cart_table(store.set(), None));
        }
        CartCommand::Clear => store.clear(),
    }
    Ok(())
}

fn load_wallet(args: &ExecuteArgs, cfg: &Config) -> Result<Arc<dyn WalletProvider>> {
    let wallet = match &args.keypair {
        Some(path) => KeypairWallet::from_file(path)?,
        None => KeypairWallet::from_private_key(&cfg.wallet.private_key)
            .context("Set wallet.private_key in the config or pass --keypair")?,
    };
    Ok(Arc::new(wallet))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn run_execute(args: ExecuteArgs, store: &mut AllocationStore, cfg: &Config) -> Result<()> {
    if store.is_empty() {
        bail!("Cart is empty, add tokens with `cartswap cart add <mint>` first");
    }

    let wallet = ConnectedWallet::connect(load_wallet(&args, cfg)?).await?;
    let rpc = Arc::new(SolanaRpcClient::new(&cfg.rpc));

    let known_balance = match fetch_input_balance(rpc.as_ref(), wallet.public_key(), args.input).await {
        Ok(balance) => Some(balance),
        Err(e) => {
            logger::warning(
                LogTag::Wallet,
                &format!("Could not read {} balance, skipping balance check: {}", args.input, e),
            );
            None
        }
    };

    let snapshot = store.snapshot();
    let fee = calculate_fee(args.amount);
    println!("{}", display::split_preview_table(&snapshot, args.input, &fee));
    println!(
        "Spending {} {} (fee {:.6}, net {:.6}) from {}",
        args.amount,
        args.input,
        fee.fee_amount,
        fee.net_amount,
        wallet.public_key()
    );

    if !args.yes && !confirm("Proceed with the swaps?")? {
        println!("Cancelled");
        return Ok(());
    }

    let orchestrator = BatchSwapOrchestrator::new(
        Arc::new(JupiterAggregator::new(&cfg.swaps)),
        rpc,
        OrchestratorSettings::from_config(cfg),
    );

    let request = BatchRequest {
        allocation: snapshot,
        input_currency: args.input,
        amount: args.amount,
        known_balance,
    };

    match orchestrator.execute(&wallet, request).await {
        Ok(report) => {
            println!("{}", display::report_table(&report));
            println!("{}", display::report_summary(&report));
            store.clear();
            Ok(())
        }
        Err(CycleError::AllFailed(report)) => {
            println!("{}", display::report_table(&report));
            println!("{}", display::report_summary(&report));
            bail!("No swap completed, the cart was kept");
        }
        Err(e) => Err(e.into()),
    }
}

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use cpamm_exchange_client::{
    client::{HttpRpcClient, ReadProvider, RpcSigner},
    exchange::{plan_add_liquidity, quote_withdrawal, ExchangeClient},
    liquidity::compute_matching_amount,
    types::{PoolSnapshot, SwapDirection, TokenInfo, TransactionReceipt},
    utils::{config::Config, logger::init, units::parse_base_units},
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "cpamm-exchange", version, about = "Liquidity and swaps against a native/ERC-20 exchange contract")]
struct Cli {
    /// Config file (defaults to $DEX_CONFIG or config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Plan and quote only, never submit transactions
    #[arg(long, global = true)]
    dry_run: bool,

    /// Amounts are integers in base units instead of decimal token amounts
    #[arg(long, global = true)]
    raw: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the default configuration as TOML
    InitConfig,
    /// Show reserves, LP supply and spot price
    Pool,
    /// Re-read the pool on every interval until interrupted
    Watch {
        #[arg(long, default_value_t = 5_000)]
        interval_ms: u64,
    },
    /// Native, token and LP balances of an account
    Balances {
        /// Defaults to execution.from
        #[arg(long)]
        address: Option<Address>,
    },
    /// Token amount required alongside a native deposit
    QuoteAdd {
        native: String,
        /// Token amount for the first deposit into an empty pool
        #[arg(long)]
        token: Option<String>,
    },
    /// Estimated payout for redeeming LP tokens
    QuoteRemove { lp: String },
    /// Expected output for a swap
    QuoteSwap {
        amount: String,
        #[arg(long, value_enum, default_value_t = Direction::NativeToToken)]
        direction: Direction,
    },
    AddLiquidity {
        native: String,
        #[arg(long)]
        token: Option<String>,
    },
    RemoveLiquidity { lp: String },
    Swap {
        amount: String,
        #[arg(long, value_enum, default_value_t = Direction::NativeToToken)]
        direction: Direction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    NativeToToken,
    TokenToNative,
}

impl From<Direction> for SwapDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::NativeToToken => SwapDirection::NativeToToken,
            Direction::TokenToNative => SwapDirection::TokenToNative,
        }
    }
}

struct App {
    config: Config,
    raw: bool,
    rpc: Arc<HttpRpcClient>,
    client: ExchangeClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Command::InitConfig = cli.command {
        print!("{}", Config::default().to_toml_string()?);
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if cli.dry_run {
        config.execution.dry_run = true;
    }

    init(&config.logging.level);
    config.validate()?;

    let rpc = Arc::new(HttpRpcClient::new(
        config.network.rpc_url.clone(),
        config.network.request_timeout(),
    )?);
    let provider: Arc<dyn ReadProvider> = rpc.clone();
    let chain_id = provider.chain_id().await.context("reading chain id")?;
    info!(
        "Connected to chain {} via {}; exchange {} pairs {} with {}",
        chain_id,
        rpc.endpoint(),
        config.exchange.address,
        config.exchange.native.symbol,
        config.exchange.token.display_name()
    );

    let client = ExchangeClient::from_config(provider, &config)?;
    let app = App {
        config,
        raw: cli.raw,
        rpc,
        client,
    };

    if let Err(e) = app.run(cli.command).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

impl App {
    fn native(&self) -> &TokenInfo {
        &self.config.exchange.native
    }

    fn token(&self) -> &TokenInfo {
        &self.config.exchange.token
    }

    fn lp(&self) -> &TokenInfo {
        &self.config.exchange.lp_token
    }

    fn input_token(&self, direction: SwapDirection) -> &TokenInfo {
        match direction {
            SwapDirection::NativeToToken => self.native(),
            SwapDirection::TokenToNative => self.token(),
        }
    }

    fn output_token(&self, direction: SwapDirection) -> &TokenInfo {
        match direction {
            SwapDirection::NativeToToken => self.token(),
            SwapDirection::TokenToNative => self.native(),
        }
    }

    fn signer(&self) -> anyhow::Result<RpcSigner> {
        Ok(RpcSigner::from_config(self.rpc.clone(), &self.config.execution)?)
    }

    fn dry_run(&self) -> bool {
        if self.config.execution.dry_run {
            warn!("Dry run: nothing will be submitted");
        }
        self.config.execution.dry_run
    }

    fn amount(&self, token: &TokenInfo, input: &str) -> anyhow::Result<U256> {
        let parsed = if self.raw {
            parse_base_units(input)
        } else {
            token.parse_amount(input)
        };
        parsed.with_context(|| format!("{} amount", token.symbol))
    }

    fn parse_token_amount(&self, input: &Option<String>) -> anyhow::Result<Option<U256>> {
        input
            .as_deref()
            .map(|text| self.amount(self.token(), text))
            .transpose()
    }

    async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::InitConfig => {}
            Command::Pool => {
                let snapshot = self.client.snapshot().await?;
                self.print_snapshot(&snapshot);
            }
            Command::Watch { interval_ms } => self.watch(Duration::from_millis(interval_ms)).await?,
            Command::Balances { address } => {
                let owner = address
                    .or(self.config.execution.from)
                    .context("pass --address or set execution.from")?;
                let balances = self.client.balances(owner).await?;
                println!("Account {}", owner);
                println!("  {} {}", self.native().format_amount(balances.native), self.native());
                println!("  {} {}", self.token().format_amount(balances.token), self.token());
                println!("  {} {}", self.lp().format_amount(balances.lp), self.lp());
            }
            Command::QuoteAdd { native, token } => {
                let native_amount = self.amount(self.native(), &native)?;
                let token_amount = self.parse_token_amount(&token)?;
                self.print_add_plan(native_amount, token_amount).await?;
            }
            Command::QuoteRemove { lp } => {
                let lp_amount = self.amount(self.lp(), &lp)?;
                self.print_withdrawal_quote(lp_amount).await?;
            }
            Command::QuoteSwap { amount, direction } => {
                let direction = SwapDirection::from(direction);
                let amount_in = self.amount(self.input_token(direction), &amount)?;
                self.print_swap_quote(direction, amount_in).await?;
            }
            Command::AddLiquidity { native, token } => {
                let native_amount = self.amount(self.native(), &native)?;
                let token_amount = self.parse_token_amount(&token)?;
                if self.dry_run() {
                    return self.print_add_plan(native_amount, token_amount).await;
                }
                let signer = self.signer()?;
                let outcome = self
                    .client
                    .add_liquidity(&signer, native_amount, token_amount)
                    .await?;
                self.print_receipts(&outcome.receipts);
                self.print_snapshot(&outcome.snapshot);
            }
            Command::RemoveLiquidity { lp } => {
                let lp_amount = self.amount(self.lp(), &lp)?;
                if self.dry_run() {
                    return self.print_withdrawal_quote(lp_amount).await;
                }
                let signer = self.signer()?;
                let outcome = self.client.remove_liquidity(&signer, lp_amount).await?;
                self.print_receipts(&outcome.receipts);
                self.print_snapshot(&outcome.snapshot);
            }
            Command::Swap { amount, direction } => {
                let direction = SwapDirection::from(direction);
                let amount_in = self.amount(self.input_token(direction), &amount)?;
                if self.dry_run() {
                    return self.print_swap_quote(direction, amount_in).await;
                }
                let signer = self.signer()?;
                let outcome = self.client.swap(&signer, direction, amount_in).await?;
                self.print_receipts(&outcome.receipts);
                self.print_snapshot(&outcome.snapshot);
            }
        }
        Ok(())
    }

    async fn print_add_plan(
        &self,
        native_amount: U256,
        token_amount: Option<U256>,
    ) -> anyhow::Result<()> {
        let snapshot = self.client.snapshot().await?;
        let plan = plan_add_liquidity(&snapshot, native_amount, token_amount)?;
        if plan.initial {
            println!("Pool is empty: the first deposit sets the price");
        }
        println!(
            "Deposit {} {} with {} {}",
            self.native().format_amount(plan.native_amount),
            self.native(),
            self.token().format_amount(plan.token_amount),
            self.token()
        );
        Ok(())
    }

    async fn print_withdrawal_quote(&self, lp_amount: U256) -> anyhow::Result<()> {
        let snapshot = self.client.snapshot().await?;
        let quote = quote_withdrawal(&snapshot, lp_amount)?;
        println!(
            "Redeeming {} {} returns about {} {} and {} {}",
            self.lp().format_amount(quote.lp_amount),
            self.lp(),
            self.native().format_amount(quote.native_amount),
            self.native(),
            self.token().format_amount(quote.token_amount),
            self.token()
        );
        Ok(())
    }

    async fn print_swap_quote(&self, direction: SwapDirection, amount_in: U256) -> anyhow::Result<()> {
        let snapshot = self.client.snapshot().await?;
        let quote = self.client.quote_swap(&snapshot, direction, amount_in).await?;
        println!(
            "{} {} buys {} {} (minimum {})",
            self.input_token(direction).format_amount(quote.amount_in),
            self.input_token(direction),
            self.output_token(direction).format_amount(quote.expected_out),
            self.output_token(direction),
            self.output_token(direction).format_amount(quote.min_out)
        );
        Ok(())
    }

    /// Poll the pool until Ctrl-C or SIGTERM
    async fn watch(&self, interval: Duration) -> anyhow::Result<()> {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    error!("Failed to install signal handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let poll = async {
            let mut ticker = tokio::time::interval(interval);
            let mut last_block = None;
            loop {
                ticker.tick().await;
                match self.client.snapshot().await {
                    Ok(snapshot) if last_block != Some(snapshot.block_number) => {
                        last_block = Some(snapshot.block_number);
                        self.print_snapshot(&snapshot);
                    }
                    Ok(_) => {}
                    Err(e) if !self.rpc.is_healthy() => {
                        warn!("Pool read failed, {} unreachable: {}", self.rpc.endpoint(), e)
                    }
                    Err(e) => warn!("Pool read failed: {}", e),
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl-C, stopping watch"),
            _ = terminate => info!("Received SIGTERM, stopping watch"),
            _ = poll => {}
        }
        Ok(())
    }

    fn print_snapshot(&self, snapshot: &PoolSnapshot) {
        println!("Pool {} at block {}", self.config.exchange.address, snapshot.block_number);
        println!(
            "  reserves: {} {} / {} {}",
            self.native().format_amount(snapshot.native_reserve),
            self.native(),
            self.token().format_amount(snapshot.token_reserve),
            self.token()
        );
        println!(
            "  LP supply: {} {}",
            self.lp().format_amount(snapshot.lp_total_supply),
            self.lp()
        );

        if snapshot.is_empty() {
            println!("  price: none (pool is empty)");
            return;
        }
        let one_native = U256::from(10u8).pow(U256::from(self.native().decimals));
        match compute_matching_amount(one_native, snapshot.native_reserve, snapshot.token_reserve) {
            Ok(price) => println!(
                "  price: 1 {} = {} {}",
                self.native(),
                self.token().format_amount(price),
                self.token()
            ),
            Err(e) => println!("  price: unavailable ({})", e),
        }
    }

    fn print_receipts(&self, receipts: &[TransactionReceipt]) {
        for receipt in receipts {
            let block = receipt
                .block_number
                .map(|b| b.to_string())
                .unwrap_or_else(|| "?".into());
            println!("Confirmed {} in block {}", receipt.transaction_hash, block);
        }
    }
}

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storefront_checkout::application::checkout::CheckoutService;
use storefront_checkout::application::orders::OrderService;
use storefront_checkout::config::CheckoutConfig;
use storefront_checkout::domain::order::{OrderId, OrderStatus, UserId};
use storefront_checkout::domain::ports::OrderRepositoryRef;
use storefront_checkout::infrastructure::in_memory::InMemoryOrderRepository;
use storefront_checkout::infrastructure::sandbox::{SandboxGateway, SandboxMode};
use storefront_checkout::interfaces::csv::order_writer::OrderWriter;
use storefront_checkout::interfaces::json::request_reader::read_payment_request;
use storefront_checkout::interfaces::json::response::{PaymentResponse, TokenResponse};
use storefront_checkout::telemetry::{self, LogFormat};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Upper bound on each gateway round-trip, in milliseconds.
    #[arg(long, global = true, env = "CHECKOUT_GATEWAY_TIMEOUT_MS", default_value_t = 10_000)]
    gateway_timeout_ms: u64,

    /// Order insert attempts after a successful charge.
    #[arg(long, global = true, env = "CHECKOUT_PERSIST_ATTEMPTS", default_value_t = 3)]
    persist_attempts: u32,

    /// Pause between order insert attempts, in milliseconds.
    #[arg(long, global = true, env = "CHECKOUT_PERSIST_BACKOFF_MS", default_value_t = 200)]
    persist_backoff_ms: u64,

    /// Behaviour of the sandbox payment gateway.
    #[arg(long, global = true, value_enum, default_value_t = SandboxMode::Online)]
    sandbox_mode: SandboxMode,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request a client token for the payment form
    Token,
    /// Charge a cart and record the order
    Pay {
        /// Checkout request JSON file, or `-` for stdin
        request: PathBuf,

        /// Authenticated user placing the order
        #[arg(long)]
        buyer: String,
    },
    /// List recorded orders as CSV, newest first
    Orders {
        /// Only this buyer's orders
        #[arg(long)]
        buyer: Option<String>,
    },
    /// Move an order to a new status
    SetStatus { order: String, status: String },
}

impl Cli {
    fn config(&self) -> CheckoutConfig {
        CheckoutConfig::default()
            .with_gateway_timeout(Duration::from_millis(self.gateway_timeout_ms))
            .with_persist_attempts(self.persist_attempts)
            .with_persist_backoff(Duration::from_millis(self.persist_backoff_ms))
    }
}

fn open_repository(db_path: Option<PathBuf>) -> Result<OrderRepositoryRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            use storefront_checkout::infrastructure::rocksdb::RocksDBOrderStore;
            let store = RocksDBOrderStore::open(path).into_diagnostic()?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryOrderRepository::new()))
        }
        None => Ok(Arc::new(InMemoryOrderRepository::new())),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, value).into_diagnostic()?;
    writeln!(out).into_diagnostic()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_format);

    let config = cli.config();
    let orders = open_repository(cli.db_path.clone())?;
    let gateway = Arc::new(SandboxGateway::with_mode(cli.sandbox_mode));

    match cli.command {
        Command::Token => {
            let checkout = CheckoutService::new(gateway, orders, config);
            let result = checkout.client_token().await;
            print_json(&TokenResponse::from_result(&result))?;
            result.map(|_| ()).map_err(|e| miette!("{e}"))
        }
        Command::Pay { request, buyer } => {
            let parsed = if request.as_os_str() == "-" {
                read_payment_request(io::stdin().lock())
            } else {
                let file = File::open(&request).into_diagnostic()?;
                read_payment_request(file)
            };
            let request = parsed.map_err(|e| {
                tracing::error!(error = %e, "Error reading payment request");
                miette!("{e}")
            })?;

            let checkout = CheckoutService::new(gateway, orders, config);
            let result = checkout.pay(request, UserId::new(buyer)).await;
            print_json(&PaymentResponse::from_result(&result))?;
            result.map(|_| ()).map_err(|e| miette!("{e}"))
        }
        Command::Orders { buyer } => {
            let buyer = buyer.map(UserId::new);
            let listed = OrderService::new(orders)
                .list(buyer.as_ref())
                .await
                .into_diagnostic()?;

            let stdout = io::stdout();
            let mut writer = OrderWriter::new(stdout.lock());
            writer.write_orders(&listed).into_diagnostic()?;
            Ok(())
        }
        Command::SetStatus { order, status } => {
            let id: OrderId = order.parse().into_diagnostic()?;
            let status: OrderStatus = status.parse().into_diagnostic()?;
            let updated = OrderService::new(orders)
                .update_status(id, status)
                .await
                .into_diagnostic()?;
            print_json(&updated)
        }
    }
}

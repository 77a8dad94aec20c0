//! ABC Retail CLI - Storage provisioning and store management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create every table, container, queue and share
//! abc-cli provision
//!
//! # Manage the catalogue
//! abc-cli product add --name Mug --description "Ceramic mug" --price 7.50 --stock 12
//! abc-cli product list
//!
//! # Place an order
//! abc-cli order place --customer <id> --product <id> --quantity 2
//!
//! # Upload a proof of payment
//! abc-cli proof upload ./receipt.pdf
//! ```
//!
//! # Commands
//!
//! - `provision` - Create storage resources
//! - `customer` - Add, update, list and remove customers
//! - `product` - Add, update, list and remove products
//! - `order` - Place, list, show, update and remove orders
//! - `proof` - Upload and download proofs of payment
//! - `queue receive` - Take one message off a queue
//! - `stats` - Store counts and featured products
//!
//! # Environment Variables
//!
//! - `AZURE_STORAGE_CONNECTION_STRING` - Storage account connection string
//! - `STORAGE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `RUST_LOG` - Log filter (default: `abc_retail_cli=info,abc_retail_storage=info`)
//! - `LOG_FORMAT` - Set to `json` for structured log output

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use abc_retail_core::{OrderStatus, Price, TableDateTime};
use abc_retail_storage::resources::ORDERS_QUEUE;
use abc_retail_storage::{StorageConfig, StorageService};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandResult;
use commands::customers::{CustomerChanges, NewCustomer};
use commands::orders::{OrderChanges, OrderRequest};
use commands::products::{NewProduct, ProductChanges};

#[derive(Parser)]
#[command(name = "abc-cli")]
#[command(author, version, about = "ABC Retail storage and store management tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every table, container, queue and file share
    Provision,
    /// Manage customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Manage proofs of payment
    Proof {
        #[command(subcommand)]
        action: ProofAction,
    },
    /// Inspect queues
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Show store counts and featured products
    Stats,
}

#[derive(Subcommand)]
enum CustomerAction {
    /// Register a new customer
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        /// Shipping address
        #[arg(short, long)]
        address: String,
    },
    /// Change a customer's details
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        /// Shipping address
        #[arg(short, long)]
        address: Option<String>,
    },
    /// List customers
    List,
    /// Remove a customer
    Remove { id: String },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Add a product
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Unit price (non-negative decimal)
        #[arg(short, long)]
        price: Price,
        /// Units in stock
        #[arg(short, long)]
        stock: u32,
        /// Image file to upload
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Change a product's details, price, stock or image
    Update {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        price: Option<Price>,
        #[arg(short, long)]
        stock: Option<u32>,
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// List products
    List,
    /// Remove a product
    Remove { id: String },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Place an order, reducing stock and notifying the orders queue
    Place {
        #[arg(short, long)]
        customer: String,
        #[arg(short, long)]
        product: String,
        #[arg(short, long)]
        quantity: u32,
        /// Order time (RFC 3339, or local wall-clock time stored as UTC)
        #[arg(short, long)]
        date: Option<TableDateTime>,
        /// Initial status
        #[arg(long, default_value = "Pending")]
        status: OrderStatus,
    },
    /// List orders
    List,
    /// Show one order
    Show { id: String },
    /// Change an order's quantity, date or status
    Update {
        id: String,
        /// New quantity; the total is recomputed
        #[arg(short, long)]
        quantity: Option<u32>,
        /// Order time (RFC 3339, or local wall-clock time stored as UTC)
        #[arg(short, long)]
        date: Option<TableDateTime>,
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Remove an order
    Remove { id: String },
}

#[derive(Subcommand)]
enum ProofAction {
    /// Upload a proof of payment (PDF, JPG, JPEG or PNG)
    Upload { path: PathBuf },
    /// Download a proof of payment from the contracts share
    Download {
        name: String,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// Take one message off a queue
    Receive {
        #[arg(short, long, default_value = ORDERS_QUEUE)]
        queue: String,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Text logs by default, JSON when `LOG_FORMAT=json`.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "abc_retail_cli=info,abc_retail_storage=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> CommandResult<()> {
    let config = StorageConfig::from_env()?;
    let storage = StorageService::from_config(&config)?;

    match cli.command {
        Commands::Provision => {
            commands::provision::run(&storage).await?;
        }
        Commands::Customer { action } => match action {
            CustomerAction::Add {
                name,
                surname,
                username,
                email,
                address,
            } => {
                let details = NewCustomer {
                    name,
                    surname,
                    username,
                    email,
                    shipping_address: address,
                };
                commands::customers::add(&storage, details).await?;
            }
            CustomerAction::Update {
                id,
                name,
                surname,
                username,
                email,
                address,
            } => {
                let changes = CustomerChanges {
                    name,
                    surname,
                    username,
                    email,
                    shipping_address: address,
                };
                commands::customers::update(&storage, &id, changes).await?;
            }
            CustomerAction::List => {
                commands::customers::list(&storage).await?;
            }
            CustomerAction::Remove { id } => commands::customers::remove(&storage, &id).await?,
        },
        Commands::Product { action } => match action {
            ProductAction::Add {
                name,
                description,
                price,
                stock,
                image,
            } => {
                let details = NewProduct {
                    name,
                    description,
                    price,
                    stock,
                };
                commands::products::add(&storage, details, image.as_deref()).await?;
            }
            ProductAction::Update {
                id,
                name,
                description,
                price,
                stock,
                image,
            } => {
                let changes = ProductChanges {
                    name,
                    description,
                    price,
                    stock,
                };
                commands::products::update(&storage, &id, changes, image.as_deref()).await?;
            }
            ProductAction::List => {
                commands::products::list(&storage).await?;
            }
            ProductAction::Remove { id } => commands::products::remove(&storage, &id).await?,
        },
        Commands::Order { action } => match action {
            OrderAction::Place {
                customer,
                product,
                quantity,
                date,
                status,
            } => {
                let request = OrderRequest {
                    customer_id: customer,
                    product_id: product,
                    quantity,
                    order_date: date.unwrap_or_else(TableDateTime::now),
                    status,
                };
                commands::orders::place(&storage, request).await?;
            }
            OrderAction::List => {
                commands::orders::list(&storage).await?;
            }
            OrderAction::Show { id } => {
                commands::orders::show(&storage, &id).await?;
            }
            OrderAction::Update {
                id,
                quantity,
                date,
                status,
            } => {
                let changes = OrderChanges {
                    quantity,
                    order_date: date,
                    status,
                };
                commands::orders::update(&storage, &id, changes).await?;
            }
            OrderAction::Remove { id } => commands::orders::remove(&storage, &id).await?,
        },
        Commands::Proof { action } => match action {
            ProofAction::Upload { path } => {
                commands::proofs::upload(&storage, &path).await?;
            }
            ProofAction::Download { name, output } => {
                commands::proofs::download(&storage, &name, &output).await?;
            }
        },
        Commands::Queue { action } => match action {
            QueueAction::Receive { queue } => {
                commands::queue::receive(&storage, &queue).await?;
            }
        },
        Commands::Stats => {
            commands::stats::run(&storage).await?;
        }
    }
    Ok(())
}

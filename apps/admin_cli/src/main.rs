mod output;
mod settings;

use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ClientError, HttpBackend, TableQuery, ViewController, ViewMode};
use shared::{
    domain::{CustomerId, OrderId, StockId},
    draft::{DraftLine, OrderDraft, DEFAULT_TAX_RATE_PERCENT},
};
use storage::SessionStore;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::settings::{Settings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "orders-admin", about = "Sales order admin panel")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    session_db_url: Option<String>,
    /// Fail on unrecognized `isActive` values instead of treating them as active.
    #[arg(long)]
    strict_flags: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// Active orders, or deleted ones with `--inactive`.
    List {
        #[arg(long)]
        inactive: bool,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    Show {
        order_id: i64,
    },
    Create {
        #[arg(long)]
        customer: i64,
        #[arg(long)]
        order_no: String,
        #[arg(long, default_value_t = DEFAULT_TAX_RATE_PERCENT)]
        tax_rate: f64,
        /// Line item as STOCK_ID:QUANTITY; repeatable.
        #[arg(long = "item", value_parser = parse_item)]
        items: Vec<DraftLine>,
    },
    Delete {
        order_id: i64,
    },
    Restore {
        order_id: i64,
    },
    Customers,
    Stocks,
    Addresses {
        customer_id: i64,
    },
}

fn parse_item(raw: &str) -> Result<DraftLine, String> {
    let (stock, quantity) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected STOCK_ID:QUANTITY, got '{raw}'"))?;
    let stock_id = stock
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("invalid stock id '{stock}': {err}"))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid quantity '{quantity}': {err}"))?;
    Ok(DraftLine {
        stock_id: StockId(stock_id),
        quantity,
    })
}

impl Cli {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(url) = &self.api_base_url {
            settings.api_base_url = url.clone();
        }
        if let Some(url) = &self.session_db_url {
            settings.session_db_url = url.clone();
        }
        if self.strict_flags {
            settings.strict_activity_flags = true;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ClientError>() {
                Some(client_err) => eprintln!("{}", client_err.user_message()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = settings::load_settings(&cli.config)?;
    cli.apply_overrides(&mut settings);
    let settings = settings.validated()?;
    debug!(?settings, "settings resolved");

    let store = Arc::new(
        SessionStore::new(&settings.session_db_url)
            .await
            .with_context(|| format!("failed to open session store '{}'", settings.session_db_url))?,
    );

    match &cli.command {
        Command::Login { username, password } => {
            if !store.login(username, password).await? {
                bail!("username and password are required");
            }
            println!("signed in as {}", store.username().await?);
            return Ok(());
        }
        Command::Logout => {
            store.logout().await?;
            println!("signed out");
            return Ok(());
        }
        Command::Whoami => {
            match store.current().await? {
                Some(session) => println!("{}", session.username),
                None => println!("{} (not signed in)", storage::DEFAULT_USERNAME),
            }
            return Ok(());
        }
        _ => {}
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .danger_accept_invalid_certs(settings.accept_invalid_certs)
        .build()
        .context("failed to build HTTP client")?;
    let backend = Arc::new(
        HttpBackend::with_client(http, settings.api_base_url.clone())
            .strict_activity_flags(settings.strict_activity_flags),
    );
    let controller = ViewController::new(backend.clone(), backend, store);
    let mut events = controller.subscribe();
    controller.open().await?;

    match cli.command {
        Command::List {
            inactive,
            search,
            page,
        } => {
            if inactive {
                controller.toggle().await?;
            }
            let table = controller
                .table(&TableQuery {
                    search,
                    page,
                    page_size: settings.page_size,
                })
                .await;
            output::print_table(&table);
        }
        Command::Show { order_id } => {
            let details = controller.details(OrderId(order_id)).await?;
            output::print_details(&details);
        }
        Command::Create {
            customer,
            order_no,
            tax_rate,
            items,
        } => {
            let draft = OrderDraft {
                lines: items,
                ..OrderDraft::new(CustomerId(customer), order_no).with_tax_rate(tax_rate)
            };
            let created = controller.create(&draft).await?;
            output::print_created(created.as_ref());
        }
        Command::Delete { order_id } => {
            controller.delete(OrderId(order_id)).await?;
        }
        Command::Restore { order_id } => {
            if controller.mode().await != ViewMode::ShowingInactive {
                controller.toggle().await?;
            }
            controller.restore(OrderId(order_id)).await?;
        }
        Command::Customers => output::print_customers(&controller.customers().await),
        Command::Stocks => output::print_stocks(&controller.stocks().await),
        Command::Addresses { customer_id } => {
            let addresses = controller
                .customer_addresses(CustomerId(customer_id))
                .await?;
            output::print_addresses(&addresses);
        }
        Command::Login { .. } | Command::Logout | Command::Whoami => {}
    }

    output::print_notices(&mut events);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_line_items() {
        assert_eq!(
            parse_item("3:2").expect("item"),
            DraftLine {
                stock_id: StockId(3),
                quantity: 2
            }
        );
        assert!(parse_item("3").is_err());
        assert!(parse_item("x:2").is_err());
        assert!(parse_item("3:-1").is_err());
    }

    #[test]
    fn cli_flags_override_settings() {
        let cli = Cli::parse_from([
            "orders-admin",
            "--api-base-url",
            "http://127.0.0.1:5000/api",
            "--strict-flags",
            "list",
            "--inactive",
        ]);
        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);

        assert_eq!(settings.api_base_url, "http://127.0.0.1:5000/api");
        assert!(settings.strict_activity_flags);
        assert_eq!(settings.session_db_url, Settings::default().session_db_url);
        assert!(matches!(cli.command, Command::List { inactive: true, .. }));
    }

    #[test]
    fn create_collects_repeated_items() {
        let cli = Cli::parse_from([
            "orders-admin",
            "create",
            "--customer",
            "1",
            "--order-no",
            "A-300",
            "--item",
            "3:2",
            "--item",
            "4:1",
        ]);
        match cli.command {
            Command::Create {
                tax_rate, items, ..
            } => {
                assert_eq!(tax_rate, DEFAULT_TAX_RATE_PERCENT);
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

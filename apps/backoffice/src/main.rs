//! # Dukan CLI
//!
//! Thin command-line front end over the back-office commands. Prints
//! JSON so the output can be piped into other tools.
//!
//! ## Usage
//! ```text
//! dukan [--account <id>] dashboard
//! dukan [--account <id>] report <daily|weekly|monthly>
//! dukan [--account <id>] status
//! dukan quote <free|standard|premium> [coupon]
//! ```
//!
//! The account may also come from `DUKAN_ACCOUNT_ID`. Everything else is
//! read from the `DUKAN_*` variables described on [`ConfigState`].

use std::env;
use std::error::Error;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use dukan_backoffice::commands::{analytics, subscription};
use dukan_backoffice::{init_tracing, open_database, ConfigState, DbState, PricingState, SessionContext};
use dukan_core::analytics::ReportWindow;
use dukan_core::SubscriptionTier;

const USAGE: &str = "\
Usage: dukan [--account <id>] <command>

Commands:
  dashboard                              Dashboard metrics for the account
  report <daily|weekly|monthly>          Windowed sales report
  status                                 Current plan and entitlement
  quote <free|standard|premium> [coupon] Subscription price, with optional coupon

Environment:
  DUKAN_ACCOUNT_ID, DUKAN_DB_PATH, DUKAN_UTC_OFFSET_MINUTES,
  DUKAN_CURRENCY_SYMBOL, DUKAN_SUBSCRIPTION_MONTHS, RUST_LOG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let mut account_id = env::var("DUKAN_ACCOUNT_ID").ok();
    let mut positional = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--account" | "-a" => {
                account_id = Some(args.next().ok_or("--account requires a value")?);
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ => positional.push(arg),
        }
    }

    let Some(command) = positional.first().map(String::as_str) else {
        eprintln!("{USAGE}");
        return Err("no command given".into());
    };

    let config = ConfigState::from_env();
    let db = open_database(&config).await?;
    let now = Utc::now();

    match command {
        "dashboard" => {
            let session = load_session(&db, &config, account_id.as_deref()).await?;
            print_json(&analytics::get_dashboard(&db, &session, now).await?)?;
        }
        "report" => {
            let window: ReportWindow = positional
                .get(1)
                .ok_or("report requires a window (daily, weekly, monthly)")?
                .parse()?;
            let session = load_session(&db, &config, account_id.as_deref()).await?;
            print_json(&analytics::get_report(&db, &session, window, now).await?)?;
        }
        "status" => {
            let session = load_session(&db, &config, account_id.as_deref()).await?;
            print_json(&subscription::subscription_status(&db, &session, now).await?)?;
        }
        "quote" => {
            let tier: SubscriptionTier = positional
                .get(1)
                .ok_or("quote requires a tier (free, standard, premium)")?
                .parse()?;
            let pricing = PricingState::new(tier);

            if let Some(code) = positional.get(2) {
                // A rejected coupon still leaves a base-price quote to show
                if let Err(err) = subscription::apply_coupon(&db, &pricing, code, now).await {
                    warn!(code = %code, error = %err, "Coupon not applied");
                    eprintln!("{err}");
                }
            }

            let quote = subscription::get_quote(&pricing);
            info!(
                tier = %quote.tier,
                total = %config.format_currency(quote.final_price()),
                "Quote"
            );
            print_json(&quote)?;
        }
        other => {
            eprintln!("{USAGE}");
            return Err(format!("unknown command: {other}").into());
        }
    }

    db.inner().close().await;
    Ok(())
}

async fn load_session(
    db: &DbState,
    config: &ConfigState,
    account_id: Option<&str>,
) -> Result<SessionContext, Box<dyn Error>> {
    let account_id = account_id.ok_or("an account is required (--account or DUKAN_ACCOUNT_ID)")?;
    let account = db.inner().accounts().require(account_id).await?;
    Ok(SessionContext::for_account(&account, config))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

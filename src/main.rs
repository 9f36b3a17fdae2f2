//! Entry point. Wires prompt -> Parser -> Session -> Reconcile -> Store.

use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use price_ledger::config::AppConfig;
use price_ledger::parser::{parse_command, Command, HELP};
use price_ledger::quotes::{lookup_high, CachedQuotes, FileQuotes};
use price_ledger::session::Session;
use price_ledger::store;
use price_ledger::utils::{fmt_high, fmt_listing, fmt_profit, render_table};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cfg_path = AppConfig::path_from_env();
    let cfg = AppConfig::load(&cfg_path)?;

    let db = store::open(&cfg.store).context("open record store")?;
    let quotes = CachedQuotes::new(
        FileQuotes::new(&cfg.market.quotes_path),
        Duration::from_secs(cfg.market.cache_ttl_sec),
    );
    let mut session =
        Session::with_listings(cfg.session.default_exchange, cfg.session.listings.clone());
    info!(
        "price-ledger ready. config={}, store={:?}, quotes={}",
        cfg_path.display(),
        cfg.store.backend,
        cfg.market.quotes_path.display()
    );

    let mut out = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    out.write_all(format!("{HELP}\n").as_bytes()).await?;

    loop {
        out.write_all(format!("[{}]> ", session.exchange()).as_bytes()).await?;
        out.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let Some(cmd) = parse_command(&line) else {
            warn!("Unrecognized command: {}", line.trim());
            continue;
        };

        let reply = match cmd {
            Command::Exchange(ex) => {
                let status = if session.select_exchange(ex) {
                    format!("exchange set to {ex}; working rows cleared")
                } else {
                    format!("already on {ex}")
                };
                format!("{status}\n{}", fmt_listing(ex, session.listing()))
            }
            Command::Tickers => fmt_listing(session.exchange(), session.listing()),
            Command::Add { ticker, cost_price } => {
                let today = Local::now().date_naive();
                let high = lookup_high(&quotes, &ticker, today).await;
                match session.add(&ticker, cost_price, high, today) {
                    Ok(r) => format!(
                        "added {} cost={} high={} profit={}",
                        r.ticker,
                        r.cost_price,
                        fmt_high(&r.high_price),
                        fmt_profit(&r.profit())
                    ),
                    Err(e) => format!("rejected: {e}"),
                }
            }
            Command::Remove(n) => match session.remove(n) {
                Some(r) => format!("removed row {n} ({})", r.ticker),
                None => format!("no row {n}"),
            },
            Command::Show => render_table(session.ledger().all()),
            Command::Save(name) => match session.save(&*db, &name) {
                Ok(rep) if rep.nothing_new() => format!(
                    "nothing new for '{name}' ({} duplicate, {} rejected)",
                    rep.duplicates, rep.rejected
                ),
                Ok(rep) => format!(
                    "saved {} new row(s) to '{name}' ({} duplicate, {} rejected)",
                    rep.written, rep.duplicates, rep.rejected
                ),
                Err(e) => {
                    error!("save to '{}' failed: {:#}", name, e);
                    format!("save FAILED, working rows kept: {e}")
                }
            },
            Command::Load(name) => match session.load_for_edit(&*db, &name) {
                Ok(n) => format!("loaded {n} row(s) from '{name}'"),
                Err(e) => {
                    error!("load of '{}' failed: {:#}", name, e);
                    format!("load FAILED: {e}")
                }
            },
            Command::List => match store::list_collection_names(&*db) {
                Ok(names) if names.is_empty() => "no collections yet".to_string(),
                Ok(names) => names.into_iter().collect::<Vec<_>>().join("\n"),
                Err(e) => {
                    error!("listing collections failed: {:#}", e);
                    format!("list FAILED: {e}")
                }
            },
            Command::Help => HELP.to_string(),
            Command::Quit => break,
        };
        out.write_all(format!("{}\n", reply.trim_end()).as_bytes()).await?;
    }

    session.end();
    Ok(())
}

//! Message rendering.

use chrono::{DateTime, Utc};
use crate::spread::CexQuote;
use dump_detector::DumpSignal;
use rust_decimal::prelude::RoundingStrategy;
use rust_decimal::Decimal;

const DIVIDER: &str = "---------------------\n";
/// Shown as the market when the token has no known liquidity pool.
const DEFAULT_MARKET: &str = "1inch";

/// Compact USD amount: `765.0`, `1.3k`, `4.4M`, `4.4B`. `-` when unknown.
pub fn format_money(amount: Option<Decimal>) -> String {
    let Some(amount) = amount else {
        return "-".to_string();
    };
    let thousand = Decimal::from(1_000);
    let million = Decimal::from(1_000_000);
    let billion = Decimal::from(1_000_000_000);

    let abs = amount.abs();
    let (scaled, suffix) = if abs >= billion {
        (amount / billion, "B")
    } else if abs >= million {
        (amount / million, "M")
    } else if abs >= thousand {
        (amount / thousand, "k")
    } else {
        (amount, "")
    };
    let rounded = scaled.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.1}{suffix}")
}

fn dexscreener_url(signal: &DumpSignal) -> String {
    format!(
        "https://dexscreener.com/{}/{}",
        signal.contract.network(),
        signal.contract.address()
    )
}

/// Render a signal as a Telegram Markdown message.
///
/// `quotes` adds a CEX spread section when non-empty.
pub fn render_signal(signal: &DumpSignal, quotes: &[CexQuote], now: DateTime<Utc>) -> String {
    let token = &signal.token;
    let age = token
        .age_days(now)
        .map(|days| format!("{days} days"))
        .unwrap_or_else(|| "--".to_string());
    let (market, pool, liquidity) = match &token.liquidity {
        Some(pool) => (pool.dex.clone(), pool.pair.clone(), format_money(Some(pool.usd))),
        None => (DEFAULT_MARKET.to_string(), "--".to_string(), "-".to_string()),
    };

    let mut text = String::from(DIVIDER);
    text.push_str(&format!(
        "*{symbol}/{change:.2}%*\n\
         \n\
         Address: [{address}]({url})\n\
         Network: `{network}`\n\
         Name: *{name}*\n\
         TimeWindow: {window} sec\n\
         MarketCap: {market_cap}$\n\
         Volume24H: {volume}$\n\
         Age: {age}\n\
         Dex:\n  \
           Market: {market}\n  \
           Pool: {pool}\n  \
           Liquidity: {liquidity}$\n  \
           Price: {price}$\n",
        symbol = token.symbol.to_uppercase(),
        change = signal.change_percent,
        address = signal.contract.address(),
        url = dexscreener_url(signal),
        network = signal.contract.network(),
        name = token.name,
        window = signal.window.as_secs(),
        market_cap = format_money(token.market_cap_usd),
        volume = format_money(token.volume_24h_usd),
        price = signal.current_price,
    ));
    if !quotes.is_empty() {
        text.push_str("__Spread on CEX__:\n");
        for quote in quotes {
            text.push_str(&spread_line(quote));
        }
    }
    text.push_str(DIVIDER);
    text
}

fn spread_line(quote: &CexQuote) -> String {
    let spread = quote
        .spread_pct
        .map(|pct| format!("{pct:.2}"))
        .unwrap_or_else(|| "-".to_string());
    format!("  {}: `{}, {spread}%`\n", quote.exchange, quote.price)
}

/// One-line summary for logs.
pub fn summary_line(signal: &DumpSignal) -> String {
    format!(
        "{} {:.2}% in {}s ({} -> {}, rule #{})",
        signal.token.symbol.to_uppercase(),
        signal.change_percent,
        signal.window.as_secs(),
        signal.baseline_price,
        signal.current_price,
        signal.rule_index
    )
}

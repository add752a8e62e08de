//! One-shot smoke test against the intent engine.
//!
//! Replays the recorded zap-in invocation and reports the outcome on
//! stdout: the status code on the first line, the decoded JSON body on the
//! second. Any transport or decode fault terminates the run with a non-zero
//! exit instead.

pub mod tracing;

use anyhow::{Context, Result};
use clap::Parser;
use intent_api::{DefaultIntentApi, IntentApi, IntentQuery, IntentTxns};
use reqwest::Client;
use std::io::Write;
use url::Url;

#[derive(Debug, Parser)]
pub struct Arguments {
    /// Base URL of the intent engine under test.
    #[arg(long, env, default_value = DefaultIntentApi::DEFAULT_URL)]
    pub intent_engine_url: Url,

    /// The log filter.
    #[arg(long, env, default_value = "info,smoke=debug,intent_api=debug")]
    pub log_filter: String,
}

/// The zap-in invocation the smoke test replays.
///
/// All values are the exact literals of the recorded request, including the
/// Python bool rendering of `onlyThisChain`.
pub fn zap_in_query() -> IntentQuery {
    IntentQuery {
        action_name: "zapIn".to_string(),
        chain_metadata: "arbitrum".to_string(),
        portfolio_name: "All Weather Vault".to_string(),
        account_address: "0xc774806f9fF5f3d8aaBb6b70d0Ed509e42aFE6F0".to_string(),
        token_symbol: "usdc".to_string(),
        token_address: "0xaf88d065e77c8cc2239327c5edb3a432268e5831".to_string(),
        investment_amount: "10000000".to_string(),
        token_decimals: "6".to_string(),
        zap_out_percentage: "0".to_string(),
        slippage: "1".to_string(),
        recipient: "0xc774806f9fF5f3d8aaBb6b70d0Ed509e42aFE6F0".to_string(),
        only_this_chain: "True".to_string(),
        usd_balance: "100".to_string(),
    }
}

pub async fn run(args: Arguments) -> Result<()> {
    // No timeout on purpose: the engine may spend a while routing a zap and
    // the test blocks until it answers or the transport gives up.
    let api = DefaultIntentApi::new(args.intent_engine_url, Client::new())?;
    invoke(&api, &mut std::io::stdout()).await
}

async fn invoke(api: &dyn IntentApi, out: &mut (dyn Write + Send)) -> Result<()> {
    let response = api
        .generate_intent_txns(&zap_in_query())
        .await
        .context("generate-intent-txns request")?;
    report(out, response)
}

/// Writes the outcome of the call: the status code on one line, the decoded
/// body on the next. The status line goes out before the body is decoded so
/// a non-JSON body still reports how the engine answered.
fn report(out: &mut (dyn Write + Send), response: IntentTxns) -> Result<()> {
    writeln!(out, "{}", response.status.as_u16())?;
    let body = response.into_json().context("decode response body")?;
    writeln!(out, "{}", body)?;
    Ok(())
}

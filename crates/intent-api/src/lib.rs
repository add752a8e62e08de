//! Intent engine HTTP API client implementation.
//!
//! The engine turns a described portfolio action (a zap-in deposit, a
//! zap-out withdrawal) into the list of transactions required to execute it
//! on chain. It exposes that as a single `generate-intent-txns` GET
//! endpoint.

use anyhow::{Context, Result};
use reqwest::{Client, IntoUrl, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// A `generate-intent-txns` query.
///
/// Every value is passed through to the engine verbatim. The engine owns the
/// semantics of each parameter, so addresses, amounts and flags stay plain
/// strings on this side and are neither parsed nor validated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntentQuery {
    /// The portfolio action to generate transactions for, e.g. `zapIn`.
    pub action_name: String,
    /// Name of the chain the action executes on, e.g. `arbitrum`.
    pub chain_metadata: String,
    /// Name of the portfolio the action targets.
    pub portfolio_name: String,
    /// Address of the account performing the action.
    pub account_address: String,
    /// Symbol of the token being deposited or withdrawn.
    pub token_symbol: String,
    /// Contract address of that token.
    pub token_address: String,
    /// Amount to invest, set in atoms of the token.
    pub investment_amount: String,
    /// Number of decimals of the token.
    pub token_decimals: String,
    /// Percentage of the position to zap out, `0` for pure deposits.
    pub zap_out_percentage: String,
    /// Limit of price slippage the caller is willing to accept.
    pub slippage: String,
    /// Address receiving the outcome of the action.
    pub recipient: String,
    /// Whether the engine must keep the whole action on the given chain.
    /// The engine parses Python bool rendering, i.e. `True`/`False`.
    pub only_this_chain: String,
    /// The account's USD balance as reported by the caller.
    pub usd_balance: String,
}

impl IntentQuery {
    /// Encodes the query as a url with get parameters.
    pub fn format_url(&self, base_url: &Url) -> Url {
        let mut url = base_url
            .join("generate-intent-txns")
            .expect("unexpectedly invalid URL segment");
        url.query_pairs_mut()
            .append_pair("actionName", &self.action_name)
            .append_pair("chainMetadata", &self.chain_metadata)
            .append_pair("portfolioName", &self.portfolio_name)
            .append_pair("accountAddress", &self.account_address)
            .append_pair("tokenSymbol", &self.token_symbol)
            .append_pair("tokenAddress", &self.token_address)
            .append_pair("investmentAmount", &self.investment_amount)
            .append_pair("tokenDecimals", &self.token_decimals)
            .append_pair("zapOutPercentage", &self.zap_out_percentage)
            .append_pair("slippage", &self.slippage)
            .append_pair("recipient", &self.recipient)
            .append_pair("onlyThisChain", &self.only_this_chain)
            .append_pair("usdBalance", &self.usd_balance);
        url
    }
}

/// The raw outcome of a `generate-intent-txns` call.
///
/// The engine owns the transaction schema and changes it without versioning,
/// so the body is kept as unparsed text until the caller asks for JSON.
#[derive(Clone, Debug)]
pub struct IntentTxns {
    /// Status code the engine answered with.
    pub status: StatusCode,
    /// The response body, exactly as received.
    pub text: String,
}

impl IntentTxns {
    /// Decodes the response body as a JSON value.
    pub fn into_json(self) -> Result<Value, IntentApiError> {
        serde_json::from_str(&self.text)
            .map_err(|err| IntentApiError::DeserializeError(err, self.text))
    }
}

#[derive(Error, Debug)]
pub enum IntentApiError {
    #[error("Error({0}) for response {1}")]
    DeserializeError(serde_json::Error, String),

    // Recovered a response but failed on the async call of response.text()
    #[error(transparent)]
    TextFetch(reqwest::Error),

    // Connectivity or non-response error
    #[error("Failed on send")]
    Send(reqwest::Error),
}

/// Abstract intent engine API. Provides a mockable implementation.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait IntentApi: Send + Sync {
    /// Requests the transactions implementing the queried action.
    ///
    /// Succeeds for any HTTP status the engine answers with; only transport
    /// and body-fetch failures are errors.
    async fn generate_intent_txns(
        &self,
        query: &IntentQuery,
    ) -> Result<IntentTxns, IntentApiError>;
}

/// Intent engine API client implementation.
#[derive(Debug)]
pub struct DefaultIntentApi {
    client: Client,
    base_url: Url,
}

impl DefaultIntentApi {
    /// Default intent engine URL.
    pub const DEFAULT_URL: &'static str = "http://localhost:3002/";

    /// Create a new intent engine client with the specified base URL.
    pub fn new(base_url: impl IntoUrl, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            base_url: base_url.into_url().context("intent engine url")?,
        })
    }

    /// Create a new intent engine client using the default URL.
    pub fn with_default_url(client: Client) -> Self {
        Self::new(Self::DEFAULT_URL, client).unwrap()
    }
}

#[async_trait::async_trait]
impl IntentApi for DefaultIntentApi {
    async fn generate_intent_txns(
        &self,
        query: &IntentQuery,
    ) -> Result<IntentTxns, IntentApiError> {
        let url = query.format_url(&self.base_url);
        tracing::debug!("Querying intent engine: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(IntentApiError::Send)?;
        let status = response.status();
        let text = response.text().await.map_err(IntentApiError::TextFetch)?;
        tracing::debug!("Response from intent engine: {}", text);

        Ok(IntentTxns { status, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> IntentQuery {
        IntentQuery {
            action_name: "zapOut".to_string(),
            chain_metadata: "base".to_string(),
            portfolio_name: "Stable Vault".to_string(),
            account_address: "0x2eF94D4F8ce045BF2D39b9EaA02Ed87B461E4Ccf".to_string(),
            token_symbol: "weth".to_string(),
            token_address: "0x4200000000000000000000000000000000000006".to_string(),
            investment_amount: "0".to_string(),
            token_decimals: "18".to_string(),
            zap_out_percentage: "50".to_string(),
            slippage: "0.5".to_string(),
            recipient: "0x2eF94D4F8ce045BF2D39b9EaA02Ed87B461E4Ccf".to_string(),
            only_this_chain: "False".to_string(),
            usd_balance: "250".to_string(),
        }
    }

    #[test]
    fn encodes_query_as_url_parameters() {
        let base = Url::parse("http://localhost:3002/").unwrap();
        let url = query().format_url(&base);

        assert_eq!(url.path(), "/generate-intent-txns");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("actionName".to_string(), "zapOut".to_string()),
                ("chainMetadata".to_string(), "base".to_string()),
                ("portfolioName".to_string(), "Stable Vault".to_string()),
                (
                    "accountAddress".to_string(),
                    "0x2eF94D4F8ce045BF2D39b9EaA02Ed87B461E4Ccf".to_string()
                ),
                ("tokenSymbol".to_string(), "weth".to_string()),
                (
                    "tokenAddress".to_string(),
                    "0x4200000000000000000000000000000000000006".to_string()
                ),
                ("investmentAmount".to_string(), "0".to_string()),
                ("tokenDecimals".to_string(), "18".to_string()),
                ("zapOutPercentage".to_string(), "50".to_string()),
                ("slippage".to_string(), "0.5".to_string()),
                (
                    "recipient".to_string(),
                    "0x2eF94D4F8ce045BF2D39b9EaA02Ed87B461E4Ccf".to_string()
                ),
                ("onlyThisChain".to_string(), "False".to_string()),
                ("usdBalance".to_string(), "250".to_string()),
            ]
        );
    }

    #[test]
    fn percent_encodes_parameter_values() {
        let base = Url::parse("http://localhost:3002/").unwrap();
        let url = query().format_url(&base);
        // The portfolio name carries a space, which must not survive raw.
        assert!(url.query().unwrap().contains("portfolioName=Stable+Vault"));
    }

    #[test]
    fn base_url_may_carry_a_path_prefix() {
        let base = Url::parse("http://localhost:3002/staging/").unwrap();
        let url = IntentQuery::default().format_url(&base);
        assert_eq!(url.path(), "/staging/generate-intent-txns");
    }

    #[test]
    fn decodes_json_bodies() {
        let response = IntentTxns {
            status: StatusCode::OK,
            text: r#"{"txns": []}"#.to_string(),
        };
        let body = response.into_json().unwrap();
        assert_eq!(body, serde_json::json!({ "txns": [] }));
        assert_eq!(body.to_string(), r#"{"txns":[]}"#);
    }

    #[test]
    fn keeps_the_offending_text_on_decode_failures() {
        let response = IntentTxns {
            status: StatusCode::OK,
            text: "Internal Server Error".to_string(),
        };
        match response.into_json() {
            Err(IntentApiError::DeserializeError(_, text)) => {
                assert_eq!(text, "Internal Server Error");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_api_e2e() {
        let api = DefaultIntentApi::with_default_url(Client::new());
        let response = api.generate_intent_txns(&query()).await;
        dbg!(&response);
        assert!(response.is_ok());
    }
}

//! Solana JSON-RPC over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};

use crate::error::{PortalError, Result};
use crate::keys::Pubkey;

/// Account as returned by `getAccountInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureStatus {
    pub confirmation_status: Option<String>,
    pub err: Option<Value>,
}

impl SignatureStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(
            self.confirmation_status.as_deref(),
            Some("confirmed") | Some("finalized")
        )
    }
}

/// Carries one JSON-RPC request body to the node and returns the response
/// body. `HttpTransport` is the only production implementation.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn post(&self, body: Value) -> Result<Value>;
}

pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, url: url.to_string() })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(&self, body: Value) -> Result<Value> {
        let response = self.http.post(&self.url).json(&body).send().await?;
        let status = response.status();
        let v: Value = response.json().await?;
        if !status.is_success() && v.get("error").is_none() {
            return Err(PortalError::Rpc(format!("HTTP {status} from {}", self.url)));
        }
        Ok(v)
    }
}

pub struct RpcClient {
    transport: Box<dyn RpcTransport>,
    url: String,
    commitment: String,
}

impl RpcClient {
    pub fn new(url: &str, commitment: &str, timeout: Duration) -> Result<Self> {
        let transport = HttpTransport::new(url, timeout)?;
        Ok(Self::with_transport(url, commitment, Box::new(transport)))
    }

    pub fn with_transport(url: &str, commitment: &str, transport: Box<dyn RpcTransport>) -> Self {
        Self {
            transport,
            url: url.to_string(),
            commitment: commitment.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        tracing::debug!("RPC {} -> {}", method, self.url);
        parse_rpc_result(self.transport.post(body).await?)
    }

    /// `None` when the account does not exist.
    pub async fn get_account_info(&self, key: &Pubkey) -> Result<Option<AccountInfo>> {
        let result = self
            .call(
                "getAccountInfo",
                json!([key.to_string(), {"encoding": "base64", "commitment": self.commitment}]),
            )
            .await?;
        parse_account_info(&result)
    }

    pub async fn get_latest_blockhash(&self) -> Result<[u8; 32]> {
        let result = self
            .call("getLatestBlockhash", json!([{"commitment": self.commitment}]))
            .await?;
        parse_blockhash(&result)
    }

    pub async fn send_transaction(&self, tx_base64: &str) -> Result<String> {
        let result = self
            .call(
                "sendTransaction",
                json!([tx_base64, {"encoding": "base64", "preflightCommitment": self.commitment}]),
            )
            .await?;
        result
            .as_str()
            .map(String::from)
            .ok_or_else(|| PortalError::JsonParse("missing signature string".into()))
    }

    pub async fn get_signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>> {
        let result = self
            .call("getSignatureStatuses", json!([[signature]]))
            .await?;
        parse_signature_status(&result)
    }

    /// Poll until the signature reaches `confirmed`. A status carrying an
    /// error is a program rejection.
    pub async fn confirm_transaction(
        &self,
        signature: &str,
        polls: u32,
        interval: Duration,
    ) -> Result<()> {
        for _ in 0..polls {
            if let Some(status) = self.get_signature_status(signature).await? {
                if let Some(err) = status.err {
                    return Err(PortalError::ProgramRejected {
                        signature: signature.to_string(),
                        reason: err.to_string(),
                    });
                }
                if status.is_confirmed() {
                    return Ok(());
                }
            }
            tokio::time::sleep(interval).await;
        }
        Err(PortalError::ConfirmationTimeout(signature.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

fn parse_rpc_result(mut v: Value) -> Result<Value> {
    if let Some(err) = v.get("error") {
        let msg = err["message"].as_str().unwrap_or("unknown RPC error");
        let logs = err["data"]["logs"]
            .as_array()
            .map(|logs| {
                logs.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|l| !l.is_empty());
        return Err(PortalError::Rpc(match logs {
            Some(logs) => format!("{msg}\n{logs}"),
            None => msg.to_string(),
        }));
    }
    match v.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(PortalError::JsonParse("missing result".into())),
    }
}

fn parse_account_info(result: &Value) -> Result<Option<AccountInfo>> {
    // Response: {"context":{..},"value":{"data":["<b64>","base64"],"owner":"..","lamports":N}}
    let value = &result["value"];
    if value.is_null() {
        return Ok(None);
    }
    let owner = value["owner"]
        .as_str()
        .ok_or_else(|| PortalError::JsonParse("missing owner".into()))?
        .parse::<Pubkey>()
        .map_err(|e| PortalError::JsonParse(format!("invalid owner: {e}")))?;
    let lamports = value["lamports"]
        .as_u64()
        .ok_or_else(|| PortalError::JsonParse("missing lamports".into()))?;
    let encoded = value["data"][0]
        .as_str()
        .ok_or_else(|| PortalError::JsonParse("missing account data".into()))?;
    let data = STANDARD
        .decode(encoded)
        .map_err(|e| PortalError::JsonParse(format!("invalid base64 data: {e}")))?;
    Ok(Some(AccountInfo { owner, lamports, data }))
}

fn parse_blockhash(result: &Value) -> Result<[u8; 32]> {
    // Response: {"value":{"blockhash":"...","lastValidBlockHeight":N}}
    let encoded = result["value"]["blockhash"]
        .as_str()
        .ok_or_else(|| PortalError::JsonParse("missing blockhash".into()))?;
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| PortalError::JsonParse(format!("invalid blockhash: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| PortalError::JsonParse("invalid blockhash length".into()))
}

fn parse_signature_status(result: &Value) -> Result<Option<SignatureStatus>> {
    // Response: {"value":[{"confirmationStatus":"confirmed","err":null,..}]}
    let status = &result["value"][0];
    if status.is_null() {
        return Ok(None);
    }
    Ok(Some(SignatureStatus {
        confirmation_status: status["confirmationStatus"].as_str().map(String::from),
        err: Some(status["err"].clone()).filter(|e| !e.is_null()),
    }))
}

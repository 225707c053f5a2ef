use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::billing::InvoicePayload;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Error fetching token ({status}): {body}")]
    Token { status: StatusCode, body: String },

    #[error("Error sending invoice ({status}): {body}")]
    Submit { status: StatusCode, body: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

/// Short lived bearer credential. Never stored.
pub struct AccessToken(String);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct CreatedInvoice {
    id: u64,
}

/// Client for the two calls needed to create an invoice: a client
/// credentials token request followed by the invoice POST.
pub struct Fakturoid<'a> {
    http: Client,
    config: &'a Config,
}

impl<'a> Fakturoid<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|source| ApiError::Transport {
                url: config.api_url.clone(),
                source,
            })?;
        Ok(Self { http, config })
    }

    fn basic_auth(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        );
        format!("Basic {}", BASE64.encode(credentials))
    }

    pub fn access_token(&self) -> Result<AccessToken, ApiError> {
        let url = self.config.token_url();
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.basic_auth())
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let (status, body) = read(response, &url)?;
        if status != StatusCode::OK {
            return Err(ApiError::Token { status, body });
        }
        let token: TokenResponse = decode(&body, &url)?;
        debug!("Obtained access token");
        Ok(AccessToken(token.access_token))
    }

    /// Creates the invoice and returns its id.
    pub fn create_invoice(
        &self,
        token: &AccessToken,
        payload: &InvoicePayload,
    ) -> Result<u64, ApiError> {
        let url = self.config.invoice_url();
        let response = self
            .http
            .post(&url)
            .bearer_auth(&token.0)
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let (status, body) = read(response, &url)?;
        if status != StatusCode::CREATED {
            return Err(ApiError::Submit { status, body });
        }
        let created: CreatedInvoice = decode(&body, &url)?;
        info!("Created invoice {} as id {}", payload.number, created.id);
        Ok(created.id)
    }

    /// Fetches a fresh token and creates the invoice with it.
    pub fn submit(&self, payload: &InvoicePayload) -> Result<u64, ApiError> {
        let token = self.access_token()?;
        self.create_invoice(&token, payload)
    }
}

fn read(
    response: Response,
    url: &str,
) -> Result<(StatusCode, String), ApiError> {
    let status = response.status();
    let body = response.text().map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;
    debug!("{} answered {}", url, status);
    Ok((status, body))
}

fn decode<T: DeserializeOwned>(body: &str, url: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

//! Ledger HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    AccountResponse, ApiErrorResponse, BalanceResponse, ProvisionAccountRequest,
    RecordUsageRequest, UsageResponse,
};

/// Ledger API client.
///
/// Provides methods for provisioning accounts, recording usage debits, and
/// reading balances.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: Client,
    base_url: String,
    api_key: String,
    service_name: String,
}

impl LedgerClient {
    /// Create a new ledger client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the ledger service (e.g., `"http://ledger:8080"`)
    /// * `api_key` - Service API key for authentication
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new ledger client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with default settings).
    #[must_use]
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            service_name: options.service_name,
        }
    }

    /// Provision a credit account for a user.
    ///
    /// The new account carries the signup bonus. Provisioning the same user
    /// twice returns [`ClientError::AccountExists`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn provision_account(
        &self,
        user_id: impl Into<String>,
    ) -> Result<AccountResponse, ClientError> {
        let url = format!("{}/internal/accounts", self.base_url);
        let request = ProvisionAccountRequest {
            user_id: user_id.into(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Record a usage debit against a user's account.
    ///
    /// The debit is atomic on the server: it either applies in full or is
    /// rejected with [`ClientError::InsufficientFunds`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn record_usage(
        &self,
        user_id: impl Into<String>,
        amount_cents: i64,
        reference: Option<String>,
    ) -> Result<UsageResponse, ClientError> {
        let url = format!("{}/internal/usage", self.base_url);
        let request = RecordUsageRequest {
            user_id: user_id.into(),
            amount_cents,
            reference,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a user's current balance (requires user JWT, not service API key).
    ///
    /// This method is typically used by the user-facing dashboard, not by services.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_balance(&self, user_jwt: &str) -> Result<BalanceResponse, ClientError> {
        let url = format!("{}/billing/balance", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {user_jwt}"))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;

                // Map specific error codes to typed errors
                match code {
                    "insufficient_funds" => {
                        let balance_cents = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("balance_cents"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0);
                        let required_cents = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("required_cents"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0);

                        Err(ClientError::InsufficientFunds {
                            balance_cents,
                            required_cents,
                        })
                    }
                    "conflict" if message.contains("Account already exists") => {
                        Err(ClientError::AccountExists {
                            user_id: message.replace("Account already exists: ", ""),
                        })
                    }
                    "not_found" => Err(ClientError::NotFound(message)),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Service name to include in requests.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            service_name: "unknown".to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with a service name.
    #[must_use]
    pub fn with_service_name(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = LedgerClient::new("http://localhost:8080", "test-api-key");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = LedgerClient::new("http://localhost:8080/", "test-api-key");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn client_options() {
        let options = ClientOptions::with_service_name("chat-runtime");
        let client = LedgerClient::with_options("http://localhost:8080", "key", options);
        assert_eq!(client.service_name, "chat-runtime");
    }
}

//! HTTP client for a Poster-style POS backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::PosConfig;

use super::api::{PosApi, ProductKind};
use super::error::{excerpt, PosError, PosResult};
use super::wire::{CategorySalesRow, Envelope, ProductRow, TransactionsPage};

const PRODUCTS_ENDPOINT: &str = "menu.getProducts";
const TRANSACTIONS_ENDPOINT: &str = "transactions.getTransactions";
const CATEGORY_SALES_ENDPOINT: &str = "dash.getCategoriesSales";

/// Date format of the day-range query parameters.
const DATE_PARAM_FORMAT: &str = "%Y-%m-%d";

/// Live [`PosApi`] implementation over HTTP.
///
/// Every call is a GET with the access token as a query parameter; the
/// request timeout is the only bound on a slow upstream, there is no retry
/// layer here. Callers own the degradation policy.
pub struct PosterClient {
    http: Client,
    base_url: String,
    token: String,
}

impl PosterClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns [`PosError::Config`] when the token is empty or the HTTP
    /// client cannot be created. An empty token would only produce
    /// authorization failures on every call, so it is rejected here.
    pub fn new(config: &PosConfig) -> PosResult<Self> {
        if config.token.trim().is_empty() {
            return Err(PosError::config(
                "POS access token is not configured (set POS_TOKEN)",
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PosError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Fetch-and-decode helper every endpoint goes through, so each call
    /// site handles failure identically.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> PosResult<T> {
        let url = self.endpoint_url(endpoint);
        debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| PosError::transport(endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PosError::transport(endpoint, e))?;

        if !status.is_success() {
            return Err(PosError::status(endpoint, status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| PosError::decode(endpoint, format!("{e} (body: {})", excerpt(&body))))
    }
}

#[async_trait]
impl PosApi for PosterClient {
    async fn products_page(
        &self,
        kind: ProductKind,
        page: u32,
        per_page: u32,
    ) -> PosResult<Vec<ProductRow>> {
        let envelope: Envelope<Vec<ProductRow>> = self
            .get_json(
                PRODUCTS_ENDPOINT,
                &[
                    ("type", kind.as_query().to_string()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;
        Ok(envelope.response)
    }

    async fn transactions_page(
        &self,
        day: NaiveDate,
        page: u32,
        per_page: u32,
    ) -> PosResult<TransactionsPage> {
        let day_param = day.format(DATE_PARAM_FORMAT).to_string();
        let envelope: Envelope<TransactionsPage> = self
            .get_json(
                TRANSACTIONS_ENDPOINT,
                &[
                    ("date_from", day_param.clone()),
                    ("date_to", day_param),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;
        Ok(envelope.response)
    }

    async fn category_sales(&self, day: NaiveDate) -> PosResult<Vec<CategorySalesRow>> {
        let day_param = day.format(DATE_PARAM_FORMAT).to_string();
        let envelope: Envelope<Vec<CategorySalesRow>> = self
            .get_json(
                CATEGORY_SALES_ENDPOINT,
                &[("dateFrom", day_param.clone()), ("dateTo", day_param)],
            )
            .await?;
        Ok(envelope.response)
    }
}

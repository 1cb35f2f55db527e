use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    classifier,
    domain::{Customer, CustomerAddress, CustomerId, Order, OrderId, Stock},
    protocol::CreateOrderRequest,
};
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, Result},
    repository::{CatalogRepository, OrderRepository},
};

pub struct HttpBackend {
    http: Client,
    base_url: String,
    strict_activity_flags: bool,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            strict_activity_flags: false,
        }
    }

    /// Reject order lists containing an `isActive` value outside the
    /// recognised set instead of classifying it as active.
    pub fn strict_activity_flags(mut self, strict: bool) -> Self {
        self.strict_activity_flags = strict;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends the request; `None` for `204 No Content` or an empty body.
    async fn execute(&self, request: RequestBuilder, endpoint: &str) -> Result<Option<Vec<u8>>> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Network {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%endpoint, status = status.as_u16(), "backend request failed");
            return Err(ClientError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Network {
                endpoint: endpoint.to_string(),
                source,
            })?;
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(body.to_vec()))
    }

    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let endpoint = self.endpoint(path);
        debug!(%endpoint, "GET");
        match self.execute(self.http.get(&endpoint), &endpoint).await? {
            Some(body) => decode(&endpoint, &body).map(Some),
            None => Ok(None),
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        Ok(self.get_optional(path).await?.unwrap_or_default())
    }

    fn check_activity_flags(&self, raw_orders: &[Value]) -> Result<()> {
        if !self.strict_activity_flags {
            return Ok(());
        }
        for raw in raw_orders {
            if let Err(source) = classifier::interpret(raw.get("isActive")) {
                let order_id = OrderId(raw.get("orderId").and_then(Value::as_i64).unwrap_or_default());
                return Err(ClientError::ClassificationAmbiguity { order_id, source });
            }
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| ClientError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// A 2xx mutation reply that is not an order (`{"message": ..}`, a bare id)
/// still means the change was applied; it is logged and dropped.
fn order_from_reply(endpoint: &str, reply: Option<Vec<u8>>) -> Option<Order> {
    let body = reply?;
    match serde_json::from_slice(&body) {
        Ok(order) => Some(order),
        Err(err) => {
            debug!(
                %endpoint,
                error = %err,
                body = %String::from_utf8_lossy(&body),
                "mutation reply is not an order; ignoring it"
            );
            None
        }
    }
}

fn decode_value<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| ClientError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl OrderRepository for HttpBackend {
    async fn list_orders(&self) -> Result<Vec<Order>> {
        let endpoint = self.endpoint("/Orders");
        let raw_orders: Vec<Value> = self.get_list("/Orders").await?;
        self.check_activity_flags(&raw_orders)?;
        let orders: Vec<Order> = decode_value(&endpoint, Value::Array(raw_orders))?;
        debug!(count = orders.len(), "orders fetched");
        Ok(orders)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let path = format!("/Orders/{order_id}");
        let raw: Value = self
            .get_optional(&path)
            .await?
            .ok_or_else(|| ClientError::MissingBody {
                endpoint: self.endpoint(&path),
            })?;
        self.check_activity_flags(std::slice::from_ref(&raw))?;
        decode_value(&self.endpoint(&path), raw)
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Option<Order>> {
        let endpoint = self.endpoint("/Orders");
        info!(order_no = %request.order_no, lines = request.order_details.len(), "creating order");
        let reply = self
            .execute(self.http.post(&endpoint).json(request), &endpoint)
            .await?;
        Ok(order_from_reply(&endpoint, reply))
    }

    async fn update_order(&self, order_id: OrderId, order: &Order) -> Result<Option<Order>> {
        let endpoint = self.endpoint(&format!("/Orders/{order_id}"));
        info!(%order_id, active = order.activity.is_active(), "updating order");
        let reply = self
            .execute(self.http.put(&endpoint).json(order), &endpoint)
            .await?;
        Ok(order_from_reply(&endpoint, reply))
    }
}

#[async_trait]
impl CatalogRepository for HttpBackend {
    async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.get_list("/Customers").await
    }

    async fn list_stocks(&self) -> Result<Vec<Stock>> {
        self.get_list("/Stocks").await
    }

    async fn customer_addresses(&self, customer_id: CustomerId) -> Result<Vec<CustomerAddress>> {
        match self
            .get_list(&format!("/Customers/{customer_id}/addresses"))
            .await
        {
            Err(ClientError::Http { status, .. }) if status == 404 || status == 500 => {
                warn!(%customer_id, status, "addresses unavailable; showing none");
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

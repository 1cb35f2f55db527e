use async_trait::async_trait;
use shared::{
    classifier::Activity,
    domain::{Customer, CustomerAddress, CustomerId, Order, OrderId, Stock},
    protocol::CreateOrderRequest,
};
use storage::SessionStore;

use crate::error::{ClientError, Result};

/// Order operations. Each call reaches the backend at most once.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Every order, active and inactive alike.
    async fn list_orders(&self) -> Result<Vec<Order>>;
    async fn get_order(&self, order_id: OrderId) -> Result<Order>;
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Option<Order>>;
    /// Full replace; `order` must carry every field.
    async fn update_order(&self, order_id: OrderId, order: &Order) -> Result<Option<Order>>;

    async fn set_activity(&self, order_id: OrderId, activity: Activity) -> Result<()> {
        let current = self.get_order(order_id).await?;
        self.update_order(order_id, &current.with_activity(activity))
            .await?;
        Ok(())
    }

    /// Soft delete.
    async fn deactivate_order(&self, order_id: OrderId) -> Result<()> {
        self.set_activity(order_id, Activity::Inactive).await
    }

    async fn restore_order(&self, order_id: OrderId) -> Result<()> {
        self.set_activity(order_id, Activity::Active).await
    }
}

/// Reference data shown next to orders.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_customers(&self) -> Result<Vec<Customer>>;
    async fn list_stocks(&self) -> Result<Vec<Stock>>;
    /// Supplementary data: implementations return an empty list when the
    /// backend answers 404 or 500.
    async fn customer_addresses(&self, customer_id: CustomerId) -> Result<Vec<CustomerAddress>>;
}

/// Gate checked before the order view is opened.
#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn is_authenticated(&self) -> Result<bool>;
}

#[async_trait]
impl AuthGate for SessionStore {
    async fn is_authenticated(&self) -> Result<bool> {
        SessionStore::is_authenticated(self)
            .await
            .map_err(ClientError::Storage)
    }
}

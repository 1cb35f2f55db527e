use std::sync::Arc;

use shared::{
    classifier::{self, Activity},
    domain::{Customer, CustomerAddress, CustomerId, Order, OrderId, Stock},
    draft::OrderDraft,
};
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::{
    error::{ClientError, Result},
    render::{self, OrderDetailsView, OrderTable, TableQuery},
    repository::{AuthGate, CatalogRepository, OrderRepository},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    #[default]
    ShowingActive,
    ShowingInactive,
}

impl ViewMode {
    pub fn other(self) -> Self {
        match self {
            ViewMode::ShowingActive => ViewMode::ShowingInactive,
            ViewMode::ShowingInactive => ViewMode::ShowingActive,
        }
    }

    /// Orders listed in this mode.
    pub fn activity(self) -> Activity {
        match self {
            ViewMode::ShowingActive => Activity::Active,
            ViewMode::ShowingInactive => Activity::Inactive,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::ShowingActive => "Active orders",
            ViewMode::ShowingInactive => "Deleted orders",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Rendered { mode: ViewMode, orders: usize },
    Notice(String),
    Error(String),
}

#[derive(Default)]
struct ViewState {
    mode: ViewMode,
    orders: Vec<Order>,
    customers: Vec<Customer>,
    stocks: Vec<Stock>,
}

pub struct ViewController {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
    auth: Arc<dyn AuthGate>,
    state: Mutex<ViewState>,
    inflight: Mutex<()>,
    events: broadcast::Sender<ViewEvent>,
}

impl ViewController {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogRepository>,
        auth: Arc<dyn AuthGate>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            orders,
            catalog,
            auth,
            state: Mutex::new(ViewState::default()),
            inflight: Mutex::new(()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    pub async fn mode(&self) -> ViewMode {
        self.state.lock().await.mode
    }

    /// Cached orders of the current mode.
    pub async fn orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.clone()
    }

    pub async fn customers(&self) -> Vec<Customer> {
        self.state.lock().await.customers.clone()
    }

    pub async fn stocks(&self) -> Vec<Stock> {
        self.state.lock().await.stocks.clone()
    }

    /// Checks the sign-in gate, loads customers and stocks, then shows the
    /// active list.
    pub async fn open(&self) -> Result<()> {
        let result = self.open_inner().await;
        self.report(result)
    }

    async fn open_inner(&self) -> Result<()> {
        if !self.auth.is_authenticated().await? {
            return Err(ClientError::NotAuthenticated);
        }
        let _guard = self.begin_action()?;
        self.load_catalog().await?;
        self.load(ViewMode::ShowingActive).await
    }

    pub async fn reload(&self) -> Result<()> {
        let result: Result<()> = async {
            let _guard = self.begin_action()?;
            let mode = self.mode().await;
            self.load(mode).await
        }
        .await;
        self.report(result)
    }

    /// Switches between the active and deleted lists.
    pub async fn toggle(&self) -> Result<ViewMode> {
        let result: Result<ViewMode> = async {
            let _guard = self.begin_action()?;
            let target = self.mode().await.other();
            self.load(target).await?;
            Ok(target)
        }
        .await;
        self.report(result)
    }

    /// Soft-deletes an order shown in the active list.
    pub async fn delete(&self, order_id: OrderId) -> Result<()> {
        let result: Result<()> = async {
            let _guard = self.begin_action()?;
            self.require_mode("delete", ViewMode::ShowingActive).await?;
            self.orders.deactivate_order(order_id).await?;
            info!(%order_id, "order deactivated");
            self.load(ViewMode::ShowingActive).await
        }
        .await;
        self.report(result)?;
        self.notify("Order deleted.");
        Ok(())
    }

    /// Reactivates an order shown in the deleted list.
    pub async fn restore(&self, order_id: OrderId) -> Result<()> {
        let result: Result<()> = async {
            let _guard = self.begin_action()?;
            self.require_mode("restore", ViewMode::ShowingInactive)
                .await?;
            self.orders.restore_order(order_id).await?;
            info!(%order_id, "order restored");
            self.load(ViewMode::ShowingInactive).await
        }
        .await;
        self.report(result)?;
        self.notify("Order restored.");
        Ok(())
    }

    /// Validates the draft, creates the order and returns to the active list.
    pub async fn create(&self, draft: &OrderDraft) -> Result<Option<Order>> {
        let result: Result<Option<Order>> = async {
            let _guard = self.begin_action()?;
            draft.validate()?;
            let stocks = self.stocks_for_pricing().await?;
            let request = draft.build(&stocks)?;
            let created = self.orders.create_order(&request).await?;
            info!(order_no = %request.order_no, total = request.total_price, "order created");
            self.load(ViewMode::ShowingActive).await?;
            Ok(created)
        }
        .await;
        let created = self.report(result)?;
        self.notify("Order created.");
        Ok(created)
    }

    /// Fresh copy of one order, ready for display.
    pub async fn details(&self, order_id: OrderId) -> Result<OrderDetailsView> {
        let result: Result<OrderDetailsView> = async {
            let order = self.orders.get_order(order_id).await?;
            let state = self.state.lock().await;
            Ok(render::render_details(&order, &state.customers, &state.stocks))
        }
        .await;
        self.report(result)
    }

    pub async fn customer_addresses(&self, customer_id: CustomerId) -> Result<Vec<CustomerAddress>> {
        let result = self.catalog.customer_addresses(customer_id).await;
        self.report(result)
    }

    /// Table for the cached list of the current mode.
    pub async fn table(&self, query: &TableQuery) -> OrderTable {
        let state = self.state.lock().await;
        render::render_table(&state.orders, state.mode, &state.customers, query)
    }

    fn begin_action(&self) -> Result<MutexGuard<'_, ()>> {
        self.inflight.try_lock().map_err(|_| ClientError::Busy)
    }

    async fn require_mode(&self, action: &'static str, expected: ViewMode) -> Result<()> {
        let mode = self.mode().await;
        if mode != expected {
            return Err(ClientError::InvalidTransition { action, mode });
        }
        Ok(())
    }

    async fn load_catalog(&self) -> Result<()> {
        let (customers, stocks) =
            futures::try_join!(self.catalog.list_customers(), self.catalog.list_stocks())?;
        info!(customers = customers.len(), stocks = stocks.len(), "catalog loaded");

        let mut state = self.state.lock().await;
        state.customers = customers;
        state.stocks = stocks;
        Ok(())
    }

    async fn stocks_for_pricing(&self) -> Result<Vec<Stock>> {
        let cached = self.stocks().await;
        if !cached.is_empty() {
            return Ok(cached);
        }
        let stocks = self.catalog.list_stocks().await?;
        self.state.lock().await.stocks = stocks.clone();
        Ok(stocks)
    }

    /// Fetches, classifies and commits `mode`. Nothing changes on failure.
    async fn load(&self, mode: ViewMode) -> Result<()> {
        let all = self.orders.list_orders().await?;
        let total = all.len();
        let orders = match mode {
            ViewMode::ShowingActive => classifier::filter_active(&all),
            ViewMode::ShowingInactive => classifier::filter_inactive(&all),
        };
        info!(?mode, shown = orders.len(), total, "order list loaded");

        let count = orders.len();
        {
            let mut state = self.state.lock().await;
            state.mode = mode;
            state.orders = orders;
        }
        let _ = self.events.send(ViewEvent::Rendered {
            mode,
            orders: count,
        });
        Ok(())
    }

    fn notify(&self, message: &str) {
        let _ = self.events.send(ViewEvent::Notice(message.to_string()));
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            match err {
                ClientError::Busy | ClientError::Validation(_) | ClientError::InvalidTransition { .. } => {
                    warn!(error = %err, "order action rejected")
                }
                _ => error!(error = %err, "order action failed"),
            }
            let _ = self.events.send(ViewEvent::Error(err.user_message()));
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::config::CURRENCY;
use crate::domain::errors::DomainError;
use crate::domain::events::OrderCreated;
use crate::domain::order::{
    to_minor_units, Checkout, CustomerSnapshot, GatewayOrder, GatewayOrderRequest, NewOrder,
    Order, PaymentMethod, PlacedOrder, UNKNOWN_CUSTOMER,
};
use crate::domain::ports::{OrderEventHandler, OrderRepository, PaymentGateway, UserDirectory};

const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(5);

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserDirectory>,
    gateway: Arc<dyn PaymentGateway>,
    handlers: Vec<Arc<dyn OrderEventHandler>>,
    gateway_timeout: Duration,
    handler_timeout: Duration,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserDirectory>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            orders,
            users,
            gateway,
            handlers: Vec::new(),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn OrderEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// Upper bound for each post-commit handler.
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Places an order.
    ///
    /// Online checkouts open the gateway order before anything is written, so
    /// a gateway failure leaves no order behind. Post-commit handlers run
    /// after the order is durable, each under the handler timeout, and cannot
    /// fail or stall the call.
    pub async fn create_order(&self, checkout: Checkout) -> Result<PlacedOrder, DomainError> {
        checkout.validate()?;
        let line_total = checkout.line_total();
        if line_total != checkout.total_amount {
            warn!(
                "Order total {} for user {} differs from line total {}",
                checkout.total_amount, checkout.user_id, line_total
            );
        }

        let customer = self.customer_snapshot(checkout.user_id).await;

        let gateway_order = match checkout.payment_method {
            PaymentMethod::Cod => None,
            PaymentMethod::Online => Some(self.open_gateway_order(&checkout.total_amount).await?),
        };

        let order = self
            .orders
            .create(NewOrder {
                user_id: checkout.user_id,
                items: checkout.items,
                total_amount: checkout.total_amount,
                customer,
                address: checkout.address,
                room_number: checkout.room_number,
                payment_method: checkout.payment_method,
                razorpay_order_id: gateway_order.as_ref().map(|g| g.id.clone()),
            })
            .await?;
        info!(
            "Created {} order {} for user {} ({} lines, total {})",
            order.payment_method,
            order.id,
            order.user_id,
            order.items.len(),
            order.total_amount
        );

        let order_id = order.id;
        self.dispatch(OrderCreated { order }).await;

        Ok(PlacedOrder {
            order_id,
            gateway_order,
        })
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, DomainError> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or(DomainError::OrderNotFound)
    }

    pub async fn list_user_orders(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        self.orders.list_for_user(user_id).await
    }

    pub async fn list_vendor_orders(&self, source_id: &str) -> Result<Vec<Order>, DomainError> {
        self.orders.list_for_vendor(source_id).await
    }

    async fn customer_snapshot(&self, user_id: Uuid) -> CustomerSnapshot {
        match self.users.find_user(user_id).await {
            Ok(Some(user)) => CustomerSnapshot {
                name: user.name,
                phone: user.phone.unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string()),
            },
            Ok(None) => {
                warn!("User {user_id} not found, recording order with an unknown customer");
                CustomerSnapshot::unknown()
            }
            Err(e) => {
                warn!("User lookup for {user_id} failed: {e}");
                CustomerSnapshot::unknown()
            }
        }
    }

    async fn open_gateway_order(&self, total: &BigDecimal) -> Result<GatewayOrder, DomainError> {
        let amount = to_minor_units(total)?;
        if amount <= 0 {
            return Err(DomainError::InvalidInput(
                "online payments need a positive amount".to_string(),
            ));
        }
        let request = GatewayOrderRequest {
            amount,
            currency: CURRENCY.to_string(),
            receipt: format!("receipt_{}", Utc::now().timestamp_millis()),
        };
        let gateway_order =
            tokio::time::timeout(self.gateway_timeout, self.gateway.create_order(request))
                .await
                .map_err(|_| {
                    DomainError::Gateway(format!(
                        "no response from the payment gateway within {:?}",
                        self.gateway_timeout
                    ))
                })??;
        info!("Opened gateway order {} for {} paise", gateway_order.id, amount);
        Ok(gateway_order)
    }

    async fn dispatch(&self, event: OrderCreated) {
        for handler in &self.handlers {
            let run = handler.on_order_created(&event);
            match tokio::time::timeout(self.handler_timeout, run).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    "{} failed for order {}: {}",
                    handler.name(),
                    event.order.id,
                    e
                ),
                Err(_) => warn!(
                    "{} timed out after {:?} for order {}",
                    handler.name(),
                    self.handler_timeout,
                    event.order.id
                ),
            }
        }
    }
}

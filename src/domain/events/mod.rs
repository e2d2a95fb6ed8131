//! Domain events
//!
//! Published best-effort to NATS when a connection is configured.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: Uuid, slug: Option<String> },
    StockAdjusted { product_id: Uuid, stock: u32, sales: u32 },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: Uuid, order_number: String, user_id: Uuid, total: Decimal },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
    Cancelled { order_id: Uuid, by: Uuid },
}

impl DomainEvent {
    pub fn subject(&self) -> String {
        match self {
            Self::Product(ProductEvent::Created { .. }) => "ecommerce.product.created",
            Self::Product(ProductEvent::StockAdjusted { .. }) => "ecommerce.product.stock_adjusted",
            Self::Order(OrderEvent::Created { .. }) => "ecommerce.order.created",
            Self::Order(OrderEvent::StatusChanged { .. }) => "ecommerce.order.status_changed",
            Self::Order(OrderEvent::Cancelled { .. }) => "ecommerce.order.cancelled",
        }
        .to_string()
    }
}

/// Fire-and-forget publisher. A missing client turns publishing into a no-op.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }
    pub fn disabled() -> Self { Self { nats: None } }

    pub async fn publish(&self, event: DomainEvent) {
        let Some(client) = &self.nats else {
            tracing::trace!(subject = %event.subject(), "event publishing disabled");
            return;
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize domain event");
                return;
            }
        };
        if let Err(e) = client.publish(event.subject(), payload.into()).await {
            tracing::warn!(error = %e, subject = %event.subject(), "failed to publish domain event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_shape() {
        let event = DomainEvent::Order(OrderEvent::StatusChanged {
            order_id: Uuid::nil(),
            from: OrderStatus::Pending,
            to: OrderStatus::Cancelled,
        });
        assert_eq!(event.subject(), "ecommerce.order.status_changed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "order");
        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["to"], "cancelled");
    }

    #[tokio::test]
    async fn test_disabled_publisher_is_noop() {
        EventPublisher::disabled()
            .publish(DomainEvent::Order(OrderEvent::Cancelled { order_id: Uuid::nil(), by: Uuid::nil() }))
            .await;
    }
}

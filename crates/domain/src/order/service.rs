//! Transactional create, replace, and delete of orders with their items.

use std::time::Instant;

use common::{OrderId, ProductId, Weight};
use store::{Order, Store, StoreError, StoreTransaction};

use super::commands::{CreateOrder, ReplaceOrder, ValidDraft};
use super::number::OrderNumber;
use super::weight::{MAX_ORDER_WEIGHT, check_weight_limit};
use crate::error::{DomainError, Entity};
use crate::transaction::finish;

/// Service for writing orders.
///
/// Every create and replace runs in a single store transaction. Either the
/// order header, its items, and the order number counter all change, or
/// nothing does.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
    weight_limit: Weight,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with the standard 150 kg limit.
    pub fn new(store: S) -> Self {
        Self {
            store,
            weight_limit: MAX_ORDER_WEIGHT,
        }
    }

    /// Creates an order with its initial items.
    ///
    /// Allocates the next order number unless the command supplies one.
    #[tracing::instrument(skip(self, cmd), fields(order_number = cmd.order_number.as_deref()))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order, DomainError> {
        let (requested, draft) = cmd.validate()?;

        let started = Instant::now();
        let mut tx = self.store.begin().await?;
        let outcome = self.create_in(tx.as_mut(), requested, draft).await;
        let result = finish(tx, outcome).await;
        record_outcome("create", started, &result);

        if let Ok(order) = &result {
            metrics::counter!("orders_created_total").increment(1);
            tracing::info!(
                order_id = %order.id,
                order_number = %order.order_number,
                total_weight = %order.total_weight,
                "order created"
            );
        }
        result
    }

    /// Replaces an order's header and its whole item set.
    ///
    /// The order number is kept. A failure leaves the order as it was.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn replace_order(&self, cmd: ReplaceOrder) -> Result<Order, DomainError> {
        let draft = cmd.validate()?;

        let started = Instant::now();
        let mut tx = self.store.begin().await?;
        let outcome = self.replace_in(tx.as_mut(), cmd.order_id, draft).await;
        let result = finish(tx, outcome).await;
        record_outcome("replace", started, &result);

        if let Ok(order) = &result {
            metrics::counter!("orders_replaced_total").increment(1);
            tracing::info!(
                order_id = %order.id,
                total_weight = %order.total_weight,
                items = order.items.len(),
                "order replaced"
            );
        }
        result
    }

    /// Loads a committed order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Order, id))
    }

    /// Deletes an order and its items.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), DomainError> {
        if !self.store.delete_order(id).await? {
            return Err(DomainError::not_found(Entity::Order, id));
        }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    async fn create_in(
        &self,
        tx: &mut dyn StoreTransaction,
        requested: Option<OrderNumber>,
        draft: ValidDraft,
    ) -> Result<Order, DomainError> {
        ensure_customer(tx, &draft).await?;

        let number = match requested {
            Some(number) => {
                number.reserve(tx).await?;
                number
            }
            None => OrderNumber::allocate(tx).await?,
        };

        let order_id = tx.insert_order(&number.to_string(), &draft.header).await?;
        self.fill_items(tx, order_id, &draft.lines).await?;
        load_order(tx, order_id).await
    }

    async fn replace_in(
        &self,
        tx: &mut dyn StoreTransaction,
        order_id: OrderId,
        draft: ValidDraft,
    ) -> Result<Order, DomainError> {
        if tx.lock_order(order_id).await?.is_none() {
            return Err(DomainError::not_found(Entity::Order, order_id));
        }
        ensure_customer(tx, &draft).await?;

        tx.update_order_header(order_id, &draft.header).await?;
        let removed = tx.delete_order_items(order_id).await?;
        tracing::debug!(removed, "cleared previous items");

        self.fill_items(tx, order_id, &draft.lines).await?;
        load_order(tx, order_id).await
    }

    /// Resolves every product, inserts one item per line in order, and
    /// checks the resulting total against the weight limit.
    async fn fill_items(
        &self,
        tx: &mut dyn StoreTransaction,
        order_id: OrderId,
        lines: &[(ProductId, u32)],
    ) -> Result<(), DomainError> {
        for (product, _) in lines {
            if tx.get_product(*product).await?.is_none() {
                return Err(DomainError::unknown_reference(Entity::Product, *product));
            }
        }

        for (product, quantity) in lines {
            tx.insert_order_item(order_id, *product, *quantity).await?;
        }

        let total = tx.order_weight(order_id).await?;
        check_weight_limit(total, self.weight_limit)
    }
}

async fn ensure_customer(
    tx: &mut dyn StoreTransaction,
    draft: &ValidDraft,
) -> Result<(), DomainError> {
    if let Some(customer) = draft.header.customer {
        if !tx.customer_exists(customer).await? {
            return Err(DomainError::unknown_reference(Entity::Customer, customer));
        }
    }
    Ok(())
}

async fn load_order(tx: &mut dyn StoreTransaction, id: OrderId) -> Result<Order, DomainError> {
    tx.get_order(id).await?.ok_or_else(|| {
        DomainError::Store(StoreError::Backend(format!(
            "order {id} missing after write"
        )))
    })
}

fn record_outcome(operation: &'static str, started: Instant, result: &Result<Order, DomainError>) {
    metrics::histogram!("order_transaction_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());

    match result {
        Ok(_) => {}
        Err(DomainError::WeightLimitExceeded { total, limit }) => {
            metrics::counter!("orders_weight_rejected_total", "operation" => operation)
                .increment(1);
            tracing::info!(%total, %limit, "order rejected over weight limit");
        }
        Err(DomainError::Store(e)) => {
            tracing::error!(error = %e, operation, "order transaction failed");
        }
        Err(e) => {
            tracing::debug!(error = %e, operation, "order transaction rolled back");
        }
    }
}

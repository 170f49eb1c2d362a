use async_trait::async_trait;
use common::{CustomerId, OrderId, ProductId, Weight};

use crate::{
    Customer, CustomerFields, Order, OrderFilter, OrderHeader, OrderItem, Product, ProductFields,
    Result,
};

/// Core trait for storage backends.
///
/// Plain reads and single-row writes run directly against the backend and
/// only ever observe committed data. Multi-row writes go through
/// [`Store::begin`], which hands out a [`StoreTransaction`].
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a transaction.
    ///
    /// Nothing written through the transaction is visible to other readers
    /// until [`StoreTransaction::commit`]. Dropping it without committing
    /// rolls back.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Lists customers ordered by id.
    async fn list_customers(&self) -> Result<Vec<Customer>>;

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Inserts a customer. A duplicate name fails with `Conflict`.
    async fn insert_customer(&self, fields: &CustomerFields) -> Result<Customer>;

    /// Replaces all writable columns of a customer.
    ///
    /// Returns None if the customer doesn't exist.
    async fn update_customer(
        &self,
        id: CustomerId,
        fields: &CustomerFields,
    ) -> Result<Option<Customer>>;

    /// Deletes a customer, clearing the customer reference on their orders.
    ///
    /// Returns false if the customer doesn't exist.
    async fn delete_customer(&self, id: CustomerId) -> Result<bool>;

    /// Lists products ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts a product. A duplicate name fails with `Conflict`.
    async fn insert_product(&self, fields: &ProductFields) -> Result<Product>;

    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Option<Product>>;

    /// Deletes a product together with every order item referencing it.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Loads an order with its items and total weight.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists orders matching a filter, ordered by id, each appearing once.
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

    /// Deletes an order and all of its items.
    async fn delete_order(&self, id: OrderId) -> Result<bool>;
}

/// A unit of work against the store.
///
/// Either every write made through the transaction is applied by
/// [`commit`](StoreTransaction::commit), or none is.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Advances the order number counter and returns the new value.
    ///
    /// The counter is part of the transaction: concurrent callers are
    /// serialized, and a rollback returns the value to the pool.
    async fn next_order_sequence(&mut self) -> Result<u64>;

    /// Raises the order number counter to at least `value`.
    async fn advance_order_sequence(&mut self, value: u64) -> Result<()>;

    /// Checks that a customer exists and keeps it from being deleted until
    /// the transaction ends.
    async fn customer_exists(&mut self, id: CustomerId) -> Result<bool>;

    /// Loads a product and keeps it from changing until the transaction ends.
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts an order row. A duplicate order number fails with `Conflict`.
    async fn insert_order(&mut self, order_number: &str, header: &OrderHeader) -> Result<OrderId>;

    /// Locks an order row for update and returns its order number.
    ///
    /// Returns None if the order doesn't exist.
    async fn lock_order(&mut self, id: OrderId) -> Result<Option<String>>;

    /// Overwrites the mutable columns of an order row.
    async fn update_order_header(&mut self, id: OrderId, header: &OrderHeader) -> Result<()>;

    /// Deletes every item of an order and returns how many were removed.
    async fn delete_order_items(&mut self, id: OrderId) -> Result<u64>;

    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product: ProductId,
        quantity: u32,
    ) -> Result<OrderItem>;

    /// Computes Σ(quantity × product weight) over the order's current items.
    async fn order_weight(&mut self, id: OrderId) -> Result<Weight>;

    /// Loads an order as seen from inside the transaction.
    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

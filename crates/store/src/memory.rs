use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{CustomerId, OrderId, OrderItemId, ProductId, Weight};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Customer, CustomerFields, Order, OrderFilter, OrderHeader, OrderItem, Product, ProductFields,
    Result, StoreError,
    store::{Store, StoreTransaction},
};

/// Order row without its items.
#[derive(Debug, Clone)]
struct StoredOrder {
    order_number: String,
    customer: Option<CustomerId>,
    order_date: NaiveDate,
    address: String,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, StoredOrder>,
    /// Line items owned by each order. Removing the order's entry frees them.
    order_items: BTreeMap<OrderId, Vec<OrderItem>>,
    last_customer_id: i64,
    last_product_id: i64,
    last_order_id: i64,
    last_item_id: i64,
    order_sequence: u64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn conflict(constraint: &str, column: &str, value: &str) -> StoreError {
    StoreError::Conflict {
        constraint: constraint.to_string(),
        detail: format!("Key ({column})=({value}) already exists."),
    }
}

impl Tables {
    fn check_customer_name(&self, name: &str, except: Option<CustomerId>) -> Result<()> {
        let taken = self
            .customers
            .values()
            .any(|c| c.name == name && Some(c.id) != except);
        if taken {
            return Err(conflict("customers_name_key", "name", name));
        }
        Ok(())
    }

    fn check_product_name(&self, name: &str, except: Option<ProductId>) -> Result<()> {
        let taken = self
            .products
            .values()
            .any(|p| p.name == name && Some(p.id) != except);
        if taken {
            return Err(conflict("products_name_key", "name", name));
        }
        Ok(())
    }

    fn order_weight(&self, id: OrderId) -> Weight {
        self.order_items
            .get(&id)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        self.products
                            .get(&item.product)
                            .map(|p| p.weight.multiply(item.quantity))
                    })
                    .sum()
            })
            .unwrap_or_default()
    }

    fn load_order(&self, id: OrderId) -> Option<Order> {
        let stored = self.orders.get(&id)?;
        Some(Order {
            id,
            order_number: stored.order_number.clone(),
            customer: stored.customer,
            order_date: stored.order_date,
            address: stored.address.clone(),
            items: self.order_items.get(&id).cloned().unwrap_or_default(),
            total_weight: self.order_weight(id),
        })
    }

    fn matches(&self, id: OrderId, stored: &StoredOrder, filter: &OrderFilter) -> bool {
        if let Some(ref names) = filter.products {
            let names: HashSet<&str> = names.iter().map(String::as_str).collect();
            let has_product = self.order_items.get(&id).is_some_and(|items| {
                items.iter().any(|item| {
                    self.products
                        .get(&item.product)
                        .is_some_and(|p| names.contains(p.name.as_str()))
                })
            });
            if !has_product {
                return false;
            }
        }
        if let Some(ref name) = filter.customer {
            let customer_matches = stored
                .customer
                .and_then(|c| self.customers.get(&c))
                .is_some_and(|c| &c.name == name);
            if !customer_matches {
                return false;
            }
        }
        true
    }
}

/// In-memory store implementation for tests and local development.
///
/// A transaction holds the write lock for its whole lifetime and works on a
/// private copy of the tables, which replaces the shared state on commit.
/// This gives serializable isolation: readers never observe an in-flight
/// transaction.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of stored order items across all orders.
    pub async fn order_item_count(&self) -> usize {
        self.tables
            .read()
            .await
            .order_items
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Clears all tables and resets the order number counter.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = self.tables.clone().write_owned().await;
        let working = Tables::clone(&guard);
        Ok(Box::new(InMemoryTransaction { guard, working }))
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.tables.read().await.customers.values().cloned().collect())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn insert_customer(&self, fields: &CustomerFields) -> Result<Customer> {
        let mut tables = self.tables.write().await;
        tables.check_customer_name(&fields.name, None)?;

        let id = CustomerId::new(next_id(&mut tables.last_customer_id));
        let customer = Customer {
            id,
            name: fields.name.clone(),
            contact_number: fields.contact_number.clone(),
            email: fields.email.clone(),
        };
        tables.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        fields: &CustomerFields,
    ) -> Result<Option<Customer>> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&id) {
            return Ok(None);
        }
        tables.check_customer_name(&fields.name, Some(id))?;

        let customer = Customer {
            id,
            name: fields.name.clone(),
            contact_number: fields.contact_number.clone(),
            email: fields.email.clone(),
        };
        tables.customers.insert(id, customer.clone());
        Ok(Some(customer))
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.customers.remove(&id).is_none() {
            return Ok(false);
        }
        for order in tables.orders.values_mut() {
            if order.customer == Some(id) {
                order.customer = None;
            }
        }
        Ok(true)
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.tables.read().await.products.values().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn insert_product(&self, fields: &ProductFields) -> Result<Product> {
        let mut tables = self.tables.write().await;
        tables.check_product_name(&fields.name, None)?;

        let id = ProductId::new(next_id(&mut tables.last_product_id));
        let product = Product {
            id,
            name: fields.name.clone(),
            weight: fields.weight,
        };
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Option<Product>> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&id) {
            return Ok(None);
        }
        tables.check_product_name(&fields.name, Some(id))?;

        let product = Product {
            id,
            name: fields.name.clone(),
            weight: fields.weight,
        };
        tables.products.insert(id, product.clone());
        Ok(Some(product))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        for items in tables.order_items.values_mut() {
            items.retain(|item| item.product != id);
        }
        Ok(true)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.load_order(id))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .filter(|(id, stored)| tables.matches(**id, stored, filter))
            .filter_map(|(id, _)| tables.load_order(*id))
            .collect())
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.orders.remove(&id).is_none() {
            return Ok(false);
        }
        tables.order_items.remove(&id);
        Ok(true)
    }
}

/// Transaction over an [`InMemoryStore`].
pub struct InMemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn next_order_sequence(&mut self) -> Result<u64> {
        self.working.order_sequence += 1;
        Ok(self.working.order_sequence)
    }

    async fn advance_order_sequence(&mut self, value: u64) -> Result<()> {
        self.working.order_sequence = self.working.order_sequence.max(value);
        Ok(())
    }

    async fn customer_exists(&mut self, id: CustomerId) -> Result<bool> {
        Ok(self.working.customers.contains_key(&id))
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn insert_order(&mut self, order_number: &str, header: &OrderHeader) -> Result<OrderId> {
        let tables = &mut self.working;
        if tables
            .orders
            .values()
            .any(|o| o.order_number == order_number)
        {
            return Err(conflict(
                "orders_order_number_key",
                "order_number",
                order_number,
            ));
        }

        let id = OrderId::new(next_id(&mut tables.last_order_id));
        tables.orders.insert(
            id,
            StoredOrder {
                order_number: order_number.to_string(),
                customer: header.customer,
                order_date: header.order_date,
                address: header.address.clone(),
            },
        );
        tables.order_items.insert(id, Vec::new());
        Ok(id)
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<String>> {
        Ok(self
            .working
            .orders
            .get(&id)
            .map(|o| o.order_number.clone()))
    }

    async fn update_order_header(&mut self, id: OrderId, header: &OrderHeader) -> Result<()> {
        let stored = self
            .working
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend(format!("order {id} vanished mid-transaction")))?;
        stored.customer = header.customer;
        stored.order_date = header.order_date;
        stored.address = header.address.clone();
        Ok(())
    }

    async fn delete_order_items(&mut self, id: OrderId) -> Result<u64> {
        let removed = self
            .working
            .order_items
            .get_mut(&id)
            .map(|items| std::mem::take(items).len())
            .unwrap_or(0);
        Ok(removed as u64)
    }

    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product: ProductId,
        quantity: u32,
    ) -> Result<OrderItem> {
        let tables = &mut self.working;
        if !tables.orders.contains_key(&order_id) || !tables.products.contains_key(&product) {
            return Err(StoreError::Backend(format!(
                "order item references missing order {order_id} or product {product}"
            )));
        }

        let item = OrderItem {
            id: OrderItemId::new(next_id(&mut tables.last_item_id)),
            order_id,
            product,
            quantity,
        };
        tables
            .order_items
            .entry(order_id)
            .or_default()
            .push(item.clone());
        Ok(item)
    }

    async fn order_weight(&mut self, id: OrderId) -> Result<Weight> {
        Ok(self.working.order_weight(id))
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.load_order(id))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        // Releasing the guard without writing back discards the working copy.
        Ok(())
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use common::{CustomerId, OrderId, OrderItemId, ProductId, Weight};
use sqlx::postgres::{PgDatabaseError, PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction};

use crate::{
    Customer, CustomerFields, Order, OrderFilter, OrderHeader, OrderItem, Product, ProductFields,
    Result, StoreError,
    store::{Store, StoreTransaction},
};

const UNIQUE_VIOLATION: &str = "23505";

const PRODUCT_COLUMNS: &str = "id, name, (weight * 100)::BIGINT AS weight_hundredths";

const ORDER_COLUMNS: &str = r#"
    o.id, o.order_number, o.customer_id, o.order_date, o.address,
    (COALESCE((
        SELECT SUM(oi.quantity * p.weight)
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = o.id
    ), 0) * 100)::BIGINT AS total_weight_hundredths
"#;

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url` and wraps it in a store.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    /// Opens a read-only snapshot so multi-statement reads see one consistent
    /// committed state.
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

/// Maps unique violations to `Conflict`, keeping the constraint detail.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
    {
        let detail = db_err
            .try_downcast_ref::<PgDatabaseError>()
            .and_then(PgDatabaseError::detail)
            .unwrap_or_else(|| db_err.message())
            .to_string();
        let constraint = db_err.constraint().unwrap_or("unique").to_string();
        tracing::debug!(%constraint, %detail, "unique constraint violated");
        return StoreError::Conflict { constraint, detail };
    }
    StoreError::Database(err)
}

fn quantity_to_db(quantity: u32) -> Result<i32> {
    i32::try_from(quantity)
        .map_err(|_| StoreError::InvalidData(format!("quantity {quantity} exceeds INTEGER")))
}

fn row_to_customer(row: &PgRow) -> Result<Customer> {
    Ok(Customer {
        id: CustomerId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        contact_number: row.try_get("contact_number")?,
        email: row.try_get("email")?,
    })
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        weight: Weight::from_hundredths(row.try_get("weight_hundredths")?),
    })
}

fn row_to_item(row: &PgRow) -> Result<OrderItem> {
    let quantity: i32 = row.try_get("quantity")?;
    Ok(OrderItem {
        id: OrderItemId::new(row.try_get("id")?),
        order_id: OrderId::new(row.try_get("order_id")?),
        product: ProductId::new(row.try_get("product_id")?),
        quantity: u32::try_from(quantity)
            .map_err(|_| StoreError::InvalidData(format!("negative quantity {quantity}")))?,
    })
}

fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
    Ok(Order {
        id: OrderId::new(row.try_get("id")?),
        order_number: row.try_get("order_number")?,
        customer: row
            .try_get::<Option<i64>, _>("customer_id")?
            .map(CustomerId::new),
        order_date: row.try_get("order_date")?,
        address: row.try_get("address")?,
        items,
        total_weight: Weight::from_hundredths(row.try_get("total_weight_hundredths")?),
    })
}

/// Loads the items of `order_ids`, grouped by order in insertion order.
async fn fetch_items(
    conn: &mut PgConnection,
    order_ids: &[i64],
) -> Result<HashMap<OrderId, Vec<OrderItem>>> {
    let rows = sqlx::query(
        r#"
        SELECT id, order_id, product_id, quantity
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY id ASC
        "#,
    )
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in &rows {
        let item = row_to_item(row)?;
        grouped.entry(item.order_id).or_default().push(item);
    }
    Ok(grouped)
}

/// Turns order header rows into full orders by attaching their items.
async fn assemble_orders(conn: &mut PgConnection, rows: Vec<PgRow>) -> Result<Vec<Order>> {
    let ids = rows
        .iter()
        .map(|row| row.try_get::<i64, _>("id"))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mut items = fetch_items(conn, &ids).await?;

    rows.iter()
        .zip(ids)
        .map(|(row, id)| {
            let order_items = items.remove(&OrderId::new(id)).unwrap_or_default();
            row_to_order(row, order_items)
        })
        .collect()
}

async fn fetch_order(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1");
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(assemble_orders(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query("SELECT id, name, contact_number, email FROM customers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_customer).collect()
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, contact_number, email FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_customer).transpose()
    }

    async fn insert_customer(&self, fields: &CustomerFields) -> Result<Customer> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (name, contact_number, email)
            VALUES ($1, $2, $3)
            RETURNING id, name, contact_number, email
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.contact_number)
        .bind(&fields.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        row_to_customer(&row)
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        fields: &CustomerFields,
    ) -> Result<Option<Customer>> {
        let row = sqlx::query(
            r#"
            UPDATE customers SET name = $2, contact_number = $3, email = $4
            WHERE id = $1
            RETURNING id, name, contact_number, email
            "#,
        )
        .bind(id.as_i64())
        .bind(&fields.name)
        .bind(&fields.contact_number)
        .bind(&fields.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        row.as_ref().map(row_to_customer).transpose()
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool> {
        // orders.customer_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn insert_product(&self, fields: &ProductFields) -> Result<Product> {
        let sql = format!(
            "INSERT INTO products (name, weight) VALUES ($1, $2::BIGINT / 100.0) RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&fields.name)
            .bind(fields.weight.hundredths())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        row_to_product(&row)
    }

    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Option<Product>> {
        let sql = format!(
            "UPDATE products SET name = $2, weight = $3::BIGINT / 100.0 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .bind(&fields.name)
            .bind(fields.weight.hundredths())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        // order_items.product_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut tx = self.begin_snapshot().await?;
        let order = fetch_order(&mut tx, id).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE ($1::TEXT[] IS NULL OR EXISTS (
                    SELECT 1
                    FROM order_items oi
                    JOIN products p ON p.id = oi.product_id
                    WHERE oi.order_id = o.id AND p.name = ANY($1)
                ))
              AND ($2::TEXT IS NULL OR c.name = $2)
            ORDER BY o.id ASC
            "#
        );

        let mut tx = self.begin_snapshot().await?;
        let rows = sqlx::query(&sql)
            .bind(filter.products.as_deref())
            .bind(filter.customer.as_deref())
            .fetch_all(&mut *tx)
            .await?;
        let orders = assemble_orders(&mut tx, rows).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        // order_items.order_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Transaction over a [`PostgresStore`]. Dropping it without committing
/// rolls back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn next_order_sequence(&mut self) -> Result<u64> {
        let value: i64 = sqlx::query_scalar(
            "UPDATE order_number_counter SET last_value = last_value + 1 WHERE id = 1 RETURNING last_value",
        )
        .fetch_one(&mut *self.tx)
        .await?;
        u64::try_from(value)
            .map_err(|_| StoreError::InvalidData(format!("negative order sequence {value}")))
    }

    async fn advance_order_sequence(&mut self, value: u64) -> Result<()> {
        let value = i64::try_from(value)
            .map_err(|_| StoreError::InvalidData(format!("order sequence {value} exceeds BIGINT")))?;
        sqlx::query(
            "UPDATE order_number_counter SET last_value = GREATEST(last_value, $1) WHERE id = 1",
        )
        .bind(value)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn customer_exists(&mut self, id: CustomerId) -> Result<bool> {
        let row = sqlx::query("SELECT id FROM customers WHERE id = $1 FOR KEY SHARE")
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR SHARE");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn insert_order(&mut self, order_number: &str, header: &OrderHeader) -> Result<OrderId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (order_number, customer_id, order_date, address)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(order_number)
        .bind(header.customer.map(|c| c.as_i64()))
        .bind(header.order_date)
        .bind(&header.address)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;
        Ok(OrderId::new(id))
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<String>> {
        let order_number: Option<String> =
            sqlx::query_scalar("SELECT order_number FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_i64())
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(order_number)
    }

    async fn update_order_header(&mut self, id: OrderId, header: &OrderHeader) -> Result<()> {
        sqlx::query(
            "UPDATE orders SET customer_id = $2, order_date = $3, address = $4 WHERE id = $1",
        )
        .bind(id.as_i64())
        .bind(header.customer.map(|c| c.as_i64()))
        .bind(header.order_date)
        .bind(&header.address)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn delete_order_items(&mut self, id: OrderId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product: ProductId,
        quantity: u32,
    ) -> Result<OrderItem> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(order_id.as_i64())
        .bind(product.as_i64())
        .bind(quantity_to_db(quantity)?)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(OrderItem {
            id: OrderItemId::new(id),
            order_id,
            product,
            quantity,
        })
    }

    async fn order_weight(&mut self, id: OrderId) -> Result<Weight> {
        let hundredths: i64 = sqlx::query_scalar(
            r#"
            SELECT (COALESCE(SUM(oi.quantity * p.weight), 0) * 100)::BIGINT
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(Weight::from_hundredths(hundredths))
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        fetch_order(&mut self.tx, id).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

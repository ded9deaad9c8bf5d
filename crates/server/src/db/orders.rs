//! Order repository: transactional order + line item persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use luar_core::{OrderId, OrderItemId};

use super::RepositoryError;
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem};

/// Repository for order persistence.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order together with all its line items as one transaction.
    ///
    /// Either every row exists afterward or none do. The checkout flow
    /// depends on this: no payment preference is ever created for an order
    /// that was not durably recorded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a constraint violation (e.g.
    /// a line item referencing a product that was deleted mid-checkout) and
    /// `RepositoryError::Database` for other database errors. On any error
    /// the transaction is rolled back.
    pub async fn create(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (order_id, created_at): (i32, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO orders (
                customer_name, customer_email, customer_cpf,
                cep, street, number, complement, neighborhood, city, state,
                shipping_cost, total_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, created_at
            ",
        )
        .bind(&order.customer_name)
        .bind(order.customer_email.as_str())
        .bind(order.customer_cpf.as_str())
        .bind(order.cep.as_str())
        .bind(&order.street)
        .bind(&order.number)
        .bind(order.complement.as_deref())
        .bind(&order.neighborhood)
        .bind(&order.city)
        .bind(&order.state)
        .bind(order.shipping_cost)
        .bind(order.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(constraint_or_database)?;

        let order_id = OrderId::new(order_id);
        let mut persisted_items = Vec::with_capacity(items.len());

        for item in items {
            let (item_id,): (i32,) = sqlx::query_as(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, size, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                ",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(&item.size)
            .bind(item.unit_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(constraint_or_database)?;

            persisted_items.push(OrderItem {
                id: OrderItemId::new(item_id),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                size: item.size.clone(),
                unit_price: item.unit_price,
            });
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            customer_cpf: order.customer_cpf.clone(),
            cep: order.cep.clone(),
            street: order.street.clone(),
            number: order.number.clone(),
            complement: order.complement.clone(),
            neighborhood: order.neighborhood.clone(),
            city: order.city.clone(),
            state: order.state.clone(),
            shipping_cost: order.shipping_cost,
            total_amount: order.total_amount,
            created_at,
            items: persisted_items,
        })
    }

    /// Count orders recorded for a customer email. Used by tests to verify
    /// all-or-nothing persistence.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_email(&self, email: &str) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM orders WHERE customer_email = $1")
                .bind(email)
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }
}

fn constraint_or_database(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && (db_err.is_foreign_key_violation() || db_err.is_check_violation())
    {
        return RepositoryError::Conflict(db_err.to_string());
    }
    RepositoryError::Database(e)
}

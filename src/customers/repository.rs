// Repository for customer operations

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::customers::error::CustomerError;
use crate::customers::models::{CreditDebit, Customer};

/// Repository for customer records and their credit trail
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    /// Create a new CustomerRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a customer, optionally seeding an opening credit balance
    pub async fn create(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        credit_balance: Decimal,
    ) -> Result<Customer, CustomerError> {
        if let Some(email) = email {
            let exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE email = $1)",
            )
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

            if exists.unwrap_or(false) {
                return Err(CustomerError::DuplicateEmail(email.to_string()));
            }
        }

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, credit_balance)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, phone, credit_balance, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(credit_balance)
        .fetch_one(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Find a customer by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<Customer>, CustomerError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, credit_balance, created_at, updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// List all customers, newest first
    pub async fn list(&self) -> Result<Vec<Customer>, CustomerError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, credit_balance, created_at, updated_at
            FROM customers
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Update a customer's contact details, keeping omitted fields
    pub async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Customer, CustomerError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound(id))?;

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $1, email = $2, phone = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING id, name, email, phone, credit_balance, created_at, updated_at
            "#,
        )
        .bind(name.unwrap_or(&existing.name))
        .bind(email.or(existing.email.as_deref()))
        .bind(phone.or(existing.phone.as_deref()))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Add store credit to a customer's balance
    ///
    /// Single atomic increment; returns the updated record.
    pub async fn add_credit(&self, id: i32, amount: Decimal) -> Result<Customer, CustomerError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET credit_balance = credit_balance + $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, email, phone, credit_balance, created_at, updated_at
            "#,
        )
        .bind(amount)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CustomerError::NotFound(id))?;

        Ok(customer)
    }

    /// Debit history for a customer, oldest first
    pub async fn credit_history(&self, id: i32) -> Result<Vec<CreditDebit>, CustomerError> {
        let debits = sqlx::query_as::<_, CreditDebit>(
            r#"
            SELECT id, customer_id, amount, transaction_id, created_at
            FROM credit_debits
            WHERE customer_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(debits)
    }
}

#[cfg(test)]
mod tests {
    // Repository methods run real SQL; they are exercised through the
    // checkout flow against a live database rather than mocked here.
}

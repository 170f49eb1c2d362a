//! Customer directory.

use common::CustomerId;
use store::{Customer, CustomerFields, Store};

use crate::error::{DomainError, Entity};
use crate::validation::{self, FieldErrors, MAX_TEXT_LEN};

/// Customer fields as submitted, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInput {
    pub name: String,
    pub contact_number: String,
    pub email: String,
}

impl CustomerInput {
    pub fn new(
        name: impl Into<String>,
        contact_number: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            contact_number: contact_number.into(),
            email: email.into(),
        }
    }

    /// Validates every field and returns the normalized columns.
    pub fn validate(&self) -> Result<CustomerFields, DomainError> {
        let mut errors = FieldErrors::new();
        let name = validation::required_text(&mut errors, "name", &self.name, MAX_TEXT_LEN);
        let contact_number =
            validation::contact_number(&mut errors, "contact_number", &self.contact_number);
        let email = validation::email(&mut errors, "email", &self.email);

        match (name, contact_number, email) {
            (Some(name), Some(contact_number), Some(email)) if errors.is_empty() => {
                Ok(CustomerFields {
                    name,
                    contact_number,
                    email,
                })
            }
            _ => Err(DomainError::Validation(errors)),
        }
    }
}

/// CRUD over customers. Names are unique.
#[derive(Clone)]
pub struct CustomerDirectory<S: Store> {
    store: S,
}

impl<S: Store> CustomerDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Customer>, DomainError> {
        Ok(self.store.list_customers().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: CustomerId) -> Result<Customer, DomainError> {
        self.store
            .get_customer(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Customer, id))
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: CustomerInput) -> Result<Customer, DomainError> {
        let fields = input.validate()?;
        let customer = self.store.insert_customer(&fields).await?;
        tracing::info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    /// Replaces every field of an existing customer.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: CustomerId,
        input: CustomerInput,
    ) -> Result<Customer, DomainError> {
        let fields = input.validate()?;
        self.store
            .update_customer(id, &fields)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Customer, id))
    }

    /// Deletes a customer. Their orders are kept with no customer.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> Result<(), DomainError> {
        if !self.store.delete_customer(id).await? {
            return Err(DomainError::not_found(Entity::Customer, id));
        }
        tracing::info!(customer_id = %id, "customer deleted");
        Ok(())
    }
}

//! Product catalog.

use common::{ProductId, Weight};
use store::{Product, ProductFields, Store};

use crate::error::{DomainError, Entity};
use crate::validation::{self, FieldErrors, MAX_TEXT_LEN};

/// Lightest weight a product may have.
pub const MIN_PRODUCT_WEIGHT: Weight = Weight::from_hundredths(1);

/// Heaviest weight a product may have.
pub const MAX_PRODUCT_WEIGHT: Weight = Weight::from_kg(25);

/// Product fields as submitted, before validation.
///
/// The weight is kept as text so that malformed or over-precise values are
/// reported against the field instead of failing the whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub weight: String,
}

impl ProductInput {
    pub fn new(name: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: weight.into(),
        }
    }

    /// Validates the fields and returns the columns to store.
    pub fn validate(&self) -> Result<ProductFields, DomainError> {
        let mut errors = FieldErrors::new();
        let name = validation::required_text(&mut errors, "name", &self.name, MAX_TEXT_LEN);

        let weight = match self.weight.trim().parse::<Weight>() {
            Ok(w) if w < MIN_PRODUCT_WEIGHT => {
                errors.add(
                    "weight",
                    format!("Ensure this value is greater than or equal to {MIN_PRODUCT_WEIGHT}."),
                );
                None
            }
            Ok(w) if w > MAX_PRODUCT_WEIGHT => {
                errors.add(
                    "weight",
                    format!("Ensure this value is less than or equal to {MAX_PRODUCT_WEIGHT}."),
                );
                None
            }
            Ok(w) => Some(w),
            Err(e) => {
                errors.add("weight", e.to_string());
                None
            }
        };

        match (name, weight) {
            (Some(name), Some(weight)) => Ok(ProductFields { name, weight }),
            _ => Err(DomainError::Validation(errors)),
        }
    }
}

/// CRUD over products. Names are unique.
#[derive(Clone)]
pub struct ProductCatalog<S: Store> {
    store: S,
}

impl<S: Store> ProductCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Product, id))
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: ProductInput) -> Result<Product, DomainError> {
        let fields = input.validate()?;
        let product = self.store.insert_product(&fields).await?;
        tracing::info!(product_id = %product.id, weight = %product.weight, "product created");
        Ok(product)
    }

    /// Replaces the name and weight of a product.
    ///
    /// Orders that already contain the product are not re-checked against
    /// the weight limit.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: ProductId,
        input: ProductInput,
    ) -> Result<Product, DomainError> {
        let fields = input.validate()?;
        self.store
            .update_product(id, &fields)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Product, id))
    }

    /// Deletes a product and every order item that references it.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), DomainError> {
        if !self.store.delete_product(id).await? {
            return Err(DomainError::not_found(Entity::Product, id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

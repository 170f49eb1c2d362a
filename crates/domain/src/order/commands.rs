//! Commands for the order write path.

use chrono::NaiveDate;
use common::{CustomerId, OrderId, ProductId};
use store::OrderHeader;

use super::number::OrderNumber;
use crate::error::DomainError;
use crate::validation::{self, FieldErrors, MAX_TEXT_LEN};

/// Largest quantity a single line may carry.
pub const MAX_QUANTITY: i64 = i32::MAX as i64;

/// One requested line: a product and how many of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product: ProductId,
    pub quantity: i64,
}

impl LineItem {
    pub fn new(product: ProductId, quantity: i64) -> Self {
        Self {
            product,
            quantity,
        }
    }
}

/// Header fields and the complete item set of an order, as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub customer: Option<CustomerId>,
    pub order_date: NaiveDate,
    pub address: String,
    /// Lines in submission order. Repeated products stay separate lines.
    pub items: Vec<LineItem>,
}

impl OrderDraft {
    /// Creates a draft with no items.
    pub fn new(
        customer: Option<CustomerId>,
        order_date: NaiveDate,
        address: impl Into<String>,
    ) -> Self {
        Self {
            customer,
            order_date,
            address: address.into(),
            items: Vec::new(),
        }
    }

    /// Appends a line.
    pub fn with_item(mut self, product: ProductId, quantity: i64) -> Self {
        self.items.push(LineItem::new(product, quantity));
        self
    }

    fn validate(&self, errors: &mut FieldErrors) -> Option<ValidDraft> {
        let address = validation::required_text(errors, "address", &self.address, MAX_TEXT_LEN);

        if self.items.is_empty() {
            errors.add("order_items", "An order must contain at least one item.");
        }

        let mut lines = Vec::with_capacity(self.items.len());
        for (index, item) in self.items.iter().enumerate() {
            match u32::try_from(item.quantity) {
                Ok(quantity) if quantity >= 1 && i64::from(quantity) <= MAX_QUANTITY => {
                    lines.push((item.product, quantity));
                }
                _ => {
                    let mut line = FieldErrors::new();
                    line.add(
                        "quantity",
                        format!("Ensure this value is between 1 and {MAX_QUANTITY}."),
                    );
                    errors.merge_nested(&format!("order_items[{index}]"), line);
                }
            }
        }

        let header = OrderHeader {
            customer: self.customer,
            order_date: self.order_date,
            address: address?,
        };
        (lines.len() == self.items.len() && !lines.is_empty())
            .then_some(ValidDraft { header, lines })
    }
}

/// A draft that passed validation.
#[derive(Debug, Clone)]
pub(crate) struct ValidDraft {
    pub header: OrderHeader,
    pub lines: Vec<(ProductId, u32)>,
}

/// Command to create an order with its initial items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    /// Caller-chosen order number. Allocated when absent.
    pub order_number: Option<String>,
    pub draft: OrderDraft,
}

impl CreateOrder {
    pub fn new(draft: OrderDraft) -> Self {
        Self {
            order_number: None,
            draft,
        }
    }

    /// Uses the given order number instead of allocating one.
    pub fn with_order_number(mut self, order_number: impl Into<String>) -> Self {
        self.order_number = Some(order_number.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(Option<OrderNumber>, ValidDraft), DomainError> {
        let mut errors = FieldErrors::new();

        let order_number = match self.order_number.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match OrderNumber::parse(raw) {
                Ok(number) => Some(number),
                Err(e) => {
                    errors.add("order_number", e.to_string());
                    None
                }
            },
        };

        let draft = self.draft.validate(&mut errors);
        errors.into_result()?;
        match draft {
            Some(draft) => Ok((order_number, draft)),
            None => Err(DomainError::invalid("order_items", "Invalid order items.")),
        }
    }
}

/// Command to replace an order's header and its whole item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOrder {
    pub order_id: OrderId,
    pub draft: OrderDraft,
}

impl ReplaceOrder {
    pub fn new(order_id: OrderId, draft: OrderDraft) -> Self {
        Self {
            order_id,
            draft,
        }
    }

    pub(crate) fn validate(&self) -> Result<ValidDraft, DomainError> {
        let mut errors = FieldErrors::new();
        let draft = self.draft.validate(&mut errors);
        errors.into_result()?;
        draft.ok_or_else(|| DomainError::invalid("order_items", "Invalid order items."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn one_line() -> OrderDraft {
        OrderDraft::new(None, date(), "Somewhere").with_item(ProductId::new(1), 1)
    }

    fn field_errors(err: DomainError) -> FieldErrors {
        match err {
            DomainError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_create_keeps_line_order_and_duplicates() {
        let cmd = CreateOrder::new(
            OrderDraft::new(None, date(), " 12 Market Street ")
                .with_item(ProductId::new(2), 1)
                .with_item(ProductId::new(1), 4)
                .with_item(ProductId::new(2), 3),
        );

        let (number, draft) = cmd.validate().unwrap();
        assert_eq!(number, None);
        assert_eq!(draft.header.address, "12 Market Street");
        assert_eq!(
            draft.lines,
            vec![
                (ProductId::new(2), 1),
                (ProductId::new(1), 4),
                (ProductId::new(2), 3)
            ]
        );
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let cmd = CreateOrder::new(OrderDraft::new(None, date(), "Somewhere"));
        let errors = field_errors(cmd.validate().unwrap_err());
        assert!(errors.get("order_items").is_some());

        let cmd = ReplaceOrder::new(
            OrderId::new(1),
            OrderDraft::new(None, date(), "Somewhere"),
        );
        let errors = field_errors(cmd.validate().unwrap_err());
        assert!(errors.get("order_items").is_some());
    }

    #[test]
    fn bad_quantities_are_reported_per_line() {
        let cmd = CreateOrder::new(
            OrderDraft::new(None, date(), "Somewhere")
                .with_item(ProductId::new(1), 1)
                .with_item(ProductId::new(1), 0)
                .with_item(ProductId::new(1), MAX_QUANTITY + 1),
        );
        let errors = field_errors(cmd.validate().unwrap_err());
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["order_items[1].quantity", "order_items[2].quantity"]
        );
    }

    #[test]
    fn supplied_order_number_is_parsed() {
        let cmd = CreateOrder::new(one_line()).with_order_number("ORD00010");
        let (number, _) = cmd.validate().unwrap();
        assert_eq!(number, Some(OrderNumber::from_sequence(10)));

        let cmd = CreateOrder::new(one_line()).with_order_number("10");
        let errors = field_errors(cmd.validate().unwrap_err());
        assert!(errors.get("order_number").is_some());
    }

    #[test]
    fn blank_order_number_means_allocate() {
        let cmd = CreateOrder::new(one_line()).with_order_number("  ");
        let (number, _) = cmd.validate().unwrap();
        assert_eq!(number, None);
    }

    #[test]
    fn blank_address_and_missing_items_are_reported_together() {
        let cmd = CreateOrder::new(OrderDraft::new(None, date(), ""));
        let errors = field_errors(cmd.validate().unwrap_err());
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["address", "order_items"]
        );
    }
}

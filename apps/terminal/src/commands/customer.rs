//! # Customer Commands
//!
//! Every sale belongs to a customer, so a customer with sales can't be
//! deleted. The foreign key on `sales.customer_id` enforces this.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ErrorCode};
use crate::state::DbState;
use tally_core::validation::validate_customer_draft;
use tally_core::{Customer, CustomerDraft};
use tally_db::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
}

impl From<Customer> for CustomerDto {
    fn from(c: Customer) -> Self {
        CustomerDto {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Input for create and edit. Blank email / phone are stored as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CustomerInput {
    fn into_draft(self) -> CustomerDraft {
        let blank_to_none = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        CustomerDraft {
            name: self.name.trim().to_string(),
            email: blank_to_none(self.email),
            phone: blank_to_none(self.phone),
        }
    }
}

pub async fn list_customers(db: &DbState, limit: u32) -> Result<Vec<CustomerDto>, ApiError> {
    debug!(limit, "list_customers command");
    let customers = db.inner().customers().list(limit).await?;
    Ok(customers.into_iter().map(CustomerDto::from).collect())
}

pub async fn get_customer(db: &DbState, id: &str) -> Result<CustomerDto, ApiError> {
    debug!(id = %id, "get_customer command");
    db.inner()
        .customers()
        .get_by_id(id)
        .await?
        .map(CustomerDto::from)
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

pub async fn create_customer(db: &DbState, input: CustomerInput) -> Result<CustomerDto, ApiError> {
    let draft = input.into_draft();
    debug!(name = %draft.name, "create_customer command");

    validate_customer_draft(&draft).map_err(|e| ApiError::validation(e.to_string()))?;

    let customer = db.inner().customers().insert(&draft).await?;
    info!(id = %customer.id, "Customer created");
    Ok(CustomerDto::from(customer))
}

pub async fn update_customer(
    db: &DbState,
    id: &str,
    input: CustomerInput,
) -> Result<CustomerDto, ApiError> {
    let draft = input.into_draft();
    debug!(id = %id, "update_customer command");

    validate_customer_draft(&draft).map_err(|e| ApiError::validation(e.to_string()))?;

    let customer = db.inner().customers().update(id, &draft).await?;
    info!(id = %customer.id, "Customer updated");
    Ok(CustomerDto::from(customer))
}

/// Deletes a customer that has no sales.
///
/// ## Errors
/// * `CONFLICT` - the customer has sales; delete those first
/// * `NOT_FOUND` - no such customer
pub async fn delete_customer(db: &DbState, id: &str) -> Result<(), ApiError> {
    debug!(id = %id, "delete_customer command");

    match db.inner().customers().delete(id).await {
        Ok(()) => {
            info!(id = %id, "Customer deleted");
            Ok(())
        }
        Err(DbError::ForeignKeyViolation { .. }) => Err(ApiError::new(
            ErrorCode::Conflict,
            "Customer has sales and cannot be deleted",
        )),
        Err(e) => Err(e.into()),
    }
}

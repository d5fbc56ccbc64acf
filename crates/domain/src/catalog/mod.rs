//! Persons and items: the collaborators an order refers to.

mod item;
mod person;

pub use item::ItemService;
pub use person::PersonService;

use crate::error::DomainError;

const MAX_NAME_LEN: usize = 100;

fn require_text(field: &str, value: &str, max_len: usize) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidArgument(format!("{field} is required")));
    }
    limit_text(field, value, max_len)
}

fn limit_text(field: &str, value: &str, max_len: usize) -> Result<(), DomainError> {
    if value.chars().count() > max_len {
        return Err(DomainError::InvalidArgument(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

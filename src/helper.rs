use std::env;

use crate::prelude::{AppError, Contact};
use uuid::Uuid;

pub const LOCATION_PREFIX: &str = "contacts";

/// Reads `key` from the environment, treating an empty value as unset.
pub fn get_env_value_by_key(key: &str) -> Result<String, AppError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::NotFound(format!("{} in env", key))),
    }
}

/// Fresh location for a contact the caller did not place explicitly.
pub fn generate_location() -> String {
    format!("{}/{}.json", LOCATION_PREFIX, Uuid::new_v4())
}

pub fn display_contact(contact: &Contact) -> String {
    format!(
        "Name: {}\n\
        Phone: {}\n\
        Email: {}\n\
        Address: {}",
        contact.name, contact.phone, contact.email, contact.address
    )
}

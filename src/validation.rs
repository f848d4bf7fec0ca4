use crate::prelude::{AppError, Contact};

pub const NAME_REQUIRED: &str = "Name is required";
pub const PHONE_REQUIRED: &str = "Phone is required";

pub fn validate_contact(contact: &Contact) -> Result<(), AppError> {
    // Name is checked first so its message wins when both are empty.
    // Email and address accept anything, including empty strings.
    if contact.name.is_empty() {
        return Err(AppError::Validation(NAME_REQUIRED.to_string()));
    }
    if contact.phone.is_empty() {
        return Err(AppError::Validation(PHONE_REQUIRED.to_string()));
    }
    Ok(())
}

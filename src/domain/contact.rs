use crate::prelude::{AppError, Record};
use serde::Serialize;
use serde_json::Value;

pub const NAME_KEY: &str = "name";
pub const PHONE_KEY: &str = "phone";
pub const EMAIL_KEY: &str = "email";
pub const ADDRESS_KEY: &str = "address";

/// A phonebook entry. It carries no identity of its own: the location it is
/// stored under identifies it.
#[derive(Debug, Default, Serialize, PartialEq, Eq, Clone)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl Contact {
    pub fn new(name: String, phone: String, email: String, address: String) -> Self {
        Contact {
            name,
            phone,
            email,
            address,
        }
    }

    /// Flattens the contact into the untyped shape the storage backends hold.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(NAME_KEY.to_string(), Value::String(self.name.clone()));
        record.insert(PHONE_KEY.to_string(), Value::String(self.phone.clone()));
        record.insert(EMAIL_KEY.to_string(), Value::String(self.email.clone()));
        record.insert(ADDRESS_KEY.to_string(), Value::String(self.address.clone()));
        record
    }

    /// Rebuilds a contact from a stored record. Unknown keys are ignored;
    /// a missing or non-string contact field is reported as
    /// [`AppError::CorruptRecord`].
    pub fn from_record(record: &Record) -> Result<Self, AppError> {
        Ok(Contact {
            name: string_field(record, NAME_KEY)?,
            phone: string_field(record, PHONE_KEY)?,
            email: string_field(record, EMAIL_KEY)?,
            address: string_field(record, ADDRESS_KEY)?,
        })
    }
}

fn string_field(record: &Record, key: &str) -> Result<String, AppError> {
    match record.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(AppError::CorruptRecord(format!(
            "field '{}' holds {} instead of a string",
            key,
            type_name(other)
        ))),
        None => Err(AppError::CorruptRecord(format!("field '{}' is missing", key))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

use crate::prelude::{AppError, Contact, RecordStore};
use crate::validation;
use tracing::{info, warn};

/// Validates contacts, maps them to records and hands persistence to the
/// injected storage backend.
pub struct PhonebookService {
    pub storage: Box<dyn RecordStore>,
}

impl PhonebookService {
    pub fn new(storage: Box<dyn RecordStore>) -> Self {
        Self { storage }
    }

    pub fn medium(&self) -> &str {
        self.storage.get_medium()
    }

    pub fn add_contact(&self, location: &str, contact: &Contact) -> Result<(), AppError> {
        if let Err(e) = self.validate_contact(contact) {
            warn!(location, error = %e, "add rejected");
            return Err(e);
        }

        self.storage.create(location, contact.to_record())?;
        info!(location, medium = self.medium(), "contact added");
        Ok(())
    }

    pub fn get_contact(&self, location: &str) -> Result<Contact, AppError> {
        let record = self.storage.read(location)?;

        Contact::from_record(&record).inspect_err(|e| {
            warn!(location, error = %e, "stored record is not a contact");
        })
    }

    pub fn update_contact(&self, location: &str, contact: &Contact) -> Result<(), AppError> {
        if let Err(e) = self.validate_contact(contact) {
            warn!(location, error = %e, "update rejected");
            return Err(e);
        }

        self.storage.update(location, contact.to_record())?;
        info!(location, medium = self.medium(), "contact updated");
        Ok(())
    }

    pub fn delete_contact(&self, location: &str) -> Result<(), AppError> {
        self.storage.delete(location)?;
        info!(location, medium = self.medium(), "contact deleted");
        Ok(())
    }

    pub fn validate_contact(&self, contact: &Contact) -> Result<(), AppError> {
        validation::validate_contact(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{MemoryStorage, Record};
    use std::sync::{Arc, Mutex};

    /// Records every call so tests can assert the backend was (not) touched.
    #[derive(Default)]
    struct SpyStorage {
        calls: Mutex<Vec<String>>,
        inner: MemoryStorage,
    }

    impl SpyStorage {
        fn log(&self, call: &str) -> Result<(), AppError> {
            self.calls.lock()?.push(call.to_string());
            Ok(())
        }
    }

    impl RecordStore for SpyStorage {
        fn create(&self, location: &str, record: Record) -> Result<(), AppError> {
            self.log("create")?;
            self.inner.create(location, record)
        }

        fn read(&self, location: &str) -> Result<Record, AppError> {
            self.log("read")?;
            self.inner.read(location)
        }

        fn update(&self, location: &str, record: Record) -> Result<(), AppError> {
            self.log("update")?;
            self.inner.update(location, record)
        }

        fn delete(&self, location: &str) -> Result<(), AppError> {
            self.log("delete")?;
            self.inner.delete(location)
        }

        fn get_medium(&self) -> &str {
            "spy"
        }
    }

    fn john() -> Contact {
        Contact::new(
            "John Doe".to_string(),
            "123-456-7890".to_string(),
            "johndoe@example.com".to_string(),
            "Bukoto".to_string(),
        )
    }

    #[test]
    fn invalid_contact_never_reaches_storage() {
        let spy = Arc::new(SpyStorage::default());
        let service = PhonebookService::new(Box::new(Arc::clone(&spy)));

        let nameless = Contact {
            name: String::new(),
            ..john()
        };
        let res = service.add_contact("contacts/johndoe.json", &nameless);
        assert_eq!(
            res.err().map(|e| e.to_string()).as_deref(),
            Some("Name is required")
        );

        let phoneless = Contact {
            phone: String::new(),
            ..john()
        };
        let res = service.update_contact("contacts/johndoe.json", &phoneless);
        assert_eq!(
            res.err().map(|e| e.to_string()).as_deref(),
            Some("Phone is required")
        );

        assert!(spy.calls.lock().map(|c| c.is_empty()).unwrap_or(false));
    }

    #[test]
    fn delete_is_pure_delegation() {
        let spy = Arc::new(SpyStorage::default());
        let service = PhonebookService::new(Box::new(Arc::clone(&spy)));

        assert!(matches!(
            service.delete_contact("nobody.json"),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(
            spy.calls.lock().map(|c| c.clone()).unwrap_or_default(),
            vec!["delete".to_string()]
        );
    }

    #[test]
    fn add_then_get_round_trips_the_contact() -> Result<(), AppError> {
        let service = PhonebookService::new(Box::new(MemoryStorage::new()));

        service.add_contact("contacts/johndoe.json", &john())?;

        assert_eq!(service.get_contact("contacts/johndoe.json")?, john());
        assert_eq!(service.medium(), "memory");
        Ok(())
    }
}

pub mod contact;
pub mod service;

pub use contact::Contact;
pub use service::PhonebookService;

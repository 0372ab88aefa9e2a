mod credentials_model;
mod credentials_service;
mod credentials_traits;

pub use credentials_model::{Broker, CredentialRecord, PlainCredentials};
pub use credentials_service::CredentialService;
pub use credentials_traits::CredentialRepositoryTrait;

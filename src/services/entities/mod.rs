pub mod remote;
pub mod service;

pub use remote::RemoteEntityService;
pub use service::{EntityCapability, EntityService, Params};

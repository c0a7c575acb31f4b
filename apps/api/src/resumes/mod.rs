// Owner-scoped resume documents.
// Business rules live in `service`; `handlers` only maps HTTP onto it.

pub mod handlers;
pub mod service;

pub use service::ResumeService;

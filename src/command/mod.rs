//! Command template documents: schema, action logic, and the on-disk store.

pub mod logic;
pub mod schema;
pub mod store;

pub use logic::{Action, Behaviour, Logic, StructuredLogic};
pub use schema::{ArgSpec, CommandTemplate, FilePathGroup, Node};
pub use store::TemplateStore;

pub mod mutation;
pub mod query;

pub use mutation::EventMutationService;
pub use query::EventQueryEngine;

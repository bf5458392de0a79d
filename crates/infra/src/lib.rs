//! Infrastructure layer: CRT storage adapters and the aggregation resolver.

pub mod resolver;
pub mod store;

pub use resolver::{CrtResolver, LIST_WINDOW, ResolveError};
pub use store::{
    CrtStore, InMemoryCrtStore, PostgresCrtStore, SchemaRevision, StoreError,
};

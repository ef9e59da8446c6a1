//! Infrastructure layer: repositories over Postgres or process memory.

pub mod store;

pub use store::{
    ContentRepository, DepartmentRepository, EventRepository, InMemoryStore, PostgresStore, ReceiptRepository,
    SharedStore, Store, StoreError, StoreResult, UserRepository,
};

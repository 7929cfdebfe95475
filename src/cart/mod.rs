//! Allocation cart: data model, normalization engine, store and persistence

pub mod normalize;
pub mod persistence;
pub mod store;
pub mod types;

pub use normalize::NormalizationRules;
pub use persistence::{CartPersistence, JsonFilePersistence, MemoryPersistence};
pub use store::AllocationStore;
pub use types::{AllocationItem, AllocationSet, CartError};

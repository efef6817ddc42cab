// Lakelet Kernel
//
// Versioned tablet metadata and transaction-log core for a
// storage-compute separated table engine. Data and metadata live in a
// remote object store as immutable, versioned artifacts; correctness
// rests on the store's atomic create-or-fail put, not on locks.

pub mod apply;
pub mod error;
pub mod location;
pub mod metadata;
pub mod store;
pub mod tablet;
pub mod txn;
pub mod writer;

pub use error::{MetaError, Result};

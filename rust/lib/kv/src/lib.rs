pub mod batch;
pub mod error;
pub mod redb;
pub mod selector;
pub mod traits;

pub use batch::WriteBatch;
pub use error::KVError;
pub use redb::RedbStore;
pub use selector::Selector;
pub use traits::KVStore;

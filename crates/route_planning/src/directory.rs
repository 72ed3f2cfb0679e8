use std::error;

use async_trait::async_trait;
use model::supplier::Supplier;
use utility::id::Id;

pub type DirectoryResult<T> = Result<T, Box<dyn error::Error + Send + Sync>>;

/// Read access to the supplier records owned by the rest of the platform.
#[async_trait]
pub trait SupplierDirectory: Send + Sync {
    async fn supplier(&self, id: &Id<Supplier>) -> DirectoryResult<Option<Supplier>>;
}

use crate::resource::ValidationError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Resource {id} not found")]
    NotFound { id: String },

    #[error("It was not possible to create a resource {id} that already exists")]
    Conflict { id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

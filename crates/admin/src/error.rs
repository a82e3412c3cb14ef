//! Mapping repository failures onto the catalog error taxonomy.

use olivo_market_core::CatalogError;
use tracing::error;

use crate::db::RepositoryError;

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::NotFound => Self::NotFound("record".to_owned()),
            RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                // Details stay in the log; callers only see that the backend failed.
                error!(error = %err, "Catalog repository error");
                Self::Backend("catalog storage failed".to_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_kept_distinct() {
        assert_eq!(
            CatalogError::from(RepositoryError::Conflict("slug taken".into())),
            CatalogError::Conflict("slug taken".into())
        );
        assert!(matches!(
            CatalogError::from(RepositoryError::DataCorruption("bad price".into())),
            CatalogError::Backend(_)
        ));
    }
}

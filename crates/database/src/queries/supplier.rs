use model::supplier::Supplier;
use sqlx::{Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};

use super::convert_error;
use crate::data_model::{supplier::SupplierRow, DatabaseRow};
use crate::Result;

/// SQLSTATE `undefined_column`.
const UNDEFINED_COLUMN: &str = "42703";

const WITH_COORDINATES: &str = "
    SELECT id::text AS id, name, location,
           latitude::float8 AS latitude, longitude::float8 AS longitude
    FROM suppliers
    WHERE id::text = $1;
";

const WITHOUT_COORDINATES: &str = "
    SELECT id::text AS id, name, location,
           NULL::float8 AS latitude, NULL::float8 AS longitude
    FROM suppliers
    WHERE id::text = $1;
";

/// Reads one supplier. Falls back to the address alone on databases whose
/// `suppliers` table was never given coordinate columns.
pub async fn get<'c, E>(executor: E, id: &Id<Supplier>) -> Result<Option<Supplier>>
where
    E: Executor<'c, Database = Postgres> + Copy,
{
    match fetch(executor, WITH_COORDINATES, id).await {
        Err(why) if is_undefined_column(&why) => {
            log::warn!("suppliers table has no coordinate columns, reading addresses only");
            fetch(executor, WITHOUT_COORDINATES, id).await
        }
        other => other,
    }
    .map_err(convert_error)?
    .let_owned(|row: Option<SupplierRow>| Ok(row.map(DatabaseRow::to_model)))
}

async fn fetch<'c, E>(
    executor: E,
    query: &'static str,
    id: &Id<Supplier>,
) -> sqlx::Result<Option<SupplierRow>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(query)
        .bind(id.raw())
        .fetch_optional(executor)
        .await
}

fn is_undefined_column(why: &sqlx::Error) -> bool {
    match why {
        sqlx::Error::Database(e) => e.code().as_deref() == Some(UNDEFINED_COLUMN),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, error, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct StateError(&'static str);

    impl fmt::Display for StateError {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "database error {}", self.0)
        }
    }

    impl error::Error for StateError {}

    impl DatabaseError for StateError {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn missing_coordinate_columns_are_recognized() {
        let why = sqlx::Error::Database(Box::new(StateError("42703")));
        assert!(is_undefined_column(&why));
    }

    #[test]
    fn other_failures_are_not_retried() {
        let missing_table = sqlx::Error::Database(Box::new(StateError("42P01")));
        assert!(!is_undefined_column(&missing_table));
        assert!(!is_undefined_column(&sqlx::Error::RowNotFound));
    }
}

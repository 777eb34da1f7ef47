//! Shared Diesel error mapping for the marketplace repositories.
//!
//! Every driven port error has `Connection` and `Query` variants, so the
//! helpers take the two constructors and stay generic over the port.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel errors into query or connection errors.
///
/// A closed connection is the only failure reported as a connection error;
/// everything else, including constraint violations, is a query error.
pub(crate) fn map_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: FnOnce(&'static str) -> E,
    C: FnOnce(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            query("unique constraint violated")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            query("referenced record missing")
        }
        _ => query("database error"),
    }
}

/// Cast a domain revision to the `INTEGER` column type.
pub(crate) fn revision_to_db(revision: u32) -> i32 {
    i32::try_from(revision).unwrap_or(i32::MAX)
}

/// Cast a stored revision back to the domain type.
pub(crate) fn revision_from_db(revision: i32) -> u32 {
    u32::try_from(revision).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(&'static str),
        Connection(&'static str),
    }

    struct Info;

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "boom"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            None
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn map(error: DieselError) -> Mapped {
        map_diesel_error(error, Mapped::Query, Mapped::Connection)
    }

    #[rstest]
    #[case(DatabaseErrorKind::ClosedConnection, Mapped::Connection("database connection error"))]
    #[case(DatabaseErrorKind::UniqueViolation, Mapped::Query("unique constraint violated"))]
    #[case(DatabaseErrorKind::ForeignKeyViolation, Mapped::Query("referenced record missing"))]
    fn maps_database_error_kinds(#[case] kind: DatabaseErrorKind, #[case] expected: Mapped) {
        assert_eq!(map(DieselError::DatabaseError(kind, Box::new(Info))), expected);
    }

    #[rstest]
    fn not_found_is_a_query_error() {
        assert_eq!(map(DieselError::NotFound), Mapped::Query("record not found"));
    }

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let mapped: String = map_pool_error(PoolError::checkout("timed out"), |message| message);
        assert_eq!(mapped, "timed out");
    }

    #[rstest]
    #[case(0, 0)]
    #[case(7, 7)]
    #[case(-3, 0)]
    fn stored_revisions_never_go_negative(#[case] stored: i32, #[case] expected: u32) {
        assert_eq!(revision_from_db(stored), expected);
    }
}

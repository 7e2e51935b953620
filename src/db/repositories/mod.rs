use sea_orm::{DbErr, SqlErr};

pub mod contact;
pub mod token;
pub mod user;

/// True when the underlying database error is a UNIQUE constraint violation.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)))
}

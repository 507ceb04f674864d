use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{Role, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, recovery_code, \
                            recovery_code_expires_at, created_at, updated_at";

impl User {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password; role defaults to VISITOR.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Partial update; absent fields keep their stored value.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
        role: Option<Role>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 password_hash = COALESCE($4, password_hash),
                 role = COALESCE($5, role),
                 updated_at = now()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn email_taken_by_other(
        db: &PgPool,
        email: &str,
        id: Uuid,
    ) -> anyhow::Result<bool> {
        let taken: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id <> $2")
                .bind(email)
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(taken.is_some())
    }

    pub async fn set_recovery_code(
        db: &PgPool,
        id: Uuid,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users
             SET recovery_code = $2, recovery_code_expires_at = $3, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Single conditional write: the new hash lands and the code is cleared
    /// only if email, code, and unexpired expiry all match. Returns whether a
    /// row was updated; a reused or expired code updates nothing.
    pub async fn reset_password_with_code(
        db: &PgPool,
        email: &str,
        code: &str,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE users
             SET password_hash = $3,
                 recovery_code = NULL,
                 recovery_code_expires_at = NULL,
                 updated_at = now()
             WHERE email = $1
               AND recovery_code = $2
               AND recovery_code_expires_at IS NOT NULL
               AND recovery_code_expires_at > now()",
        )
        .bind(email)
        .bind(code)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

/// A concurrent insert can slip past the handler's duplicate pre-check; the
/// unique index on email reports it as this violation.
pub fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|d| d.is_unique_violation())
        .unwrap_or(false)
}

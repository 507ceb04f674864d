use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Coarse authorization tier carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Visitor,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 hash, never exposed in JSON
    pub role: Role,
    #[serde(skip_serializing)]
    pub recovery_code: Option<String>,
    #[serde(skip_serializing)]
    pub recovery_code_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_json_never_carries_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            role: Role::Visitor,
            recovery_code: Some("A1B2C3".into()),
            recovery_code_expires_at: Some(OffsetDateTime::now_utc()),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("argon2"));
        assert!(!json.contains("A1B2C3"));
        assert!(json.contains("ana@example.com"));
        assert!(json.contains("VISITOR"));
    }
}

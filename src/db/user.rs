//! Account model for filedrop.

/// Registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Account creation timestamp.
    pub created_at: String,
    /// Last login timestamp (optional).
    pub last_login: Option<String>,
}

impl User {
    /// Owner key used to scope artifact listings.
    pub fn owner_key(&self) -> String {
        format!("user:{}", self.id)
    }
}

/// Data for creating a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
}

impl NewUser {
    /// Create a new account request.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_key() {
        let user = User {
            id: 42,
            username: "alice".to_string(),
            password: "hash".to_string(),
            created_at: "2024-01-01 00:00:00".to_string(),
            last_login: None,
        };
        assert_eq!(user.owner_key(), "user:42");
    }

    #[test]
    fn test_new_user() {
        let new_user = NewUser::new("alice", "hash");
        assert_eq!(new_user.username, "alice");
        assert_eq!(new_user.password, "hash");
    }
}

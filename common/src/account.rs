use serde::{Deserialize, Serialize};

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_id: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email_id.is_empty() || self.password.is_empty() {
            return Err("Please enter both email and password");
        }
        Ok(())
    }
}

/// Body of `POST /signup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub password: String,
}

impl SignupRequest {
    /// Client-side checks run before the request is sent.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.first_name.is_empty()
            || self.last_name.is_empty()
            || self.email_id.is_empty()
            || self.password.is_empty()
        {
            return Err("Please fill in all fields");
        }
        let len = self.first_name.chars().count();
        if !(4..=50).contains(&len) {
            return Err("First name should be 4 to 50 characters");
        }
        Ok(())
    }
}

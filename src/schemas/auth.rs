use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Admin;

#[derive(Debug, Deserialize)]
pub(crate) struct AdminLogin {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl AdminResponse {
    pub(crate) fn from_db(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            is_active: admin.is_active,
            created_at: format_primitive(admin.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) admin: AdminResponse,
}

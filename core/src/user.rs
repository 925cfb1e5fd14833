use crate::entity::{require_name, Draft, Entity};
use crate::error::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Admin,
    Operator,
    Viewer,
}

impl Default for Role {
    fn default() -> Self {
        Role::Operator
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl Entity for User {
    type Patch = UserPatch;

    const KIND: &'static str = "user";

    fn id(&self) -> i32 {
        self.id
    }

    fn apply(&mut self, patch: UserPatch) {
        crate::merge_patch!(self, patch, name, email, role);
    }
}

impl Draft for NewUser {
    type Entity = User;

    fn validate(&self) -> Result<(), ModelError> {
        require_name(&self.name)?;
        if !self.email.contains('@') {
            return Err(ModelError::InvalidValue("email", self.email.clone()));
        }
        Ok(())
    }

    fn build(self, id: i32, now: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            role: self.role,
            created_at: now,
        }
    }
}

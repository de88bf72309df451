//! Registration, login and account lookup.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use studio_shared::constants::{MIN_NAME_LEN, MIN_PASSWORD_LEN};
use studio_shared::error::DomainResult;
use studio_shared::models::{Account, AccountSummary};
use studio_shared::repository::Repositories;
use studio_shared::{AccountId, Actor, DomainError, RepositoryError, Role};
use tracing::info;

use crate::auth::{hash_password, verify_password, JwtService};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: AccountSummary,
}

#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn Repositories>,
    jwt: Arc<JwtService>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn Repositories>, jwt: Arc<JwtService>) -> Self {
        Self { repo, jwt }
    }

    /// Self-service sign-up. Admin accounts cannot be created this way.
    pub fn register(&self, input: Registration) -> DomainResult<Session> {
        let role = input.role.unwrap_or(Role::Client);
        if role == Role::Admin {
            return Err(DomainError::validation("Invalid role"));
        }
        let account = self.insert(input, role)?;
        self.session(&account)
    }

    pub fn create_manual(&self, actor: &Actor, input: Registration) -> DomainResult<AccountSummary> {
        if !actor.is_admin() {
            return Err(DomainError::forbidden("Admin access required"));
        }
        let role = input.role.unwrap_or(Role::Client);
        let account = self.insert(input, role)?;
        Ok(AccountSummary::from(&account))
    }

    pub fn login(&self, input: Credentials) -> DomainResult<Session> {
        let invalid = || DomainError::validation("Invalid credentials");
        let account = self
            .repo
            .find_account_by_email(input.email.trim())?
            .ok_or_else(invalid)?;
        if !verify_password(&input.password, &account.password_hash) {
            return Err(invalid());
        }
        info!(account = %account.id, "Login");
        self.session(&account)
    }

    pub fn me(&self, actor: &Actor) -> DomainResult<AccountSummary> {
        self.repo
            .get_account(actor.id)?
            .map(|a| AccountSummary::from(&a))
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    fn insert(&self, input: Registration, role: Role) -> DomainResult<Account> {
        let name = input.name.trim();
        let email = input.email.trim().to_lowercase();
        if name.chars().count() < MIN_NAME_LEN {
            return Err(DomainError::validation(format!(
                "Name must be at least {MIN_NAME_LEN} characters"
            )));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("Invalid email address"));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let exists = || DomainError::validation("User already exists");
        if self.repo.find_account_by_email(&email)?.is_some() {
            return Err(exists());
        }

        let account = Account {
            id: AccountId::new(),
            name: name.to_string(),
            email,
            password_hash: hash_password(&input.password)?,
            role,
            avatar: None,
            created_at: Utc::now(),
        };
        match self.repo.create_account(&account) {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => return Err(exists()),
            Err(e) => return Err(e.into()),
        }
        info!(account = %account.id, role = %role, "Account created");
        Ok(account)
    }

    fn session(&self, account: &Account) -> DomainResult<Session> {
        let token = self.jwt.issue(&Actor::new(account.id, account.role))?;
        Ok(Session {
            token,
            user: AccountSummary::from(account),
        })
    }
}

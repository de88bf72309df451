//! CRUD operations for [`Account`] records.

use rusqlite::params;
use studio_shared::models::Account;
use studio_shared::{AccountId, Role};

use crate::database::{format_ts, not_found, parse_label, parse_ts, parse_uuid, Database};
use crate::error::Result;

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, role, avatar, created_at";

impl Database {
    /// Insert a new account. The email column is unique.
    pub fn create_account(&self, account: &Account) -> Result<()> {
        self.conn().execute(
            "INSERT INTO accounts (id, name, email, password_hash, role, avatar, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                account.id.to_string(),
                account.name,
                account.email.to_lowercase(),
                account.password_hash,
                account.role.as_str(),
                account.avatar,
                format_ts(&account.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_account(&self, id: AccountId) -> Result<Account> {
        self.conn()
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                params![id.to_string()],
                row_to_account,
            )
            .map_err(not_found)
    }

    /// Look an account up by email, case-insensitively.
    pub fn get_account_by_email(&self, email: &str) -> Result<Account> {
        self.conn()
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
                params![email.to_lowercase()],
                row_to_account,
            )
            .map_err(not_found)
    }

    /// List accounts, newest first, optionally restricted to one role.
    pub fn list_accounts(&self, role: Option<Role>) -> Result<Vec<Account>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts
             WHERE ?1 IS NULL OR role = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map(params![role.map(|r| r.as_str())], row_to_account)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(4)?;
    let created_str: String = row.get(6)?;

    Ok(Account {
        id: AccountId(parse_uuid(0, &id_str)?),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: parse_label(4, &role_str)?,
        avatar: row.get(5)?,
        created_at: parse_ts(6, &created_str)?,
    })
}

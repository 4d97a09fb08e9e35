//! Roles are named categories assigned to accounts, e.g. "Admin".

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Alias for the integer type used for role IDs.
pub type RoleId = i64;

/// The name of the role given to accounts created with the admin utility.
pub const ADMIN_ROLE: &str = "Admin";

/// A named category that can be assigned to accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// The ID of the role.
    pub id: RoleId,
    /// The unique name of the role.
    pub name: String,
}

/// Create the role table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_role_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS role (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Create a role called `name`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidField] if `name` is empty,
/// - or [Error::SqlError] if the name is already taken or there is some other SQL error.
pub fn create_role(name: &str, connection: &Connection) -> Result<Role, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_field("name", "role name cannot be empty"));
    }

    let role = connection
        .prepare("INSERT INTO role (name) VALUES (?1) RETURNING id, name")?
        .query_row((name,), map_role_row)?;

    Ok(role)
}

/// Get the role called `name`, creating it first if it does not exist.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn get_or_create_role(name: &str, connection: &Connection) -> Result<Role, Error> {
    connection.execute("INSERT OR IGNORE INTO role (name) VALUES (?1)", (name,))?;

    let role = connection
        .prepare("SELECT id, name FROM role WHERE name = :name")?
        .query_row(&[(":name", &name)], map_role_row)?;

    Ok(role)
}

/// Retrieve a role by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid role,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_role(id: RoleId, connection: &Connection) -> Result<Role, Error> {
    let role = connection
        .prepare("SELECT id, name FROM role WHERE id = :id")?
        .query_row(&[(":id", &id)], map_role_row)?;

    Ok(role)
}

/// Delete the role with `id`.
///
/// Accounts that had the role keep existing with no role.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid role,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_role(id: RoleId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM role WHERE id = ?1", (id,))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_role_row(row: &Row) -> Result<Role, rusqlite::Error> {
    Ok(Role {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

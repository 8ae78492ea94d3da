//! Common type definitions.
//!
//! Identifiers are the SQLite rowids assigned by the store, wrapped in type aliases so signatures
//! say which table they point into:
//!
//! - [`AccountId`]: account identifier (`accounts.id`, also `account_passwords.of_account_id`)
//! - [`RoleId`]: role identifier (`account_role.id`)

pub type AccountId = i64;
pub type RoleId = i64;

/// Mask all but the first and last character of a username for log fields.
/// Example: "alice" -> "a***e"
pub fn mask_username(username: &str) -> String {
    let chars: Vec<char> = username.chars().collect();
    match chars.len() {
        0 => String::new(),
        1 | 2 => "*".repeat(chars.len()),
        n => format!("{}{}{}", chars[0], "*".repeat(n - 2), chars[n - 1]),
    }
}

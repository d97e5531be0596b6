//! Process-unique tokens for naming window classes

use uuid::Uuid;

/// Prefix shared by every window class this crate registers
pub const CLASS_PREFIX: &str = "native-window";

/// Produce a unique printable token
pub fn generate() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Build a class name of the form `"<prefix>-<token>"`
pub fn class_name(prefix: &str) -> String {
    format!("{}-{}", prefix, generate())
}

//! Contact allow-list entries and their line format.
//!
//! One contact per line: `id,name,enabled`. Two-field lines (`id,enabled`)
//! use the id as the name; a bare `id` line is an enabled contact.

/// Maximum number of contacts on the allow-list.
pub const MAX_CONTACTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEntry {
    /// Bare phone id, without the `@c.us` suffix
    pub identifier: String,
    pub display_name: String,
    pub enabled: bool,
}

impl ContactEntry {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            enabled: true,
        }
    }

    /// Parse one line. Blank lines yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        let entry = match parts.as_slice() {
            [id, name, enabled] => Self {
                identifier: (*id).into(),
                display_name: (*name).into(),
                enabled: parse_flag(enabled),
            },
            [id, enabled] => Self {
                identifier: (*id).into(),
                display_name: (*id).into(),
                enabled: parse_flag(enabled),
            },
            _ => Self::new(line, line),
        };
        Some(entry)
    }

    pub fn to_line(&self) -> String {
        format!("{},{},{}", self.identifier, self.display_name, self.enabled)
    }
}

fn parse_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

/// Parse a whole contacts file.
pub fn parse_contacts(content: &str) -> Vec<ContactEntry> {
    content.lines().filter_map(ContactEntry::parse_line).collect()
}

/// Render a contacts file, one line per entry.
pub fn render_contacts(contacts: &[ContactEntry]) -> String {
    contacts.iter().map(|c| c.to_line() + "\n").collect()
}

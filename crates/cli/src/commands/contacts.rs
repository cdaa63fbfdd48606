//! `zaprelay contacts`: Manage the reply allow-list.

use super::load_policy;
use zaprelay_policy::{ContactEntry, MAX_CONTACTS};

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let (config, store) = load_policy()?;
    let contacts = store.contacts().await;

    println!("📇 Contacts ({}/{MAX_CONTACTS})", contacts.len());
    println!("   File: {}\n", config.storage.contacts_path().display());
    print!("{}", render_table(&contacts));

    Ok(())
}

pub async fn add(id: &str, name: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let (_, store) = load_policy()?;
    store.add_contact(id, name).await?;
    println!("✅ Added {id}");
    Ok(())
}

pub async fn remove(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (_, store) = load_policy()?;
    if store.remove_contact(id).await? {
        println!("✅ Removed {id}");
    } else {
        println!("⚠️  No contact {id} on the list");
    }
    Ok(())
}

pub async fn set_enabled(id: &str, enabled: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, store) = load_policy()?;
    store.set_contact_enabled(id, enabled).await?;
    println!("✅ {id} {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

fn render_table(contacts: &[ContactEntry]) -> String {
    if contacts.is_empty() {
        return "  (no contacts; add one with `zaprelay contacts add <id>`)\n".into();
    }
    let width = contacts
        .iter()
        .map(|c| c.identifier.len())
        .max()
        .unwrap_or(0);
    contacts
        .iter()
        .map(|c| {
            let mark = if c.enabled { "✅" } else { "⛔" };
            format!("  {mark} {:<width$}  {}\n", c.identifier, c.display_name)
        })
        .collect()
}

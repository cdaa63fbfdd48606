//! The policy store: contacts and toggles behind one lock.
//!
//! Both files are read wholesale at startup and re-read whenever their size
//! or modification time changes, so edits made by another process (the
//! `zaprelay contacts` and `zaprelay policy` commands) apply to the next
//! event. Every admin mutation works on a copy, rewrites the affected file
//! atomically, and only then publishes the copy, so readers never observe a
//! state that is not on disk.

use crate::contacts::{ContactEntry, MAX_CONTACTS, parse_contacts, render_contacts};
use crate::toggles::PolicyConfig;
use crate::PolicyError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// What a file looked like when it was last read. `None` when it was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
    /// Atomic rewrites replace the inode, which catches same-size edits
    /// inside one mtime tick.
    file_id: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Option<Self> {
        std::fs::metadata(path).ok().map(|meta| Self {
            modified: meta.modified().ok(),
            len: meta.len(),
            file_id: file_id(&meta),
        })
    }
}

#[cfg(unix)]
fn file_id(meta: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn file_id(_meta: &std::fs::Metadata) -> u64 {
    0
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    contacts: Vec<ContactEntry>,
    config: PolicyConfig,
    contacts_stamp: Option<FileStamp>,
    policy_stamp: Option<FileStamp>,
}

/// Whether a sender may receive replies, with the inputs that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorization {
    /// Contact is on the list and enabled
    pub authorized: bool,
    pub responses_on: bool,
    /// True for direct chats, else the group toggle
    pub group_on: bool,
}

impl Authorization {
    pub fn allows_reply(&self) -> bool {
        self.authorized && self.responses_on && self.group_on
    }
}

pub struct PolicyStore {
    contacts_path: PathBuf,
    policy_path: PathBuf,
    state: RwLock<Snapshot>,
}

impl PolicyStore {
    /// Load both files. Missing files start empty (contacts) or default (toggles).
    pub fn load(contacts_path: impl Into<PathBuf>, policy_path: impl Into<PathBuf>) -> Result<Self, PolicyError> {
        let contacts_path = contacts_path.into();
        let policy_path = policy_path.into();

        let contacts_stamp = FileStamp::of(&contacts_path);
        let policy_stamp = FileStamp::of(&policy_path);
        let contacts = read_optional(&contacts_path)?
            .map(|c| parse_contacts(&c))
            .unwrap_or_default();
        let config = read_optional(&policy_path)?
            .map(|c| PolicyConfig::parse(&c))
            .unwrap_or_default();

        info!(
            contacts = contacts.len(),
            responses = config.responses_enabled,
            group_responses = config.group_responses_enabled,
            "Policy loaded"
        );

        Ok(Self {
            contacts_path,
            policy_path,
            state: RwLock::new(Snapshot {
                contacts,
                config,
                contacts_stamp,
                policy_stamp,
            }),
        })
    }

    /// Re-read whichever file changed on disk since the last read.
    ///
    /// A file that cannot be read keeps its previous snapshot.
    pub async fn refresh(&self) {
        let contacts_stamp = FileStamp::of(&self.contacts_path);
        let policy_stamp = FileStamp::of(&self.policy_path);
        {
            let state = self.state.read().await;
            if state.contacts_stamp == contacts_stamp && state.policy_stamp == policy_stamp {
                return;
            }
        }

        let mut state = self.state.write().await;
        if state.contacts_stamp != contacts_stamp {
            match read_optional(&self.contacts_path) {
                Ok(content) => {
                    state.contacts = content.map(|c| parse_contacts(&c)).unwrap_or_default();
                    state.contacts_stamp = contacts_stamp;
                    info!(contacts = state.contacts.len(), "Contacts reloaded");
                }
                Err(e) => warn!(error = %e, "Contacts file changed but could not be read"),
            }
        }
        if state.policy_stamp != policy_stamp {
            match read_optional(&self.policy_path) {
                Ok(content) => {
                    state.config = content.map(|c| PolicyConfig::parse(&c)).unwrap_or_default();
                    state.policy_stamp = policy_stamp;
                    info!(
                        responses = state.config.responses_enabled,
                        group_responses = state.config.group_responses_enabled,
                        "Toggles reloaded"
                    );
                }
                Err(e) => warn!(error = %e, "Policy file changed but could not be read"),
            }
        }
    }

    pub async fn contacts(&self) -> Vec<ContactEntry> {
        self.refresh().await;
        self.state.read().await.contacts.clone()
    }

    pub async fn contact(&self, identifier: &str) -> Option<ContactEntry> {
        self.refresh().await;
        self.state
            .read()
            .await
            .contacts
            .iter()
            .find(|c| c.identifier == identifier)
            .cloned()
    }

    pub async fn config(&self) -> PolicyConfig {
        self.refresh().await;
        self.state.read().await.config.clone()
    }

    /// Evaluate the allow-list and toggles for one sender.
    pub async fn authorize(&self, sender_id: &str, is_group: bool) -> Authorization {
        self.refresh().await;
        let state = self.state.read().await;
        let authorized = state
            .contacts
            .iter()
            .any(|c| c.identifier == sender_id && c.enabled);
        Authorization {
            authorized,
            responses_on: state.config.responses_enabled,
            group_on: !is_group || state.config.group_responses_enabled,
        }
    }

    /// Add an enabled contact. Fails on duplicates and once the list is full.
    pub async fn add_contact(&self, identifier: &str, display_name: Option<&str>) -> Result<(), PolicyError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || identifier.contains(',') {
            return Err(PolicyError::InvalidContact(identifier.to_string()));
        }
        let name = display_name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(identifier);
        if name.contains(',') {
            return Err(PolicyError::InvalidContact(name.to_string()));
        }

        self.refresh().await;
        let mut state = self.state.write().await;
        if state.contacts.iter().any(|c| c.identifier == identifier) {
            return Err(PolicyError::DuplicateContact(identifier.to_string()));
        }
        if state.contacts.len() >= MAX_CONTACTS {
            return Err(PolicyError::ContactLimit(MAX_CONTACTS));
        }

        let mut contacts = state.contacts.clone();
        contacts.push(ContactEntry::new(identifier, name));
        write_atomic(&self.contacts_path, &render_contacts(&contacts))?;
        state.contacts = contacts;
        state.contacts_stamp = FileStamp::of(&self.contacts_path);
        debug!(contact = identifier, "Contact added");
        Ok(())
    }

    /// Returns `false` if no such contact existed.
    pub async fn remove_contact(&self, identifier: &str) -> Result<bool, PolicyError> {
        self.refresh().await;
        let mut state = self.state.write().await;
        let mut contacts = state.contacts.clone();
        contacts.retain(|c| c.identifier != identifier);
        if contacts.len() == state.contacts.len() {
            return Ok(false);
        }
        write_atomic(&self.contacts_path, &render_contacts(&contacts))?;
        state.contacts = contacts;
        state.contacts_stamp = FileStamp::of(&self.contacts_path);
        debug!(contact = identifier, "Contact removed");
        Ok(true)
    }

    pub async fn set_contact_enabled(&self, identifier: &str, enabled: bool) -> Result<(), PolicyError> {
        self.refresh().await;
        let mut state = self.state.write().await;
        let mut contacts = state.contacts.clone();
        let entry = contacts
            .iter_mut()
            .find(|c| c.identifier == identifier)
            .ok_or_else(|| PolicyError::UnknownContact(identifier.to_string()))?;
        entry.enabled = enabled;
        write_atomic(&self.contacts_path, &render_contacts(&contacts))?;
        state.contacts = contacts;
        state.contacts_stamp = FileStamp::of(&self.contacts_path);
        Ok(())
    }

    pub async fn set_responses_enabled(&self, enabled: bool) -> Result<(), PolicyError> {
        self.update_config(|c| c.responses_enabled = enabled).await
    }

    pub async fn set_group_responses_enabled(&self, enabled: bool) -> Result<(), PolicyError> {
        self.update_config(|c| c.group_responses_enabled = enabled).await
    }

    async fn update_config(&self, apply: impl FnOnce(&mut PolicyConfig)) -> Result<(), PolicyError> {
        self.refresh().await;
        let mut state = self.state.write().await;
        let mut config = state.config.clone();
        apply(&mut config);
        write_atomic(&self.policy_path, &config.render())?;
        state.config = config;
        state.policy_stamp = FileStamp::of(&self.policy_path);
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, PolicyError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PolicyError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, content: &str) -> Result<(), PolicyError> {
    let io_err = |e: std::io::Error| PolicyError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(content.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> PolicyStore {
        PolicyStore::load(dir.join("allowed_contacts.txt"), dir.join("config.txt")).unwrap()
    }

    #[tokio::test]
    async fn missing_files_start_empty_with_replies_on() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        assert!(store.contacts().await.is_empty());
        let config = store.config().await;
        assert!(config.responses_enabled);
        assert!(config.group_responses_enabled);
    }

    #[tokio::test]
    async fn add_persists_and_reloads() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        store.add_contact("5511999", Some("Maria")).await.unwrap();
        store.add_contact("5511888", None).await.unwrap();

        let on_disk = std::fs::read_to_string(tmp.path().join("allowed_contacts.txt")).unwrap();
        assert_eq!(on_disk, "5511999,Maria,true\n5511888,5511888,true\n");

        let reloaded = store_in(tmp.path());
        assert_eq!(reloaded.contacts().await, store.contacts().await);
    }

    #[tokio::test]
    async fn duplicate_contact_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        store.add_contact("5511999", None).await.unwrap();
        let err = store.add_contact("5511999", Some("Other")).await.unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateContact(_)));
    }

    #[tokio::test]
    async fn contact_cap_enforced() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        for i in 0..MAX_CONTACTS {
            store.add_contact(&format!("55110000{i:02}"), None).await.unwrap();
        }
        let err = store.add_contact("5599999", None).await.unwrap_err();
        assert!(matches!(err, PolicyError::ContactLimit(10)));
        assert_eq!(store.contacts().await.len(), MAX_CONTACTS);
    }

    #[tokio::test]
    async fn disabled_contact_is_not_authorized() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        store.add_contact("5511999", None).await.unwrap();
        store.set_contact_enabled("5511999", false).await.unwrap();

        let auth = store.authorize("5511999", false).await;
        assert!(!auth.authorized);
        assert!(!auth.allows_reply());
    }

    #[tokio::test]
    async fn group_toggle_only_affects_groups() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        store.add_contact("5511999", None).await.unwrap();
        store.set_group_responses_enabled(false).await.unwrap();

        assert!(!store.authorize("5511999", true).await.allows_reply());
        assert!(store.authorize("5511999", false).await.allows_reply());
    }

    #[tokio::test]
    async fn toggles_round_trip_with_extras() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.txt"), "enable_responses=true\nlang=pt\n").unwrap();
        let store = store_in(tmp.path());
        store.set_responses_enabled(false).await.unwrap();

        let on_disk = std::fs::read_to_string(tmp.path().join("config.txt")).unwrap();
        assert!(on_disk.contains("enable_responses=false"));
        assert!(on_disk.contains("lang=pt"));
        assert!(!store_in(tmp.path()).config().await.responses_enabled);
    }

    #[tokio::test]
    async fn remove_unknown_contact_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        assert!(!store.remove_contact("123").await.unwrap());
        assert!(!tmp.path().join("allowed_contacts.txt").exists());
    }

    #[tokio::test]
    async fn edits_from_another_store_apply_to_next_read() {
        let tmp = tempfile::tempdir().unwrap();
        let serving = store_in(tmp.path());
        let admin = store_in(tmp.path());

        admin.add_contact("5511999", Some("Maria")).await.unwrap();
        assert!(serving.authorize("5511999", false).await.allows_reply());

        admin.set_contact_enabled("5511999", false).await.unwrap();
        assert!(!serving.authorize("5511999", false).await.allows_reply());

        admin.set_contact_enabled("5511999", true).await.unwrap();
        admin.set_responses_enabled(false).await.unwrap();
        let auth = serving.authorize("5511999", false).await;
        assert!(auth.authorized);
        assert!(!auth.responses_on);
    }

    #[tokio::test]
    async fn mutation_starts_from_disk_state() {
        let tmp = tempfile::tempdir().unwrap();
        let first = store_in(tmp.path());
        let second = store_in(tmp.path());

        first.add_contact("5511999", None).await.unwrap();
        second.add_contact("5511888", None).await.unwrap();

        let on_disk = std::fs::read_to_string(tmp.path().join("allowed_contacts.txt")).unwrap();
        assert_eq!(on_disk, "5511999,5511999,true\n5511888,5511888,true\n");
    }

    #[tokio::test]
    async fn deleted_contacts_file_empties_list() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        store.add_contact("5511999", None).await.unwrap();

        std::fs::remove_file(tmp.path().join("allowed_contacts.txt")).unwrap();
        assert!(!store.authorize("5511999", false).await.authorized);
    }

    #[tokio::test]
    async fn enabling_unknown_contact_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let err = store.set_contact_enabled("123", true).await.unwrap_err();
        assert!(matches!(err, PolicyError::UnknownContact(_)));
    }
}

pub mod contacts;
pub mod doctor;
pub mod gateway;
pub mod history;
pub mod onboard;
pub mod policy;

use zaprelay_config::AppConfig;
use zaprelay_policy::PolicyStore;

/// Load config and the policy files it points at.
pub(crate) fn load_policy() -> Result<(AppConfig, PolicyStore), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = PolicyStore::load(config.storage.contacts_path(), config.storage.policy_path())?;
    Ok((config, store))
}

//! `zaprelay policy`: Show or flip the reply toggles.

use super::load_policy;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    /// Replies to anyone at all
    Responses,
    /// Replies inside group chats
    GroupResponses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    fn enabled(self) -> bool {
        self == Self::On
    }
}

fn label(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let (config, store) = load_policy()?;
    let policy = store.config().await;

    println!("🔧 Reply policy");
    println!("   File: {}\n", config.storage.policy_path().display());
    println!("  responses:        {}", label(policy.responses_enabled));
    println!("  group-responses:  {}", label(policy.group_responses_enabled));
    for (key, value) in policy.extras() {
        println!("  {key}={value}");
    }

    Ok(())
}

pub async fn set(toggle: Toggle, value: Switch) -> Result<(), Box<dyn std::error::Error>> {
    let (_, store) = load_policy()?;
    let enabled = value.enabled();
    match toggle {
        Toggle::Responses => store.set_responses_enabled(enabled).await?,
        Toggle::GroupResponses => store.set_group_responses_enabled(enabled).await?,
    }
    println!("✅ {} {}", toggle_name(toggle), label(enabled));
    Ok(())
}

fn toggle_name(toggle: Toggle) -> &'static str {
    match toggle {
        Toggle::Responses => "responses",
        Toggle::GroupResponses => "group-responses",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_names_are_kebab_case() {
        assert_eq!(Toggle::from_str("group-responses", false).unwrap(), Toggle::GroupResponses);
        assert_eq!(Switch::from_str("off", false).unwrap(), Switch::Off);
        assert!(Switch::On.enabled());
    }
}

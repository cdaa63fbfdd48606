//! Process-wide reply toggles, persisted as `key=value` lines.

const RESPONSES_KEY: &str = "enable_responses";
const GROUP_RESPONSES_KEY: &str = "enable_group_responses";

/// Reply switches. Keys this crate does not know are kept and written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    pub responses_enabled: bool,
    pub group_responses_enabled: bool,
    extras: Vec<(String, String)>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            responses_enabled: true,
            group_responses_enabled: true,
            extras: Vec::new(),
        }
    }
}

impl PolicyConfig {
    /// Parse `key=value` lines. Missing toggles default to on.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                RESPONSES_KEY => config.responses_enabled = value == "true",
                GROUP_RESPONSES_KEY => config.group_responses_enabled = value == "true",
                _ => {
                    config.extras.retain(|(k, _)| k != key);
                    config.extras.push((key.to_string(), value.to_string()));
                }
            }
        }
        config
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "{RESPONSES_KEY}={}\n{GROUP_RESPONSES_KEY}={}\n",
            self.responses_enabled, self.group_responses_enabled
        );
        for (key, value) in &self.extras {
            out.push_str(&format!("{key}={value}\n"));
        }
        out
    }

    /// Unrecognised keys, in file order.
    pub fn extras(&self) -> &[(String, String)] {
        &self.extras
    }
}

use serde::{Deserialize, Serialize};

/// Execution environment class. Constrained devices get a stricter
/// complexity ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Desktop,
    Mobile,
}

impl Platform {
    /// Classify a browser user-agent string. iOS devices are `Mobile`.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ["iphone", "ipad", "ipod"].iter().any(|d| ua.contains(d)) {
            Platform::Mobile
        } else {
            Platform::Desktop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ios_agents_are_mobile() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
        assert_eq!(Platform::from_user_agent(ua), Platform::Mobile);
        assert_eq!(Platform::from_user_agent("Mozilla/5.0 (IPAD)"), Platform::Mobile);
    }

    #[test]
    fn other_agents_are_desktop() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/128.0";
        assert_eq!(Platform::from_user_agent(ua), Platform::Desktop);
        assert_eq!(Platform::from_user_agent(""), Platform::Desktop);
    }
}

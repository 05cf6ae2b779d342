use std::env;

const ENDPOINT_ENV: &str = "PHONODRILL_ENDPOINT";

/// Word-generation endpoint selection. With no endpoint configured the
/// session runs offline on the bundled fallback list.
#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    pub endpoint: Option<String>,
}

impl GenerationConfig {
    /// Resolves the relay endpoint: an explicit override wins, then the
    /// `PHONODRILL_ENDPOINT` environment variable, else offline.
    pub fn from_override(endpoint: Option<String>) -> Self {
        let endpoint = endpoint.or_else(env_endpoint);
        Self { endpoint }
    }

    pub fn is_offline(&self) -> bool {
        self.endpoint.is_none()
    }
}

fn env_endpoint() -> Option<String> {
    env::var(ENDPOINT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{GenerationConfig, ENDPOINT_ENV};

    #[test]
    fn explicit_override_wins() {
        let config = GenerationConfig::from_override(Some("http://localhost:9/chat".to_string()));
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9/chat"));
        assert!(!config.is_offline());
    }

    #[test]
    fn environment_supplies_endpoint_when_no_override() {
        std::env::set_var(ENDPOINT_ENV, "http://localhost:9/env-chat");
        let config = GenerationConfig::from_override(None);
        std::env::remove_var(ENDPOINT_ENV);
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9/env-chat"));

        std::env::set_var(ENDPOINT_ENV, "   ");
        let blank = GenerationConfig::from_override(None);
        std::env::remove_var(ENDPOINT_ENV);
        assert!(blank.is_offline());
    }
}

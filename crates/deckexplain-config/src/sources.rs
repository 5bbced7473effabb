use std::collections::BTreeMap;

use super::Config;

impl Config {
    /// Effective configuration as `key -> (value, source)`, for `deckexplain config`.
    ///
    /// Unset optional values are omitted.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut out = BTreeMap::new();

        let mut add = |key: &str, value: Option<String>| {
            if let Some(val) = value {
                out.insert(key.to_string(), (val, self.source_of(key).to_string()));
            }
        };

        add("llm.provider", Some(self.llm.provider.clone()));
        add("llm.model", Some(self.llm.model.clone()));
        add("llm.base_url", self.llm.base_url.clone());
        add("llm.api_key_env", Some(self.llm.api_key_env.clone()));
        add("llm.max_tokens", self.llm.max_tokens.map(|v| v.to_string()));
        add("llm.temperature", self.llm.temperature.map(|v| v.to_string()));
        add("llm.timeout_secs", Some(self.llm.timeout_secs.to_string()));
        add("retry.max_retries", Some(self.retry.max_retries.to_string()));
        add(
            "retry.initial_backoff_secs",
            Some(self.retry.initial_backoff_secs.to_string()),
        );
        add(
            "retry.backoff_step_secs",
            Some(self.retry.backoff_step_secs.to_string()),
        );
        add(
            "service.uploads_dir",
            Some(self.service.uploads_dir.display().to_string()),
        );
        add(
            "service.outputs_dir",
            Some(self.service.outputs_dir.display().to_string()),
        );
        add(
            "service.poll_interval_secs",
            Some(self.service.poll_interval_secs.to_string()),
        );
        add("service.bind_address", Some(self.service.bind_address.clone()));

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_labels_sources() {
        let config = Config::builder().model("gpt-4o").build().unwrap();
        let effective = config.effective_config();

        assert_eq!(
            effective.get("llm.model"),
            Some(&("gpt-4o".to_string(), "programmatic".to_string()))
        );
        assert_eq!(
            effective.get("retry.max_retries"),
            Some(&("3".to_string(), "default".to_string()))
        );
        assert!(!effective.contains_key("llm.base_url"));
    }
}

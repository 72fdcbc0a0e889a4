use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ValidationError;
use crate::types::{CheckConfig, CheckResult};

/// Capability contract every check variant implements.
///
/// The orchestrator constructs a variant (usually through a [`Registry`]),
/// calls [`init`](Check::init) once with the raw definition, then calls
/// [`run`](Check::run) on a schedule. Distinct instances may run concurrently;
/// a single instance is driven by at most one caller at a time.
#[async_trait]
pub trait Check: Send + Sync {
    /// Apply documented defaults, decode the raw definition into the
    /// variant's typed fields, store the generic config, then validate that
    /// required fields are present. Fails on the first missing field. Must be
    /// called before [`run`](Check::run).
    fn init(
        &mut self,
        config: CheckConfig,
        definition: &serde_json::Value,
    ) -> Result<(), ValidationError>;

    /// Perform exactly one probe attempt, reporting pass/fail. Never blocks
    /// past `time_limit`; a probe still in flight when the limit elapses is
    /// reported as a timeout failure.
    async fn run(&self, time_limit: Duration) -> CheckResult;

    /// The generic configuration this check was initialized with.
    fn config(&self) -> &CheckConfig;
}

type Constructor = Box<dyn Fn() -> Box<dyn Check> + Send + Sync>;

/// Maps check-type names to constructors.
///
/// New protocol variants are added by registering a constructor under their
/// type tag; the orchestrator dispatches on the tag without knowing any
/// variant concretely.
#[derive(Default)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for a check type, replacing any previous one.
    pub fn register<F>(&mut self, check_type: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Check> + Send + Sync + 'static,
    {
        self.constructors.insert(check_type.into(), Box::new(constructor));
    }

    /// Construct an uninitialized check of the given type.
    pub fn create(&self, check_type: &str) -> Option<Box<dyn Check>> {
        self.constructors.get(check_type).map(|constructor| constructor())
    }

    pub fn contains(&self, check_type: &str) -> bool {
        self.constructors.contains_key(check_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullCheck {
        config: CheckConfig,
    }

    #[async_trait]
    impl Check for NullCheck {
        fn init(
            &mut self,
            config: CheckConfig,
            _definition: &serde_json::Value,
        ) -> Result<(), ValidationError> {
            self.config = config;
            Ok(())
        }

        async fn run(&self, _time_limit: Duration) -> CheckResult {
            CheckResult::new(&self.config, "null").pass("nothing to probe")
        }

        fn config(&self) -> &CheckConfig {
            &self.config
        }
    }

    #[tokio::test]
    async fn registry_dispatches_by_type_name() {
        let mut registry = Registry::new();
        registry.register("null", || {
            Box::new(NullCheck { config: CheckConfig::default() })
        });

        assert!(registry.contains("null"));
        assert!(!registry.contains("ssh"));
        assert!(registry.create("ssh").is_none());

        let mut check = registry.create("null").expect("registered type");
        let config = CheckConfig { id: "n1".to_string(), ..CheckConfig::default() };
        check.init(config, &serde_json::json!({})).unwrap();

        let result = check.run(Duration::from_secs(1)).await;
        assert!(result.passed);
        assert_eq!(result.id, "n1");
    }
}

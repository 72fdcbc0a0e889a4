use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::check::Check;
use crate::types::CheckResult;

/// Race a probe future against the caller's time budget.
///
/// The probe resolves to `Ok(success message)` or `Err(failure cause)` and is
/// spawned as its own task so a hung dial cannot block the caller. Whichever
/// side resolves first determines the outcome; if the budget elapses first
/// the worker task is aborted, so an unreachable host cannot pin a socket or
/// task past the deadline. Exactly one result is produced per invocation.
pub async fn race_deadline<F>(result: CheckResult, time_limit: Duration, probe: F) -> CheckResult
where
    F: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    let mut worker = tokio::spawn(probe);

    match tokio::time::timeout(time_limit, &mut worker).await {
        Ok(Ok(Ok(message))) => result.pass(message),
        Ok(Ok(Err(cause))) => result.fail(format!("{cause:#}")),
        Ok(Err(join_error)) => result.fail(format!("probe task failed: {join_error}")),
        Err(_) => {
            worker.abort();
            warn!(
                check_id = %result.id,
                check_type = %result.check_type,
                "probe timed out after {time_limit:?}"
            );
            result.fail(format!("timeout limit reached after {time_limit:?}"))
        }
    }
}

/// Dispatches checks and delivers their results into the orchestrator's sink.
pub struct CheckRunner {
    time_limit: Duration,
    result_tx: mpsc::Sender<CheckResult>,
}

impl CheckRunner {
    pub fn new(time_limit: Duration, result_tx: mpsc::Sender<CheckResult>) -> Self {
        Self { time_limit, result_tx }
    }

    /// Run one check on its own task, sending the result into the sink. The
    /// returned handle completes once the result has been delivered.
    pub fn spawn_check(&self, check: Arc<dyn Check>) -> JoinHandle<()> {
        let time_limit = self.time_limit;
        let result_tx = self.result_tx.clone();

        tokio::spawn(async move {
            let result = check.run(time_limit).await;

            if let Err(e) = result_tx.send(result).await {
                error!("failed to deliver check result: {e}");
            }
        })
    }

    /// Dispatch a batch of checks, one task each.
    pub fn spawn_checks(&self, checks: Vec<Arc<dyn Check>>) -> Vec<JoinHandle<()>> {
        checks.into_iter().map(|check| self.spawn_check(check)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::ValidationError;
    use crate::types::CheckConfig;

    fn skeleton() -> CheckResult {
        let config = CheckConfig {
            id: "check-1".to_string(),
            name: "example".to_string(),
            group: "team-1".to_string(),
            score_weight: 1.0,
        };
        CheckResult::new(&config, "test")
    }

    #[tokio::test]
    async fn probe_success_wins_the_race() {
        let result = race_deadline(skeleton(), Duration::from_secs(5), async {
            Ok("service responded".to_string())
        })
        .await;

        assert!(result.passed);
        assert_eq!(result.message, "service responded");
    }

    #[tokio::test]
    async fn probe_failure_reports_its_cause_not_a_timeout() {
        let result = race_deadline(skeleton(), Duration::from_secs(5), async {
            Err(anyhow::anyhow!("connection refused"))
        })
        .await;

        assert!(!result.passed);
        assert!(result.message.contains("connection refused"));
        assert!(!result.message.contains("timeout"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_wins_against_a_slow_probe() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = race_deadline(skeleton(), Duration::from_millis(50), async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            flag.store(true, Ordering::SeqCst);
            Ok("too late".to_string())
        })
        .await;

        assert!(!result.passed);
        assert!(result.message.contains("timeout limit reached"));

        // The worker was aborted, not abandoned: even long after its own
        // sleep would have elapsed, it never ran to completion.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    async fn panicking_probe() -> anyhow::Result<String> {
        panic!("probe bug")
    }

    #[tokio::test]
    async fn panicking_probe_becomes_a_failed_result() {
        let result = race_deadline(skeleton(), Duration::from_secs(5), panicking_probe()).await;

        assert!(!result.passed);
        assert!(result.message.contains("probe task failed"));
    }

    struct FixedCheck {
        config: CheckConfig,
    }

    #[async_trait]
    impl Check for FixedCheck {
        fn init(
            &mut self,
            config: CheckConfig,
            _definition: &serde_json::Value,
        ) -> Result<(), ValidationError> {
            self.config = config;
            Ok(())
        }

        async fn run(&self, _time_limit: Duration) -> CheckResult {
            CheckResult::new(&self.config, "fixed").pass("ok")
        }

        fn config(&self) -> &CheckConfig {
            &self.config
        }
    }

    #[tokio::test]
    async fn runner_delivers_one_result_per_check() {
        let (tx, mut rx) = mpsc::channel(4);
        let runner = CheckRunner::new(Duration::from_secs(1), tx);

        let check = Arc::new(FixedCheck {
            config: CheckConfig { id: "c1".to_string(), ..CheckConfig::default() },
        });

        let handle = runner.spawn_check(check);
        let result = rx.recv().await.expect("result delivered");
        assert!(result.passed);
        assert_eq!(result.id, "c1");

        handle.await.unwrap();
        // No second result for a single spawned check.
        assert!(rx.try_recv().is_err());
    }
}

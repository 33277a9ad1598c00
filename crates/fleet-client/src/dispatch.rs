//! Concurrent one-shot command fan-out.
//!
//! One dispatch runs one command on many hosts at once and settles
//! with exactly one outcome per host, in selection order. Host
//! branches are independent: one failing, timing out or falling off
//! the registry never disturbs its siblings, and the dispatch call
//! itself only errors on pre-flight validation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use uuid::Uuid;

use fleet_core::config::DispatchConfig;
use fleet_core::{DispatchError, DispatchOutcome, DispatchResult, HostError, Hostname};

/// Runs one command on one host
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    /// Execute `command` on `hostname`, returning captured output
    async fn run(&self, hostname: &Hostname, command: &str) -> Result<String, HostError>;
}

/// Fan-out engine over a command runner
pub struct Dispatcher<R> {
    runner: Arc<R>,
    config: DispatchConfig,
}

impl<R: CommandRunner> Dispatcher<R> {
    /// Create a dispatcher with fan-out settings
    pub fn new(runner: Arc<R>, config: DispatchConfig) -> Self {
        Self { runner, config }
    }

    /// Run `command` on every host in `hosts`.
    ///
    /// Validation failures (empty command, no targets) reject the
    /// whole dispatch before anything is sent. Everything after that
    /// is per-host: results come back in the order the hosts were
    /// given, and hosts still unresolved at the deadline settle as
    /// timed out.
    pub async fn dispatch(
        &self,
        command: &str,
        hosts: &[Hostname],
    ) -> Result<Vec<DispatchResult>, DispatchError> {
        if command.trim().is_empty() {
            return Err(DispatchError::EmptyCommand);
        }
        if hosts.is_empty() {
            return Err(DispatchError::NoHosts);
        }

        let dispatch_id = Uuid::new_v4();
        tracing::info!(
            dispatch = %dispatch_id,
            command,
            targets = hosts.len(),
            "dispatching command"
        );

        // One absolute deadline for the whole dispatch. Waiting for an
        // in-flight slot counts against it.
        let deadline = Instant::now() + self.config.timeout;
        let limiter = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let mut branches = JoinSet::new();

        for (index, hostname) in hosts.iter().cloned().enumerate() {
            let runner = Arc::clone(&self.runner);
            let limiter = Arc::clone(&limiter);
            let command = command.to_string();

            branches.spawn(async move {
                let run = async {
                    let _permit = limiter.acquire_owned().await.ok();
                    runner.run(&hostname, &command).await
                };

                let outcome = match tokio::time::timeout_at(deadline, run).await {
                    Ok(Ok(output)) => DispatchOutcome::Success { output },
                    Ok(Err(err)) => DispatchOutcome::failed(err),
                    Err(_) => DispatchOutcome::TimedOut,
                };

                (index, DispatchResult { hostname, outcome })
            });
        }

        // Branches settle in completion order; reassemble into
        // selection order.
        let mut slots: Vec<Option<DispatchResult>> = hosts.iter().map(|_| None).collect();
        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok((index, result)) => {
                    tracing::debug!(
                        dispatch = %dispatch_id,
                        host = %result.hostname,
                        ok = result.success(),
                        "host settled"
                    );
                    slots[index] = Some(result);
                }
                Err(e) => {
                    // A panicked branch still must not sink the
                    // dispatch; its slot is filled below.
                    tracing::error!(dispatch = %dispatch_id, error = %e, "dispatch branch failed");
                }
            }
        }

        let results: Vec<DispatchResult> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| DispatchResult {
                    hostname: hosts[index].clone(),
                    outcome: DispatchOutcome::Failed {
                        error: "internal: dispatch branch aborted".to_string(),
                    },
                })
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.success()).count();
        tracing::info!(
            dispatch = %dispatch_id,
            succeeded,
            failed = results.len() - succeeded,
            "dispatch settled"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Runner scripted per hostname; unknown hosts fail, and a
    /// hostname listed in `slow` never completes.
    struct ScriptedRunner {
        outputs: HashMap<String, String>,
        slow: Vec<String>,
        calls: AtomicUsize,
        peak: AtomicUsize,
        in_flight: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(outputs: &[(&str, &str)], slow: &[&str]) -> Self {
            Self {
                outputs: outputs
                    .iter()
                    .map(|(h, o)| (h.to_string(), o.to_string()))
                    .collect(),
                slow: slow.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, hostname: &Hostname, _command: &str) -> Result<String, HostError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if self.slow.contains(&hostname.as_str().to_string()) {
                // Longer than any test deadline
                tokio::time::sleep(Duration::from_secs(3600)).await;
            } else {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.outputs
                .get(hostname.as_str())
                .cloned()
                .ok_or_else(|| HostError::UnknownHost(hostname.to_string()))
        }
    }

    fn config(timeout: Duration, max_in_flight: usize) -> DispatchConfig {
        DispatchConfig {
            timeout,
            max_in_flight,
        }
    }

    fn names(names: &[&str]) -> Vec<Hostname> {
        names.iter().map(|&n| Hostname::new(n)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_come_back_in_selection_order() {
        let runner = Arc::new(ScriptedRunner::new(
            &[("h1", "one"), ("h2", "two"), ("h3", "three")],
            &[],
        ));
        let dispatcher = Dispatcher::new(runner, config(Duration::from_secs(60), 50));

        let results = dispatcher
            .dispatch("uptime", &names(&["h3", "h1", "h2"]))
            .await
            .unwrap();

        let order: Vec<_> = results.iter().map(|r| r.hostname.as_str()).collect();
        assert_eq!(order, vec!["h3", "h1", "h2"]);
        assert!(results.iter().all(|r| r.success()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_host_failing_leaves_siblings_untouched() {
        let runner = Arc::new(ScriptedRunner::new(&[("h1", "ok"), ("h3", "ok")], &[]));
        let dispatcher = Dispatcher::new(runner, config(Duration::from_secs(60), 50));

        let results = dispatcher
            .dispatch("uptime", &names(&["h1", "ghost", "h3"]))
            .await
            .unwrap();

        assert!(results[0].success());
        assert!(!results[1].success());
        assert!(results[1].text().contains("ghost"));
        assert!(results[2].success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_settles_stragglers_as_timed_out() {
        let runner = Arc::new(ScriptedRunner::new(
            &[("h1", "fast"), ("h2", "never"), ("h3", "fast")],
            &["h2"],
        ));
        let dispatcher = Dispatcher::new(runner, config(Duration::from_secs(5), 50));

        let results = dispatcher
            .dispatch("uptime", &names(&["h1", "h2", "h3"]))
            .await
            .unwrap();

        assert!(results[0].success());
        assert_eq!(results[1].outcome, DispatchOutcome::TimedOut);
        assert!(results[2].success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_cap_is_respected() {
        let pairs: Vec<(String, String)> = (0..20)
            .map(|i| (format!("h{}", i), "ok".to_string()))
            .collect();
        let borrowed: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(h, o)| (h.as_str(), o.as_str()))
            .collect();
        let runner = Arc::new(ScriptedRunner::new(&borrowed, &[]));
        let hosts: Vec<Hostname> = (0..20).map(|i| Hostname::new(format!("h{}", i))).collect();

        let dispatcher = Dispatcher::new(Arc::clone(&runner), config(Duration::from_secs(60), 4));
        let results = dispatcher.dispatch("uptime", &hosts).await.unwrap();

        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.success()));
        assert!(runner.peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected_before_any_send() {
        let runner = Arc::new(ScriptedRunner::new(&[("h1", "ok")], &[]));
        let dispatcher = Dispatcher::new(Arc::clone(&runner), config(Duration::from_secs(60), 50));

        let err = dispatcher
            .dispatch("   ", &names(&["h1"]))
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::EmptyCommand);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_selection_is_rejected() {
        let runner = Arc::new(ScriptedRunner::new(&[], &[]));
        let dispatcher = Dispatcher::new(Arc::clone(&runner), config(Duration::from_secs(60), 50));

        let err = dispatcher.dispatch("uptime", &[]).await.unwrap_err();
        assert_eq!(err, DispatchError::NoHosts);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }
}

use crate::core::{EvalOutcome, EvalTask};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EvalEngine<T: EvalTask> {
    task: T,
    monitor: SystemMonitor,
}

impl<T: EvalTask> EvalEngine<T> {
    pub fn new(task: T) -> Self {
        Self::new_with_monitoring(task, false)
    }

    pub fn new_with_monitoring(task: T, monitor_enabled: bool) -> Self {
        Self {
            task,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Evaluates the task and persists its outcome. Returns where it was written.
    pub async fn run(&mut self) -> Result<String> {
        tracing::info!("Starting evaluation: {}", self.task.label());
        self.monitor.record("start");

        let outcome = self.task.evaluate().await?;
        match &outcome {
            EvalOutcome::Scalar { label, value } => {
                tracing::info!("{}: {:.6}", label, value);
            }
            EvalOutcome::Latents(summaries) => {
                for summary in summaries {
                    tracing::info!("Exported {}", summary);
                }
            }
        }
        self.monitor.record("evaluate");

        let output_path = self.task.persist(&outcome).await?;
        tracing::debug!("Results written to: {}", output_path);
        self.monitor.record("persist");
        self.monitor.finish();

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EvalError;
    use async_trait::async_trait;

    struct FixedTask {
        fail_evaluate: bool,
    }

    #[async_trait]
    impl EvalTask for FixedTask {
        fn label(&self) -> String {
            "fixed".to_string()
        }

        async fn evaluate(&mut self) -> Result<EvalOutcome> {
            if self.fail_evaluate {
                return Err(EvalError::EmptyBatch);
            }
            Ok(EvalOutcome::Scalar {
                label: "elbo".to_string(),
                value: 1.25,
            })
        }

        async fn persist(&self, outcome: &EvalOutcome) -> Result<String> {
            match outcome {
                EvalOutcome::Scalar { label, .. } => Ok(format!("loglik/{}.txt", label)),
                EvalOutcome::Latents(_) => Ok(String::new()),
            }
        }
    }

    #[tokio::test]
    async fn test_run_returns_persisted_path() {
        let mut engine = EvalEngine::new(FixedTask {
            fail_evaluate: false,
        });
        assert_eq!(engine.run().await.unwrap(), "loglik/elbo.txt");
    }

    #[tokio::test]
    async fn test_run_stops_on_evaluate_error() {
        let mut engine = EvalEngine::new_with_monitoring(
            FixedTask {
                fail_evaluate: true,
            },
            false,
        );
        assert!(matches!(engine.run().await, Err(EvalError::EmptyBatch)));
    }
}

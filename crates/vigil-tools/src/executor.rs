use crate::error::ToolError;
use crate::intent::CommandIntent;

/// Runs an intent that has already been authorized.
pub trait CommandExecutor: Send + Sync {
    /// # Errors
    ///
    /// Returns `ToolError::Execution` when the command cannot be carried out.
    fn run(&self, intent: &CommandIntent)
    -> impl Future<Output = Result<String, ToolError>> + Send;
}

impl<T: CommandExecutor> CommandExecutor for std::sync::Arc<T> {
    async fn run(&self, intent: &CommandIntent) -> Result<String, ToolError> {
        (**self).run(intent).await
    }
}

/// Executor that reports what it would do without touching the system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl CommandExecutor for DryRunExecutor {
    async fn run(&self, intent: &CommandIntent) -> Result<String, ToolError> {
        tracing::info!(%intent, "dry run");
        Ok(format!("[dry-run] {intent}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_echoes_intent() {
        let out = DryRunExecutor
            .run(&CommandIntent::shell("ls -la"))
            .await
            .unwrap();
        assert_eq!(out, "[dry-run] shell ls -la");
    }

    #[tokio::test]
    async fn arc_forwards() {
        let exec = std::sync::Arc::new(DryRunExecutor);
        assert!(exec.run(&CommandIntent::shell("pwd")).await.is_ok());
    }
}

//! Catalog renderer - drives `opm render` against a versioned catalog

use super::reference::CatalogReference;
use super::runner::{CommandLine, CommandRunner, RunError};
use crate::{ImagesetError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Output format requested from the render tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Tool default; no `--output` flag is passed
    #[default]
    Yaml,
    Json,
}

pub struct CatalogRenderer {
    runner: Arc<dyn CommandRunner>,
    tool: String,
    skip_tls: bool,
    timeout: Duration,
}

impl CatalogRenderer {
    pub fn new(runner: Arc<dyn CommandRunner>, tool: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            tool: tool.into(),
            skip_tls: false,
            timeout,
        }
    }

    /// Skip registry TLS verification (`--skip-tls`)
    pub fn skip_tls(mut self, skip: bool) -> Self {
        self.skip_tls = skip;
        self
    }

    /// Build the render invocation for a catalog
    pub fn build_command(&self, reference: &CatalogReference, format: OutputFormat) -> CommandLine {
        let mut command = CommandLine::new(&self.tool).arg("render");
        if self.skip_tls {
            command = command.arg("--skip-tls");
        }
        command = command.arg(reference.to_string());
        if format == OutputFormat::Json {
            command = command.arg("--output").arg("json");
        }
        command
    }

    /// Render the catalog and return the raw JSON document stream
    pub async fn render(&self, reference: &CatalogReference) -> Result<String> {
        let catalog = reference.to_string();
        if reference.version().is_none() {
            return Err(ImagesetError::catalog(
                "Catalog reference must carry a :v<major>.<minor> tag before rendering",
                Some(&catalog),
                None,
            ));
        }

        let command = self.build_command(reference, OutputFormat::Json);
        info!("Rendering catalog {} (timeout {:?})", catalog, self.timeout);

        let output = self
            .runner
            .run(&command, self.timeout)
            .await
            .map_err(|e| match e {
                RunError::Timeout(_) => {
                    ImagesetError::render_timeout(&catalog, self.timeout.as_secs())
                }
                other => ImagesetError::catalog_render(
                    format!("Failed to start {}: {}", self.tool, other),
                    &catalog,
                    None,
                ),
            })?;

        if !output.success() {
            warn!("{} render failed for {}: {}", self.tool, catalog, output.stderr.trim());
            return Err(ImagesetError::catalog_render(
                format!("{} render exited with code {}", self.tool, output.exit_code),
                &catalog,
                Some(output.stderr.trim().to_string()),
            ));
        }

        if output.stdout.trim().is_empty() {
            return Err(ImagesetError::catalog_render(
                format!("{} render produced no output", self.tool),
                &catalog,
                None,
            ));
        }

        info!("Rendered {} ({} bytes)", catalog, output.stdout.len());
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::runner::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;

    const CATALOG: &str = "registry.redhat.io/redhat/redhat-operator-index:v4.18";

    fn renderer(runner: ScriptedRunner) -> CatalogRenderer {
        CatalogRenderer::new(Arc::new(runner), "opm", Duration::from_secs(180))
    }

    #[test]
    fn test_default_command_verifies_tls() {
        let reference = CatalogReference::parse(CATALOG).unwrap();
        let command = renderer(ScriptedRunner::new()).build_command(&reference, OutputFormat::Yaml);

        assert_eq!(command.program, "opm");
        assert_eq!(command.args, vec!["render", CATALOG]);
        assert!(!command.has_arg("--skip-tls"));
        assert!(!command.has_arg("--output"));
    }

    #[test]
    fn test_skip_tls_and_json_output() {
        let reference = CatalogReference::parse(CATALOG).unwrap();
        let command = renderer(ScriptedRunner::new())
            .skip_tls(true)
            .build_command(&reference, OutputFormat::Json);

        assert_eq!(
            command.args,
            vec!["render", "--skip-tls", CATALOG, "--output", "json"]
        );
    }

    #[tokio::test]
    async fn test_render_returns_stdout() {
        let runner = ScriptedRunner::new().ok("render", r#"{"schema":"olm.package","name":"a"}"#);
        let reference = CatalogReference::parse(CATALOG).unwrap();
        let stream = renderer(runner).render(&reference).await.unwrap();
        assert!(stream.contains("olm.package"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_carries_stderr() {
        let runner = ScriptedRunner::new().respond("render", 1, "", "unauthorized: authentication required");
        let reference = CatalogReference::parse(CATALOG).unwrap();
        let err = renderer(runner).render(&reference).await.unwrap_err();

        match err {
            ImagesetError::CatalogRender { stderr, timed_out, .. } => {
                assert_eq!(stderr.as_deref(), Some("unauthorized: authentication required"));
                assert!(!timed_out);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_tagged() {
        let runner = ScriptedRunner::new().timeout("render");
        let reference = CatalogReference::parse(CATALOG).unwrap();
        let err = renderer(runner).render(&reference).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn test_empty_output_is_an_error() {
        let runner = ScriptedRunner::new().ok("render", "  \n");
        let reference = CatalogReference::parse(CATALOG).unwrap();
        assert!(renderer(runner).render(&reference).await.is_err());
    }

    #[tokio::test]
    async fn test_unversioned_reference_is_rejected_without_running() {
        let runner = Arc::new(ScriptedRunner::new());
        let renderer = CatalogRenderer::new(runner.clone(), "opm", Duration::from_secs(1));
        let reference = CatalogReference::parse("registry.redhat.io/redhat/redhat-operator-index").unwrap();

        assert!(renderer.render(&reference).await.is_err());
        assert_eq!(runner.call_count(), 0);
    }
}

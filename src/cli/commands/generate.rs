use super::{CommandContext, CommandHandler};
use crate::catalog::CatalogReference;
use crate::cli::GenerateArgs;
use crate::imageset::{render, CatalogHints, GenerateRequest, OperatorInput};
use crate::validation;
use crate::{ImagesetError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

/// Handler for the `generate` command
pub struct GenerateCommand {
    pub args: GenerateArgs,
}

#[async_trait]
impl CommandHandler for GenerateCommand {
    async fn run(&self, context: &CommandContext) -> Result<String> {
        let request = self.request()?;

        let warnings = validation::validate_request(&request).into_result()?;
        for warning in &warnings {
            warn!("{}", warning);
        }

        let aliases = context.settings.aliases().clone();
        let default_catalog = &context.settings.default_catalog;
        let document = if self.args.discover_channels {
            let hints = self.discover_hints(&request, context).await?;
            request.build_per_catalog(aliases, default_catalog, &hints)?
        } else {
            request.build(aliases, default_catalog, None)?
        };
        let yaml = render::render(&document)
            .map_err(|e| ImagesetError::generation(e.to_string(), "serialize"))?;

        if let Some(path) = &self.args.output {
            std::fs::write(path, &yaml).map_err(|e| {
                ImagesetError::file_operation("Failed to write ImageSetConfiguration", path, "write", Some(e))
            })?;
            info!("ImageSetConfiguration saved to {}", path.display());
        }

        if context.json {
            let value = json!({
                "success": true,
                "yaml": yaml,
                "warnings": warnings,
                "output": self.args.output.as_ref().map(|p| p.display().to_string()),
                "timestamp": Utc::now().to_rfc3339(),
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        match &self.args.output {
            Some(path) => Ok(format!("ImageSetConfiguration saved to {}", path.display())),
            None => Ok(yaml),
        }
    }

    fn name(&self) -> &'static str {
        "generate"
    }
}

impl GenerateCommand {
    pub fn new(args: GenerateArgs) -> Self {
        Self { args }
    }

    /// The request file when given, else a request assembled from flags
    pub fn request(&self) -> Result<GenerateRequest> {
        if let Some(path) = &self.args.request {
            return GenerateRequest::load(path);
        }

        let args = &self.args;
        let request = GenerateRequest {
            ocp_versions: args.ocp_versions.clone(),
            ocp_channel: args.channel.clone(),
            ocp_min_version: args.min_version.clone(),
            ocp_max_version: args.max_version.clone(),
            operators: args
                .operators
                .iter()
                .map(|name| OperatorInput::from(name.as_str()))
                .collect(),
            operator_catalogs: args.catalogs.clone(),
            additional_images: args.images.clone(),
            kubevirt_container: args.kubevirt,
            archive_size: args.archive_size,
            ocp_version: args.catalog_version.clone(),
            ..Default::default()
        };
        Ok(request.normalized())
    }

    /// Channel hints from the operator cache of every catalog that will
    /// hold operators, pinned catalogs included
    async fn discover_hints(
        &self,
        request: &GenerateRequest,
        context: &CommandContext,
    ) -> Result<CatalogHints> {
        let pipeline = context.pipeline();
        let mut hints = CatalogHints::new();

        for catalog in request.catalogs_in_use(&context.settings.default_catalog) {
            let reference = CatalogReference::parse(&catalog)?;
            let reference = match (&request.ocp_version, reference.version()) {
                (Some(ocp_version), _) => reference.with_version(ocp_version)?,
                (None, Some(_)) => reference,
                (None, None) => {
                    return Err(ImagesetError::configuration(
                        "Channel discovery needs a catalog version (--catalog-version or a :vX.Y tag)",
                        Some("catalog"),
                        Some(&catalog),
                    ))
                }
            };
            let discovered = pipeline.channel_hints(&reference).await?;
            hints.insert(&reference, discovered);
        }

        info!("Discovered channels for {} packages", hints.len());
        Ok(hints)
    }
}

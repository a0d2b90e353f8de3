use super::{CommandContext, CommandHandler};
use crate::validation;
use crate::Result;
use async_trait::async_trait;

/// Handler for the `catalogs` command
pub struct CatalogsCommand {
    pub version: String,
    pub probe: bool,
}

#[async_trait]
impl CommandHandler for CatalogsCommand {
    async fn run(&self, context: &CommandContext) -> Result<String> {
        let version = validation::validate_version(&self.version)?;
        let directory = context.catalogs();

        if self.probe {
            let probed = directory.probe(&version).await?;
            return context.format(&probed, |probed| {
                probed
                    .iter()
                    .map(|p| {
                        let status = match (&p.error, p.validated) {
                            (Some(error), _) => format!("error: {error}"),
                            (None, true) => format!("{} operators", p.operators_count),
                            (None, false) => "unavailable".to_string(),
                        };
                        format!("{}\t{}\t{}", p.entry.name, p.entry.url, status)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }

        let entries = directory.for_version(&version)?;
        context.format(&entries, |entries| {
            entries
                .iter()
                .map(|e| {
                    let marker = if e.default { "\t(default)" } else { "" };
                    format!("{}\t{}{}", e.name, e.url, marker)
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    fn name(&self) -> &'static str {
        "catalogs"
    }
}

impl CatalogsCommand {
    pub fn new(version: String, probe: bool) -> Self {
        Self { version, probe }
    }
}

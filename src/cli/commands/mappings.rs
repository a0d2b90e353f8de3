use super::{CommandContext, CommandHandler};
use crate::Result;
use async_trait::async_trait;

/// Handler for the `mappings` command
pub struct MappingsCommand;

#[async_trait]
impl CommandHandler for MappingsCommand {
    async fn run(&self, context: &CommandContext) -> Result<String> {
        let aliases = context.settings.aliases();
        context.format(aliases, |aliases| {
            aliases
                .iter()
                .map(|(alias, package)| format!("{alias} -> {package}"))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    fn name(&self) -> &'static str {
        "mappings"
    }
}

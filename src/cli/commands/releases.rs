use super::{CommandContext, CommandHandler};
use crate::validation;
use crate::Result;
use async_trait::async_trait;

/// Handler for the `releases` command
pub struct ReleasesCommand {
    /// List channels of this release instead of releases
    pub channels_for: Option<String>,
    /// List patch releases of this channel instead of releases
    pub channel: Option<String>,
    pub refresh: bool,
}

#[async_trait]
impl CommandHandler for ReleasesCommand {
    async fn run(&self, context: &CommandContext) -> Result<String> {
        let catalog = context.releases();

        let values = match (&self.channels_for, &self.channel) {
            (Some(release), _) => {
                let release = validation::validate_version(release)?;
                if self.refresh {
                    catalog.refresh_channels(&release).await?
                } else {
                    catalog.channels(&release).await?
                }
            }
            (None, Some(channel)) => {
                let channel = validation::validate_channel(channel)?;
                if self.refresh {
                    catalog.refresh_channel_releases(&channel).await?
                } else {
                    catalog.channel_releases(&channel).await?
                }
            }
            (None, None) => {
                let snapshot = if self.refresh {
                    catalog.refresh_releases().await?
                } else {
                    catalog.releases().await?
                };
                if context.json {
                    return Ok(serde_json::to_string_pretty(&snapshot)?);
                }
                snapshot.releases
            }
        };

        context.format(&values, |values| values.join("\n"))
    }

    fn name(&self) -> &'static str {
        "releases"
    }
}

impl ReleasesCommand {
    pub fn new(channels_for: Option<String>, channel: Option<String>, refresh: bool) -> Self {
        Self {
            channels_for,
            channel,
            refresh,
        }
    }
}

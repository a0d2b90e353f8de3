use super::{CommandContext, CommandHandler};
use crate::imageset::GenerateRequest;
use crate::validation::{self, ValidationReport};
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Handler for the `validate` command
pub struct ValidateCommand {
    pub request_file: PathBuf,
}

#[async_trait]
impl CommandHandler for ValidateCommand {
    async fn run(&self, context: &CommandContext) -> Result<String> {
        let request = GenerateRequest::load(&self.request_file)?;
        let report = validation::validate_request(&request);

        // Errors surface through the error path so the exit status reflects them
        report.clone().into_result()?;

        context.format(&report, |report| self.summary(report))
    }

    fn name(&self) -> &'static str {
        "validate"
    }
}

impl ValidateCommand {
    pub fn new(request_file: PathBuf) -> Self {
        Self { request_file }
    }

    fn summary(&self, report: &ValidationReport) -> String {
        let mut lines = vec![format!("{} is valid", self.request_file.display())];
        lines.extend(report.warnings.iter().map(|w| format!("warning: {w}")));
        lines.join("\n")
    }
}

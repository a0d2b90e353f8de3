//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use imageset::catalog::{CommandLine, CommandRunner, RunError, RunOutput};
use imageset::config::Settings;
use std::path::Path;
use std::sync::{Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_test_writer().with_target(true))
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A rendered catalog stream with two channels for cluster-logging and one
/// deprecated bundle capped by olm.maxOpenShiftVersion
pub const LOGGING_CATALOG: &str = r#"
{"schema":"olm.package","name":"cluster-logging","defaultChannel":"stable-5.8","description":"Logging for OpenShift"}
{"schema":"olm.channel","package":"cluster-logging","name":"stable-5.8","entries":[{"name":"cluster-logging.v5.8.1"},{"name":"cluster-logging.v5.8.0"}]}
{"schema":"olm.channel","package":"cluster-logging","name":"stable-5.9","entries":[{"name":"cluster-logging.v5.9.0","replaces":"cluster-logging.v5.8.1"}]}
{"schema":"olm.bundle","name":"cluster-logging.v5.8.0","package":"cluster-logging","properties":[{"type":"olm.package","value":{"packageName":"cluster-logging","version":"5.8.0"}},{"type":"olm.maxOpenShiftVersion","value":"4.15"}]}
{"schema":"olm.bundle","name":"cluster-logging.v5.8.1","package":"cluster-logging","properties":[{"type":"olm.package","value":{"packageName":"cluster-logging","version":"5.8.1"}},{"type":"olm.csv.metadata","value":{"keywords":["logging","observability"],"description":"Collects and forwards logs"}}]}
{"schema":"olm.bundle","name":"cluster-logging.v5.9.0","package":"cluster-logging","properties":[{"type":"olm.package","value":{"packageName":"cluster-logging","version":"5.9.0"}}]}
"#;

/// A certified catalog stream whose one package has two numbered channels
pub const CERTIFIED_CATALOG: &str = r#"
{"schema":"olm.package","name":"gpu-operator-certified","defaultChannel":"stable-24.3"}
{"schema":"olm.channel","package":"gpu-operator-certified","name":"stable-24.3","entries":[{"name":"gpu-operator-certified.v24.3.0"}]}
{"schema":"olm.channel","package":"gpu-operator-certified","name":"stable-24.6","entries":[{"name":"gpu-operator-certified.v24.6.1"}]}
{"schema":"olm.bundle","name":"gpu-operator-certified.v24.3.0","package":"gpu-operator-certified","properties":[{"type":"olm.package","value":{"packageName":"gpu-operator-certified","version":"24.3.0"}}]}
{"schema":"olm.bundle","name":"gpu-operator-certified.v24.6.1","package":"gpu-operator-certified","properties":[{"type":"olm.package","value":{"packageName":"gpu-operator-certified","version":"24.6.1"}}]}
"#;

/// Answers each command with the first scripted response whose needle
/// appears in the command line, and records every call
#[derive(Default)]
pub struct FakeRunner {
    responses: Vec<(String, RunOutput)>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, needle: &str, stdout: &str) -> Self {
        self.responses.push((
            needle.to_string(),
            RunOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: 0,
            },
        ));
        self
    }

    pub fn fail(mut self, needle: &str, stderr: &str) -> Self {
        self.responses.push((
            needle.to_string(),
            RunOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code: 1,
            },
        ));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &CommandLine, _timeout: Duration) -> Result<RunOutput, RunError> {
        let line = command.display();
        self.calls.lock().unwrap().push(line.clone());
        self.responses
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .ok_or_else(|| RunError::NotFound(command.program.clone()))
    }
}

/// Default settings with the cache rooted in `dir`
pub fn settings_in(dir: &Path) -> Settings {
    Settings {
        data_dir: dir.to_path_buf(),
        ..Settings::default()
    }
}

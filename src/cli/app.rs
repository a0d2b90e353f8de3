use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// imageset: build oc-mirror ImageSetConfiguration documents
#[derive(Parser, Debug)]
#[command(name = "imageset")]
#[command(version)]
#[command(about = "Generate ImageSetConfiguration documents for disconnected OpenShift mirroring")]
#[command(
    long_about = "imageset assembles platform channels, operator catalogs, additional images and Helm charts into an oc-mirror ImageSetConfiguration, backed by a cache of rendered operator catalogs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Cache directory, overriding settings
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Print results and errors as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an ImageSetConfiguration
    Generate(GenerateArgs),

    /// Check a request file without generating
    Validate {
        /// Request file (JSON or YAML)
        request: PathBuf,
    },

    /// List OCP releases, channels of a release, or releases in a channel
    Releases {
        /// List channels for this X.Y release
        #[arg(long, conflicts_with = "channel")]
        channels: Option<String>,

        /// List patch releases in this channel
        #[arg(long)]
        channel: Option<String>,

        /// Ignore the cache and query the mirror tool
        #[arg(long)]
        refresh: bool,
    },

    /// List operator catalogs for an OCP release
    Catalogs {
        /// OCP release (X.Y)
        version: String,

        /// Check each catalog with the mirror tool
        #[arg(long)]
        probe: bool,
    },

    /// List operators in a catalog
    Operators {
        /// Catalog reference (defaults to the configured default catalog)
        #[arg(long)]
        catalog: Option<String>,

        /// OCP release (X.Y) the catalog is tagged with
        #[arg(long)]
        version: String,

        /// Re-render the catalog even when cached
        #[arg(long)]
        refresh: bool,

        /// Only list the channels of this package
        #[arg(long)]
        package: Option<String>,

        /// Write the intermediate bundle and channel tables to this directory
        #[arg(long, conflicts_with = "package")]
        dump_tables: Option<PathBuf>,
    },

    /// Show the operator alias table
    Mappings,
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Request file (JSON or YAML); other flags are ignored when given
    #[arg(long)]
    pub request: Option<PathBuf>,

    /// Explicit OCP releases (legacy list)
    #[arg(long = "ocp-versions", value_delimiter = ',')]
    pub ocp_versions: Vec<String>,

    /// Platform channel
    #[arg(long)]
    pub channel: Option<String>,

    #[arg(long)]
    pub min_version: Option<String>,

    #[arg(long)]
    pub max_version: Option<String>,

    /// Operator names or aliases
    #[arg(long, value_delimiter = ',')]
    pub operators: Vec<String>,

    /// Operator catalog; repeat for several
    #[arg(long = "catalog")]
    pub catalogs: Vec<String>,

    /// OCP release the catalogs are tagged with
    #[arg(long)]
    pub catalog_version: Option<String>,

    /// Additional image; repeat for several
    #[arg(long = "image")]
    pub images: Vec<String>,

    /// Mirror the KubeVirt container image
    #[arg(long)]
    pub kubevirt: bool,

    /// Archive size in GiB
    #[arg(long)]
    pub archive_size: Option<u64>,

    /// Fill operator channels from the catalog cache
    #[arg(long)]
    pub discover_channels: bool,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Commands {
    /// Get the command name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Generate(_) => "generate",
            Commands::Validate { .. } => "validate",
            Commands::Releases { .. } => "releases",
            Commands::Catalogs { .. } => "catalogs",
            Commands::Operators { .. } => "operators",
            Commands::Mappings => "mappings",
        }
    }

    /// Whether the command may run an external tool
    pub fn runs_tools(&self) -> bool {
        match self {
            Commands::Generate(args) => args.discover_channels,
            Commands::Releases { .. } | Commands::Operators { .. } => true,
            Commands::Catalogs { probe, .. } => *probe,
            Commands::Validate { .. } | Commands::Mappings => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_parsing() {
        let cli = Cli::parse_from([
            "imageset",
            "generate",
            "--ocp-versions",
            "4.16.1,4.16.5",
            "--operators",
            "logging,gitops",
            "--catalog",
            "registry.redhat.io/redhat/redhat-operator-index",
            "--catalog-version",
            "4.16",
            "--kubevirt",
            "-o",
            "imageset-config.yaml",
        ]);

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.ocp_versions, vec!["4.16.1", "4.16.5"]);
                assert_eq!(args.operators, vec!["logging", "gitops"]);
                assert_eq!(args.catalogs.len(), 1);
                assert_eq!(args.catalog_version.as_deref(), Some("4.16"));
                assert!(args.kubevirt);
                assert_eq!(args.output, Some(PathBuf::from("imageset-config.yaml")));
            }
            other => panic!("Wrong command parsed: {other:?}"),
        }
        assert_eq!(cli.log_level, LogLevel::Info);
        assert!(!cli.json);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["imageset", "mappings", "--json", "--log-level", "debug"]);
        assert!(cli.json);
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.command.name(), "mappings");
        assert!(!cli.command.runs_tools());
    }

    #[test]
    fn test_releases_flags_conflict() {
        let result = Cli::try_parse_from([
            "imageset",
            "releases",
            "--channels",
            "4.16",
            "--channel",
            "stable-4.16",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_operators_requires_version() {
        assert!(Cli::try_parse_from(["imageset", "operators"]).is_err());

        let cli = Cli::parse_from(["imageset", "operators", "--version", "4.18", "--package", "cluster-logging"]);
        match cli.command {
            Commands::Operators { version, package, refresh, .. } => {
                assert_eq!(version, "4.18");
                assert_eq!(package.as_deref(), Some("cluster-logging"));
                assert!(!refresh);
            }
            other => panic!("Wrong command parsed: {other:?}"),
        }
    }
}

//! llmdeploy CLI - provision SageMaker deployer users and deploy LLM endpoints.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use llmdeploy_aws::EndpointType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "llmdeploy")]
#[command(about = "Deploy Hugging Face LLMs to SageMaker")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to llmdeploy.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an IAM user for SageMaker deployments and save its access key
    CreateUser {
        /// IAM user name
        #[arg(short, long, default_value = llmdeploy_aws::DEFAULT_USERNAME)]
        username: String,

        /// AWS region (overrides AWS_REGION)
        #[arg(short, long)]
        region: Option<String>,

        /// Credentials file to write
        #[arg(short, long, default_value = llmdeploy_aws::DEFAULT_CREDENTIALS_FILE)]
        output: PathBuf,

        /// Delete the user again if provisioning fails part-way
        #[arg(long)]
        rollback: bool,
    },

    /// Deploy the configured model to a SageMaker endpoint
    Deploy {
        /// Endpoint topology
        #[arg(long, value_enum, default_value_t = EndpointKind::ModelBased)]
        endpoint_type: EndpointKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EndpointKind {
    ModelBased,
    InferenceComponentBased,
}

impl From<EndpointKind> for EndpointType {
    fn from(kind: EndpointKind) -> Self {
        match kind {
            EndpointKind::ModelBased => Self::ModelBased,
            EndpointKind::InferenceComponentBased => Self::InferenceComponentBased,
        }
    }
}

/// `RUST_LOG` when set, otherwise `info`; `--verbose` raises the level to debug.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let filter = rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    if verbose {
        filter.add_directive(tracing::Level::DEBUG.into())
    } else {
        filter
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(
            std::env::var("RUST_LOG").ok().as_deref(),
            cli.verbose,
        ))
        .init();

    let config = cli.config.as_deref();
    let result: Result<(), anyhow::Error> = match cli.command {
        Commands::CreateUser {
            username,
            region,
            output,
            rollback,
        } => {
            commands::create_user::run(
                config,
                commands::create_user::CreateUserArgs {
                    username,
                    region,
                    output,
                    rollback,
                },
            )
            .await
        }
        Commands::Deploy { endpoint_type } => {
            commands::deploy::run(config, endpoint_type.into()).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn deploy_defaults_to_model_based() {
        let cli = Cli::parse_from(["llmdeploy", "deploy"]);
        let Commands::Deploy { endpoint_type } = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(
            EndpointType::from(endpoint_type),
            EndpointType::ModelBased
        );
    }

    #[test]
    fn create_user_defaults() {
        let cli = Cli::parse_from(["llmdeploy", "create-user", "--rollback"]);
        let Commands::CreateUser {
            username,
            region,
            output,
            rollback,
        } = cli.command
        else {
            panic!("expected create-user");
        };
        assert_eq!(username, "sagemaker-deployer-3");
        assert_eq!(region, None);
        assert_eq!(output, PathBuf::from("sagemaker_user_credentials.json"));
        assert!(rollback);
    }

    #[test]
    fn log_level_follows_rust_log_unless_verbose() {
        use tracing_subscriber::filter::LevelFilter;

        assert_eq!(log_filter(None, false).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(Some("debug"), false).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(Some("warn"), false).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(log_filter(None, true).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "llmdeploy",
            "deploy",
            "--endpoint-type",
            "inference-component-based",
            "--config",
            "prod.toml",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
    }
}

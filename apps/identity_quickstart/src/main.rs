use std::{path::PathBuf, sync::Arc};

use clap::Parser as _;
use color_eyre::eyre::Context as _;
use identity_quickstart::{
	crypto::OsCrypto,
	dwn::Dwn,
	workflow::{
		self, LocalWeb5, QuickstartConfig, QuickstartOutcome, DEFAULT_CREDENTIAL_TYPE,
	},
	MigratedDbPool,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(clap::Parser, Debug)]
struct Cli {
	/// Password for the identity vault.
	#[clap(
		long,
		env = "QUICKSTART_PASSWORD",
		default_value = workflow::DEFAULT_PASSWORD,
		hide_default_value = true,
		hide_env_values = true
	)]
	password: String,
	/// Where to store records. Uses an in-memory database if unset.
	#[clap(long, env)]
	db_path: Option<PathBuf>,
	#[clap(long, default_value = DEFAULT_CREDENTIAL_TYPE)]
	credential_type: String,
	/// The `name` claim of the credential.
	#[clap(long)]
	name: Option<String>,
	/// The `expertiseLevel` claim of the credential.
	#[clap(long)]
	expertise_level: Option<String>,
	/// Also verify the signature of the credential read back from the DWN.
	#[clap(long)]
	verify: bool,
}

impl Cli {
	fn quickstart_config(&self) -> QuickstartConfig {
		let mut config = QuickstartConfig::new(self.password.clone())
			.with_credential_type(self.credential_type.clone());
		if let Some(name) = &self.name {
			config = config.with_claim("name", name.clone());
		}
		if let Some(expertise_level) = &self.expertise_level {
			config = config.with_claim("expertiseLevel", expertise_level.clone());
		}
		config.verify = self.verify;
		config
	}
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or("info".into()))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let cli = Cli::parse();
	// Failures are reported, but still exit successfully.
	run_and_report(cli).await;
	Ok(())
}

/// Runs the quickstart, logging any failure instead of returning it.
async fn run_and_report(cli: Cli) -> Option<QuickstartOutcome> {
	match run(cli).await {
		Ok(outcome) => Some(outcome),
		Err(err) => {
			error!("An error occurred: {err:?}");
			None
		}
	}
}

async fn run(cli: Cli) -> color_eyre::Result<QuickstartOutcome> {
	let db_pool = match &cli.db_path {
		Some(path) => MigratedDbPool::open(path).await.wrap_err_with(|| {
			format!("failed to open database with path {}", path.display())
		})?,
		None => MigratedDbPool::in_memory()
			.await
			.wrap_err("failed to open in-memory database")?,
	};
	let api = LocalWeb5::new(Arc::new(OsCrypto), Dwn::new(db_pool));

	let outcome = workflow::run(&api, cli.quickstart_config())
		.await
		.wrap_err("quickstart did not complete")?;
	info!(did = %outcome.did, verified = outcome.verified, "quickstart complete");
	Ok(outcome)
}

#[cfg(test)]
mod test {
	use clap::CommandFactory as _;
	use identity_quickstart::workflow::{QuickstartError, Stage};

	use super::*;

	fn parse(args: &[&str]) -> Cli {
		let args = std::iter::once("identity_quickstart").chain(args.iter().copied());
		Cli::try_parse_from(args).expect("args should parse")
	}

	#[test]
	fn test_help_hides_password() {
		std::env::set_var("QUICKSTART_PASSWORD", "hunter2-secret");
		let help = Cli::command().render_long_help().to_string();
		assert!(help.contains("QUICKSTART_PASSWORD"));
		assert!(!help.contains("hunter2-secret"));
		assert!(!help.contains(workflow::DEFAULT_PASSWORD));
	}

	#[test]
	fn test_cli_maps_to_config() {
		let config = parse(&[
			"--password",
			"pw123",
			"--credential-type",
			"CourseCredential",
			"--name",
			"Bob Jones",
			"--expertise-level",
			"Expert",
			"--verify",
		])
		.quickstart_config();
		assert_eq!(config.password, "pw123");
		assert_eq!(config.credential_type, "CourseCredential");
		assert_eq!(config.schema, "CourseCredential");
		assert_eq!(config.claims["name"], "Bob Jones");
		assert_eq!(config.claims["expertiseLevel"], "Expert");
		assert!(config.claims.contains_key("completionDate"));
		assert!(config.verify);
	}

	#[test]
	fn test_cli_defaults() {
		let config = parse(&[]).quickstart_config();
		assert_eq!(config.credential_type, DEFAULT_CREDENTIAL_TYPE);
		assert_eq!(config.schema, DEFAULT_CREDENTIAL_TYPE);
		assert_eq!(config.claims["name"], "Alice Smith");
		assert_eq!(config.claims["expertiseLevel"], "Beginner");
		assert!(!config.verify);
	}

	#[tokio::test]
	async fn test_run_succeeds_with_defaults() -> eyre::Result<()> {
		let outcome = run(parse(&["--password", "pw123", "--verify"])).await?;
		assert_eq!(outcome.read_jwt, outcome.signed_jwt);
		assert!(outcome.verified);
		Ok(())
	}

	#[tokio::test]
	async fn test_stage_failure_is_only_logged() {
		let err = run(parse(&["--credential-type", " "]))
			.await
			.expect_err("a blank credential type should fail");
		let stage = err
			.chain()
			.find_map(|cause| cause.downcast_ref::<QuickstartError>())
			.map(QuickstartError::stage);
		assert_eq!(stage, Some(Stage::CreateCredential));

		// The top level handler swallows the same failure.
		assert!(run_and_report(parse(&["--credential-type", " "]))
			.await
			.is_none());
	}
}

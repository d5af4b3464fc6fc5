use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::PathBuf;
use std::process;

use bucketsync::config::Config;
use bucketsync::logging::init_tracing;
use bucketsync::mirror::MirrorBuilder;
use bucketsync::utils::{setup_signal_handlers, CancelToken};
use bucketsync::Acl;

fn command() -> Command {
	Command::new("bucketsync")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Mirror a directory or bucket prefix onto another")
		.arg(
			Arg::new("source")
				.short('s')
				.long("source")
				.value_name("LOCATION")
				.help("Source: a directory or remote://bucket/prefix"),
		)
		.arg(
			Arg::new("destination")
				.short('d')
				.long("destination")
				.value_name("LOCATION")
				.help("Destination: a directory or remote://bucket/prefix"),
		)
		.arg(
			Arg::new("max-threads")
				.short('m')
				.long("max-threads")
				.value_name("N")
				.value_parser(value_parser!(usize))
				.help("Concurrent transfers per batch [default: 12]"),
		)
		.arg(
			Arg::new("delete")
				.long("delete")
				.action(ArgAction::SetTrue)
				.help("Delete destination entries missing from the source"),
		)
		.arg(
			Arg::new("dryrun")
				.short('n')
				.long("dryrun")
				.visible_alias("dry-run")
				.action(ArgAction::SetTrue)
				.help("Show what would be done without doing it"),
		)
		.arg(
			Arg::new("acl")
				.long("acl")
				.value_name("ACL")
				.help("Canned ACL for written objects [default: private]"),
		)
		.arg(
			Arg::new("verify")
				.short('v')
				.long("verify")
				.action(ArgAction::SetTrue)
				.help("Verify the destination digest after each transfer"),
		)
		.arg(Arg::new("profile").short('p').long("profile").value_name("PROFILE").help("Credential profile"))
		.arg(Arg::new("region").short('r').long("region").value_name("REGION").help("Provider region"))
		.arg(
			Arg::new("store-root")
				.long("store-root")
				.value_name("DIR")
				.value_parser(value_parser!(PathBuf))
				.help("Directory holding the buckets of the object store"),
		)
		.arg(
			Arg::new("page-size")
				.long("page-size")
				.value_name("N")
				.value_parser(value_parser!(usize))
				.help("Objects per listing page [default: 1000]"),
		)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.value_parser(value_parser!(PathBuf))
				.help("Configuration file (TOML or JSON)"),
		)
}

/// Defaults, then config file, then environment, then flags
fn load_config(matches: &ArgMatches) -> Result<Config, Box<dyn Error>> {
	let mut config = match matches.get_one::<PathBuf>("config") {
		Some(path) => Config::from_file(path)?,
		None => Config::default(),
	};
	config.apply_env()?;

	if let Some(source) = matches.get_one::<String>("source") {
		config.source = source.clone();
	}
	if let Some(destination) = matches.get_one::<String>("destination") {
		config.destination = destination.clone();
	}
	if let Some(max_threads) = matches.get_one::<usize>("max-threads") {
		config.max_threads = *max_threads;
	}
	if matches.get_flag("delete") {
		config.delete = true;
	}
	if matches.get_flag("dryrun") {
		config.dry_run = true;
	}
	if let Some(acl) = matches.get_one::<String>("acl") {
		config.acl = acl.parse::<Acl>()?;
	}
	if matches.get_flag("verify") {
		config.verify = true;
	}
	if let Some(profile) = matches.get_one::<String>("profile") {
		config.profile = Some(profile.clone());
	}
	if let Some(region) = matches.get_one::<String>("region") {
		config.region = Some(region.clone());
	}
	if let Some(root) = matches.get_one::<PathBuf>("store-root") {
		config.store_root = Some(root.clone());
	}
	if let Some(page_size) = matches.get_one::<usize>("page-size") {
		config.page_size = *page_size;
	}
	Ok(config)
}

async fn run(matches: ArgMatches) -> Result<(), Box<dyn Error>> {
	let config = load_config(&matches)?;
	init_tracing(&config.log_level);

	let cancel = CancelToken::new();
	setup_signal_handlers(cancel.clone());

	MirrorBuilder::from_config(config).cancel_token(cancel).run().await?;
	Ok(())
}

#[tokio::main]
async fn main() {
	let matches = command().get_matches();
	if let Err(e) = run(matches).await {
		eprintln!("bucketsync: {}", e);
		process::exit(1);
	}
}

// vim: ts=4

use std::path::Path;

use anyhow::{Context, Result as AnyhowResult};

mod topng;
mod frompng;
mod info;


fn construct_app() -> clap::Command<'static> {
	clap::Command::new("hiptool")
		.version(clap::crate_version!())
		.setting(clap::AppSettings::DeriveDisplayOrder)
		.arg(clap::arg!(loglevel: -L "Global log verbosity level")
			.ignore_case(true)
			.possible_values(["Error", "Warn", "Info", "Debug", "Trace"])
			.default_value("Info"))
		.subcommand(clap::Command::new("topng")
			.about("Convert a HIP file to PNG next to it")
			.visible_alias("extract")
			.arg(clap::arg!(hip: <HIP> "HIP input file")))
		.subcommand(clap::Command::new("frompng")
			.about("Convert a PNG file to HIP next to it")
			.arg(clap::arg!(png: <PNG> "PNG input file (8-bit indexed or 8-bit RGBA)")))
		.subcommand(clap::Command::new("info")
			.about("Parse a HIP file and log details")
			.arg(clap::arg!(brief: -b --brief "Do not prepend file name to output").takes_value(false))
			.arg(clap::arg!(serialize_back: -S "Serialize HIP back in memory and compare with the input").takes_value(false))
			.arg(clap::arg!(input: <INPUT> ... "HIP file to parse")))
}


/// Every input named by `arg` must exist before any file is touched.
fn check_inputs_exist(matches: &clap::ArgMatches, arg: &str) -> AnyhowResult<()> {
	for path in matches.values_of(arg).into_iter().flatten() {
		if !Path::new(path).exists() {
			anyhow::bail!("{path}: Input file does not exist");
		};
	};

	Ok(())
}


fn hiptool() -> AnyhowResult<()> {
	let matches = construct_app().get_matches_from(wild::args());
	let loglevel_str = matches.value_of("loglevel")
		.unwrap_or("Info");
	let loglevel = loglevel_str
		.parse::<tracing::Level>()
		.with_context(|| format!("Failed to parse loglevel from -L{}", loglevel_str))?;

	tracing_subscriber::fmt()
		.with_max_level(loglevel)
		.init();

	tracing::trace!("Global loglevel set to {:?}", loglevel);

	match matches.subcommand() {
		Some(("topng", matches)) => {
			check_inputs_exist(matches, "hip")?;
			topng::command_topng(matches)
		},

		Some(("frompng", matches)) => {
			check_inputs_exist(matches, "png")?;
			frompng::command_frompng(matches)
		},

		Some(("info", matches)) => {
			check_inputs_exist(matches, "input")?;
			info::command_info(matches)
		},

		Some((&_, _)) => unreachable!(),

		None => {
			let _ = construct_app().print_help();
			Ok(())
		},
	}
}


fn main() {
	if let Err(e) = hiptool() {
		tracing::error!("{:?}", e);
		std::process::exit(1);
	};
}


#[test]
fn verify_app() {
	construct_app().debug_assert();
}

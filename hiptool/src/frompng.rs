use std::path::Path;

use libhip::*;
use anyhow::{Context, Result as AnyhowResult};
use tap::prelude::*;


pub fn command_frompng(matches: &clap::ArgMatches) -> AnyhowResult<()> {
	let png_path = matches.value_of("png").expect("PNG required");
	let hip_path = Path::new(png_path).with_extension("hip");

	let mut png_file = std::fs::File::open(png_path)
		.with_context(|| format!("{png_path}: Could not open file"))?;
	let encoder = HipEncoder::read_png(&mut png_file)
		.with_context(|| format!("{png_path}: Could not read PNG image"))?;

	let hip = encoder.encode()
		.tap_ok(|h| tracing::info!("{png_path}: {:?} HIP, {}x{}", h.kind(), h.width, h.height))
		.context("Failed to encode image")?;
	let data = hip.to_bytes()
		.context("Failed to serialize HIP to bytes")?;

	std::fs::write(&hip_path, data)
		.with_context(|| format!("{}: Could not write HIP data", hip_path.display()))?;

	Ok(())
}

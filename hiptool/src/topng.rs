use std::path::Path;

use libhip::*;
use anyhow::{Context, Result as AnyhowResult};


pub fn command_topng(matches: &clap::ArgMatches) -> AnyhowResult<()> {
	let hip_path = matches.value_of("hip").expect("HIP required");
	let png_path = Path::new(hip_path).with_extension("png");

	let mut hip_file = std::fs::File::open(hip_path)
		.with_context(|| format!("{hip_path}: Could not open file"))?;
	let image = HipImage::read_from(&mut hip_file)
		.with_context(|| format!("{hip_path}: Could not read HIP image"))?;

	tracing::info!("{hip_path}: {:?} HIP, {}x{}", image.kind(), image.width, image.height);

	// Encoded in memory first so a failure leaves no partial PNG behind
	let data = HipDecoder::with_hip(image)
		.to_png_bytes()
		.context("Failed to encode PNG")?;

	std::fs::write(&png_path, data)
		.with_context(|| format!("{}: Could not write PNG data", png_path.display()))?;

	Ok(())
}

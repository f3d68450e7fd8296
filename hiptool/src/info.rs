use libhip::*;
use anyhow::{Context, Result as AnyhowResult};


pub fn command_info(matches: &clap::ArgMatches) -> AnyhowResult<()> {
	let brief = matches.is_present("brief");
	let serialize = matches.is_present("serialize_back");

	let mut result = Ok(());

	for path in matches.values_of("input").expect("INPUT required") {
		let result_now = hip_path_info(path, brief, serialize);

		if let Err(ref e) = result_now {
			tracing::error!("{path}: {e:?}");
			result = result_now;
		};
	};

	result
}


fn hip_path_info(path: &str, brief: bool, serialize_back: bool) -> AnyhowResult<()> {
	let brief_prefix = if brief {
		"".to_string()
	}
	else {
		format!("{}: ", path)
	};

	let data = std::fs::read(path).with_context(|| format!("Could not read file: {path}"))?;
	let filesize = data.len();

	println!("{brief_prefix}File size: {filesize} (0x{filesize:X})");

	let (header, body) = parse_header(&data).with_context(|| format!("Could not parse HIP header: {path}"))?;
	let kind = header.kind();

	println!("{brief_prefix}Kind: {kind:?}, {} colors", header.num_colors);
	println!("{brief_prefix}Dimensions: {}x{}", header.width, header.height);

	let (palette_size, chunk_size) = match kind {
		HipImageKind::Indexed => (HipPalette::DISK_SIZE, 2),
		HipImageKind::Direct => (0, 5),
	};
	let run_bytes = body.len().saturating_sub(palette_size);
	println!("{brief_prefix}Run data: {run_bytes} bytes, {} chunks", run_bytes / chunk_size);

	let image = HipImage::from_bytes(&data).with_context(|| format!("Could not read HipImage: {path}"))?;

	if let HipPixels::Indexed { palette, .. } = &image.pixels {
		let translucent = palette.alpha.iter().filter(|a| **a != u8::MAX).count();
		println!("{brief_prefix}Palette: {translucent} translucent entries");
	};

	if serialize_back {
		tracing::trace!("Attempting to serialize HipImage back");

		let reserialized = image.to_bytes().context("Could not serialize image to bytes")?;

		if reserialized == data {
			println!("{brief_prefix}Serialized back: identical");
		}
		else {
			let first_diff = reserialized.iter().zip(&data).position(|(a, b)| a != b);
			println!("{brief_prefix}Serialized back: DIFFERENT ({} bytes, first difference at {first_diff:?})", reserialized.len());
		};
	};

	Ok(())
}

//! PNG side of the codec: reading and writing the two PNG flavors that map
//! onto HIP images.
//!
//! Palette images go through the `png` crate directly, since their `PLTE`
//! and `tRNS` chunks have to survive untouched.  RGBA images go through
//! [`image`].


use std::io::{Read, Write};

use crate::{HipResult, HipPalette, macros};
use crate::HipError::*;

use image::{ImageEncoder, RgbaImage};


/// An 8-bit palette PNG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPng {
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// One palette index per pixel, row-major.
	pub indices: Vec<u8>,
	/// `PLTE` colors and `tRNS` alpha values.
	pub palette: HipPalette,
}


/// A decoded PNG in one of the two supported flavors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PngImage {
	/// 8-bit palette image with 256 colors.
	Indexed(IndexedPng),
	/// 8-bit RGBA image.
	Direct(RgbaImage),
}


/// Read a PNG and pick the flavor from its color type.
///
/// # Errors
/// - [`UnsupportedPngColorType`]: The PNG is neither 8-bit indexed nor 8-bit RGBA.
/// - Any error of [`load_png_indexed`] or [`load_png_direct`].
pub fn load_png<R: Read>(input: &mut R) -> HipResult<PngImage> {
	let mut data: Vec<u8> = Vec::with_capacity(64 * 1024);
	input.read_to_end(&mut data)?;

	let color_type = png::Decoder::new(&data[..])
		.read_info()?
		.info()
		.color_type;

	macros::log!(debug, "PNG color type: {:?}", color_type);

	match color_type {
		png::ColorType::Indexed => Ok(PngImage::Indexed(load_png_indexed(&data)?)),
		png::ColorType::Rgba => Ok(PngImage::Direct(load_png_direct(&data)?)),
		other => Err(UnsupportedPngColorType(format!("{:?}", other))),
	}
}


/// Decode an 8-bit palette PNG without expanding the palette.
///
/// # Errors
/// - [`PngError`]: The PNG decoder failed.
/// - [`UnsupportedPngColorType`]: The PNG is not 8-bit indexed.
/// - [`UnsupportedPngPalette`]: The `PLTE` chunk does not hold 256 colors.
/// - [`PaletteAlphaMismatch`]: The `tRNS` chunk is longer than `PLTE`.
pub fn load_png_indexed(data: &[u8]) -> HipResult<IndexedPng> {
	let mut decoder = png::Decoder::new(data);
	decoder.set_transformations(png::Transformations::IDENTITY);
	let mut reader = decoder.read_info()?;

	let (color_type, bit_depth) = {
		let info = reader.info();
		(info.color_type, info.bit_depth)
	};

	if color_type != png::ColorType::Indexed || bit_depth != png::BitDepth::Eight {
		return Err(UnsupportedPngColorType(format!("{:?} ({:?})", color_type, bit_depth)));
	};

	let palette = {
		let info = reader.info();
		let rgb = info.palette.as_deref().unwrap_or(&[]);
		HipPalette::from_rgb_and_alpha(rgb, info.trns.as_deref())?
	};

	let mut indices = vec![0u8; reader.output_buffer_size()];
	let frame = reader.next_frame(&mut indices)?;
	indices.truncate(frame.buffer_size());

	Ok(IndexedPng { width: frame.width, height: frame.height, indices, palette })
}


/// Decode an 8-bit RGBA PNG.
///
/// # Errors
/// - [`PngError`]: The PNG decoder failed.
/// - [`UnsupportedPngColorType`]: The PNG is not 8-bit RGBA.
pub fn load_png_direct(data: &[u8]) -> HipResult<RgbaImage> {
	match image::load_from_memory_with_format(data, image::ImageFormat::Png)? {
		image::DynamicImage::ImageRgba8(image) => Ok(image),
		other => Err(UnsupportedPngColorType(format!("{:?}", other.color()))),
	}
}


/// Encode an 8-bit palette PNG, writing `PLTE` and a `tRNS` chunk with all
/// 256 alpha values.
///
/// # Errors
/// - [`PngError`]: The PNG encoder failed.
/// - [`UnexpectedIoError`]: Writing to `output` failed.
pub fn save_png_indexed<W: Write>(output: W, image: &IndexedPng) -> HipResult<()> {
	let mut encoder = png::Encoder::new(output, image.width, image.height);
	encoder.set_color(png::ColorType::Indexed);
	encoder.set_depth(png::BitDepth::Eight);
	encoder.set_palette(image.palette.rgb_bytes());
	encoder.set_trns(image.palette.alpha.to_vec());

	let mut writer = encoder.write_header()?;
	writer.write_image_data(&image.indices)?;
	writer.finish()?;

	Ok(())
}


/// Encode an 8-bit RGBA PNG.
///
/// # Errors
/// - [`PngError`]: The PNG encoder failed.
/// - [`UnexpectedIoError`]: Writing to `output` failed.
pub fn save_png_direct<W: Write>(output: W, image: &RgbaImage) -> HipResult<()> {
	image::codecs::png::PngEncoder::new(output)
		.write_image(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)?;

	Ok(())
}


#[cfg(test)]
fn gradient_palette() -> HipPalette {
	let mut palette = HipPalette::default();

	for i in 0..256usize {
		palette.colors[i] = image::Rgb([i as u8, 255 - i as u8, (i * 7) as u8]);
		palette.alpha[i] = (i / 2) as u8;
	};

	palette
}


#[test]
fn indexed_png_roundtrip() {
	let source = IndexedPng {
		width: 5,
		height: 3,
		indices: (0..15).map(|i| (i * 17) as u8).collect(),
		palette: gradient_palette(),
	};

	let mut data: Vec<u8> = vec![];
	save_png_indexed(&mut data, &source).unwrap();

	assert_eq!(load_png_indexed(&data).unwrap(), source);
	assert_eq!(load_png(&mut &data[..]).unwrap(), PngImage::Indexed(source));
}


#[test]
fn direct_png_roundtrip() {
	let source = RgbaImage::from_fn(4, 2, |x, y| image::Rgba([x as u8 * 60, y as u8 * 100, 7, 200]));

	let mut data: Vec<u8> = vec![];
	save_png_direct(&mut data, &source).unwrap();

	assert_eq!(load_png_direct(&data).unwrap(), source);
	assert_eq!(load_png(&mut &data[..]).unwrap(), PngImage::Direct(source));
}


#[test]
fn reject_rgb_png() {
	let source = image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
	let mut data: Vec<u8> = vec![];
	image::codecs::png::PngEncoder::new(&mut data)
		.write_image(source.as_raw(), 2, 2, image::ColorType::Rgb8)
		.unwrap();

	assert!(matches!(load_png(&mut &data[..]), Err(UnsupportedPngColorType(_))));
	assert!(matches!(load_png_direct(&data), Err(UnsupportedPngColorType(_))));
	assert!(matches!(load_png_indexed(&data), Err(UnsupportedPngColorType(_))));
}


#[test]
fn reject_short_png_palette() {
	let mut data: Vec<u8> = vec![];
	let mut encoder = png::Encoder::new(&mut data, 2, 1);
	encoder.set_color(png::ColorType::Indexed);
	encoder.set_depth(png::BitDepth::Eight);
	encoder.set_palette(vec![0u8, 0, 0, 255, 255, 255]);
	encoder.write_header().unwrap().write_image_data(&[0, 1]).unwrap();

	assert_eq!(load_png_indexed(&data), Err(UnsupportedPngPalette(2)));
}


#[cfg(test)]
struct ShortWriter {
	remaining: usize,
}


#[cfg(test)]
impl Write for ShortWriter {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		if self.remaining == 0 {
			return Err(std::io::Error::new(std::io::ErrorKind::Other, "device full"));
		};

		let len = buf.len().min(self.remaining);
		self.remaining -= len;
		Ok(len)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}


#[test]
fn indexed_png_reports_failed_trailer() {
	let source = IndexedPng { width: 2, height: 2, indices: vec![0, 1, 2, 3], palette: gradient_palette() };

	let mut data: Vec<u8> = vec![];
	save_png_indexed(&mut data, &source).unwrap();

	// Everything but the 12-byte IEND chunk fits
	let output = ShortWriter { remaining: data.len() - 12 };
	assert_eq!(save_png_indexed(output, &source), Err(UnexpectedIoError(std::io::ErrorKind::Other)));
}

use std::io::Write;

use crate::{HipImage, HipPixels, HipResult, IndexedPng, PngImage, save_png_direct, save_png_indexed, macros};
use crate::HipError::*;

use image::RgbaImage;


/// Wrapper around [`HipImage`] that converts it into PNG images
#[allow(missing_debug_implementations)]
#[derive(Clone)]
pub struct HipDecoder {
	hip: HipImage,
}


impl HipDecoder {
	/// Create an instance of `Self` from a [`HipImage`].
	pub fn with_hip(hip: HipImage) -> Self {
		Self { hip }
	}


	/// Map the image onto the matching PNG flavor: indexed images become
	/// palette PNGs, direct-color images become RGBA PNGs.
	///
	/// # Errors
	/// - [`EmptyImage`]: The image holds no pixels.
	/// - [`PixelBufferSizeMismatch`]: The pixel buffer is not `width * height` long.
	pub fn decode(&self) -> HipResult<PngImage> {
		let HipImage { width, height, pixels } = &self.hip;

		self.hip.check_pixels()?;

		let png = match pixels {
			HipPixels::Indexed { palette, indices } => {
				PngImage::Indexed(IndexedPng { width: *width, height: *height, indices: indices.clone(), palette: palette.clone() })
			},

			HipPixels::Direct { rgba } => {
				let raw: Vec<u8> = rgba.iter().flat_map(|p| p.0).collect();
				let image = RgbaImage::from_raw(*width, *height, raw).ok_or(ImageTooLarge)?;
				PngImage::Direct(image)
			},
		};

		Ok(png)
	}


	/// Encode the image as PNG into `output`.
	///
	/// # Errors
	/// - Any error of [`HipDecoder::decode`].
	/// - [`PngError`]: The PNG encoder failed.
	/// - [`UnexpectedIoError`]: Writing to `output` failed.
	pub fn write_png<W: Write>(&self, output: W) -> HipResult<()> {
		match self.decode()? {
			PngImage::Indexed(png) => save_png_indexed(output, &png),
			PngImage::Direct(png) => save_png_direct(output, &png),
		}
	}


	/// Encode the image as PNG in memory.
	///
	/// # Errors
	/// - Any error of [`HipDecoder::write_png`].
	pub fn to_png_bytes(&self) -> HipResult<Vec<u8>> {
		let mut buf: Vec<u8> = Vec::with_capacity(64 * 1024);
		self.write_png(&mut buf)?;
		macros::log!(debug, "Encoded {}x{} PNG, {} bytes", self.hip.width, self.hip.height, buf.len());
		Ok(buf)
	}


	/// Expand the image into RGBA pixels, looking indexed pixels up in the
	/// palette.
	///
	/// # Errors
	/// - Any error of [`HipDecoder::decode`].
	///
	/// # Example
	/// ```
	/// # use libhip::*;
	/// let mut palette = HipPalette::default();
	/// palette.colors[1] = image::Rgb([255, 255, 255]);
	/// let hip = HipImage::indexed(2, 1, palette, vec![0, 1]).unwrap();
	/// let rgba = HipDecoder::with_hip(hip).decode_rgba8().unwrap();
	/// assert_eq!(rgba.get_pixel(1, 0).0, [255, 255, 255, 255]);
	/// ```
	pub fn decode_rgba8(&self) -> HipResult<RgbaImage> {
		match self.decode()? {
			PngImage::Direct(image) => Ok(image),
			PngImage::Indexed(png) => {
				let raw: Vec<u8> = png.indices.iter().flat_map(|i| png.palette.rgba(*i).0).collect();
				RgbaImage::from_raw(png.width, png.height, raw).ok_or(ImageTooLarge)
			},
		}
	}
}


#[test]
fn decode_refuses_empty_image() {
	let decoder = HipDecoder::with_hip(HipImage::default());
	assert_eq!(decoder.decode(), Err(EmptyImage));
	assert_eq!(decoder.to_png_bytes(), Err(EmptyImage));
}


#[test]
fn decode_direct_keeps_pixels() {
	let pixels = vec![image::Rgba([1, 2, 3, 4]), image::Rgba([5, 6, 7, 8])];
	let hip = HipImage::direct(1, 2, pixels).unwrap();

	match HipDecoder::with_hip(hip).decode().unwrap() {
		PngImage::Direct(image) => assert_eq!(image.as_raw(), &vec![1u8, 2, 3, 4, 5, 6, 7, 8]),
		other => panic!("unexpected {:?}", other),
	};
}


#[test]
fn decode_rejects_what_save_rejects() {
	let indices = HipPixels::Indexed { palette: crate::HipPalette::default(), indices: vec![0; 5] };
	let hip = HipImage { width: 2, height: 2, pixels: indices };

	assert_eq!(hip.to_bytes(), Err(PixelBufferSizeMismatch { expected: 4, actual: 5 }));
	assert_eq!(HipDecoder::with_hip(hip).decode(), Err(PixelBufferSizeMismatch { expected: 4, actual: 5 }));
}

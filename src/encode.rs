use std::io::Read;

use crate::{HipImage, HipResult, PngImage, load_png, macros};
#[cfg(doc)] use crate::HipError::*;

use image::RgbaImage;
use tap::prelude::*;


/// Wrapper around a decoded PNG that converts it into a [`HipImage`]
#[allow(missing_debug_implementations)]
#[derive(Clone)]
pub struct HipEncoder {
	png: PngImage,
}


impl HipEncoder {
	/// Creates a new encoder from an already decoded PNG.
	pub fn with_png(png: PngImage) -> Self {
		Self { png }
	}


	/// Creates a new encoder for a direct-color HIP from an
	/// [`image::RgbaImage`].
	pub fn with_rgba_image(image: RgbaImage) -> Self {
		Self { png: PngImage::Direct(image) }
	}


	/// Decode a PNG from `input` and create an encoder for it.
	///
	/// # Errors
	/// - Any error of [`load_png`].
	pub fn read_png<R: Read>(input: &mut R) -> HipResult<Self> {
		load_png(input).map(Self::with_png)
	}


	/// Build the [`HipImage`]: palette PNGs become indexed images, RGBA PNGs
	/// become direct-color images.
	///
	/// # Errors
	/// - [`PixelBufferSizeMismatch`]: The PNG pixel buffer does not match its
	///   dimensions.
	/// - [`ImageTooLarge`]: `width * height` overflows a [`usize`].
	pub fn encode(&self) -> HipResult<HipImage> {
		let hip = match &self.png {
			PngImage::Indexed(png) => HipImage::indexed(png.width, png.height, png.palette.clone(), png.indices.clone()),
			PngImage::Direct(image) => HipImage::direct(image.width(), image.height(), image.pixels().copied().collect()),
		};

		hip.tap_ok(|hip| { macros::log!(debug, "Encoding {}x{} PNG as {:?} HIP", hip.width, hip.height, hip.kind()); })
	}
}


#[test]
fn encode_rgba_image() {
	let image = RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 6]));
	let hip = HipEncoder::with_rgba_image(image).encode().unwrap();
	assert_eq!(hip.kind(), crate::HipImageKind::Direct);
	assert_eq!(hip.pixels.len(), 6);
	assert_eq!(hip.to_bytes().unwrap()[32..], [7u8, 8, 9, 6, 6]);
}

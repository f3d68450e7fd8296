#![warn(missing_docs, unreachable_pub, clippy::all)]
#![allow(clippy::wildcard_imports, clippy::enum_glob_use)]
#![warn(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]


#![doc = include_str!("../README.md")]


mod macros;
mod header;
mod palette;
mod rle;
mod pngconv;
mod decode;
mod encode;

pub use header::*;
pub use palette::*;
pub use rle::*;
pub use pngconv::*;
pub use decode::*;
pub use encode::*;


use std::io::{Read, Write};

#[cfg(feature = "fuzz")] use arbitrary::{Arbitrary, Unstructured, Result as ArbitraryResult};
use derive_more::{Display, Error};
use image::Rgba;
#[cfg(test)] use static_assertions::assert_impl_all;
use surety::Ensure;
use tap::prelude::*;

use HipError::*;

/// [`std::result::Result`] parameterized with [`HipError`]
pub type HipResult<T> = Result<T, HipError>;


/// `libhip`'s [`std::error::Error`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HipError {
	/// Input ended in the middle of a header or the palette.
	#[display(fmt = "Unexpected end of input file")]
	UnexpectedEof,

	/// Unexpected I/O error that is not UnexpectedEof.
	#[display(fmt = "Unexpected I/O error: {}", _0)]
	UnexpectedIoError(#[error(ignore)] std::io::ErrorKind),

	/// Input does not start with the `"HIP\0"` signature.
	#[display(fmt = "Not a HIP file: unknown signature {:02x?}", _0)]
	UnknownSignature(#[error(ignore)] [u8; 4]),

	/// The `file_size` header field disagrees with the actual input length.
	#[display(fmt = "HIP header declares a file size of {} bytes, but the input is {} bytes long", declared, actual)]
	FileSizeMismatch {
		/// Value of the `file_size` header field.
		declared: u32,
		/// Length of the input.
		actual: usize,
	},

	/// `num_colors` is neither 0 (direct color) nor 256 (indexed).
	#[display(fmt = "Unsupported HIP color count: {} (only 0 and 256 are supported)", _0)]
	UnsupportedColorCount(#[error(ignore)] u32),

	/// On-disk palette data is not exactly 256 BGRA entries.
	#[display(fmt = "Palette data must be 256 4-byte entries, got {} bytes", _0)]
	PaletteSizeMismatch(#[error(ignore)] usize),

	/// The palette alpha table has more entries than the color table.
	#[display(fmt = "Palette alpha table has {} entries for {} colors", alpha, colors)]
	PaletteAlphaMismatch {
		/// Number of color entries.
		colors: usize,
		/// Number of alpha entries.
		alpha: usize,
	},

	/// Run-length data ends with an incomplete chunk.
	#[display(fmt = "Run-length data ends with {} trailing bytes that do not form a whole chunk", _0)]
	TruncatedRunData(#[error(ignore)] usize),

	/// Decoded runs do not cover exactly `width * height` pixels.
	#[display(fmt = "Run-length data describes {} pixels, expected {}", actual, expected)]
	PixelCountMismatch {
		/// `width * height` from the header.
		expected: usize,
		/// Sum of all run lengths.
		actual: usize,
	},

	/// Attempted to save a [`HipImage`] without pixels.
	#[display(fmt = "No image loaded")]
	EmptyImage,

	/// The pixel buffer of a [`HipImage`] is not `width * height` long.
	#[display(fmt = "Pixel buffer holds {} pixels, expected {}", actual, expected)]
	PixelBufferSizeMismatch {
		/// `width * height`.
		expected: usize,
		/// Length of the pixel buffer.
		actual: usize,
	},

	/// Image dimensions or file size overflow the integer types of the format.
	#[display(fmt = "Image dimensions or file size overflow the HIP format limits")]
	ImageTooLarge,

	/// PNG color type or bit depth is not 8-bit indexed or 8-bit RGBA.
	#[display(fmt = "Unsupported PNG color type: {}", _0)]
	UnsupportedPngColorType(#[error(ignore)] String),

	/// Indexed PNG palette does not have exactly 256 entries.
	#[display(fmt = "Unsupported PNG palette with {} entries (only 256 are supported)", _0)]
	UnsupportedPngPalette(#[error(ignore)] usize),

	/// The PNG codec failed.
	#[display(fmt = "PNG codec error: {}", _0)]
	PngError(#[error(ignore)] String),

	/// deku failed to read or write a HIP structure for a reason other than
	/// running out of input.
	#[display(fmt = "Binary layout error: {}", _0)]
	BinaryLayoutError(#[error(ignore)] String),
}


/// Broad class of a [`HipError`]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum HipErrorCategory {
	/// Malformed or unsupported HIP structure.
	#[display(fmt = "format error")]
	Format,
	/// Misuse of the API, e.g. saving an image that was never loaded.
	#[display(fmt = "value error")]
	Value,
	/// Unsupported input or output kind.
	#[display(fmt = "type error")]
	Type,
	/// Failure of an underlying reader, writer or codec.
	#[display(fmt = "I/O error")]
	Io,
}


impl HipError {
	/// Return the [`HipErrorCategory`] of this error.
	///
	/// # Example
	/// ```
	/// # use libhip::{HipError, HipErrorCategory};
	/// assert_eq!(HipError::UnsupportedColorCount(4).category(), HipErrorCategory::Format);
	/// assert_eq!(HipError::EmptyImage.category(), HipErrorCategory::Value);
	/// ```
	pub fn category(&self) -> HipErrorCategory {
		use HipErrorCategory::*;

		match self {
			UnexpectedEof
			| UnknownSignature(_)
			| FileSizeMismatch { .. }
			| UnsupportedColorCount(_)
			| PaletteSizeMismatch(_)
			| PaletteAlphaMismatch { .. }
			| TruncatedRunData(_)
			| PixelCountMismatch { .. } => Format,

			EmptyImage | PixelBufferSizeMismatch { .. } | ImageTooLarge => Value,

			UnsupportedPngColorType(_) | UnsupportedPngPalette(_) => Type,

			UnexpectedIoError(_) | PngError(_) | BinaryLayoutError(_) => Io,
		}
	}
}


impl From<std::io::Error> for HipError {
	fn from(error: std::io::Error) -> Self {
		match error.kind() {
			std::io::ErrorKind::UnexpectedEof => UnexpectedEof,
			kind => UnexpectedIoError(kind),
		}
	}
}


impl From<deku::DekuError> for HipError {
	fn from(error: deku::DekuError) -> Self {
		match error {
			deku::DekuError::Incomplete(_) => UnexpectedEof,
			e => BinaryLayoutError(e.to_string()),
		}
	}
}


impl From<png::DecodingError> for HipError {
	fn from(error: png::DecodingError) -> Self {
		match error {
			png::DecodingError::IoError(e) => e.into(),
			e => PngError(e.to_string()),
		}
	}
}


impl From<png::EncodingError> for HipError {
	fn from(error: png::EncodingError) -> Self {
		match error {
			png::EncodingError::IoError(e) => e.into(),
			e => PngError(e.to_string()),
		}
	}
}


impl From<image::ImageError> for HipError {
	fn from(error: image::ImageError) -> Self {
		match error {
			image::ImageError::IoError(e) => e.into(),
			e => PngError(e.to_string()),
		}
	}
}


/// A single HIP image held in memory
///
/// The pixel payload decides whether the image is written as an indexed or a
/// direct-color HIP; see [`HipPixels`].  [`HipImage::default()`] is an empty
/// image that cannot be saved.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct HipImage {
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// Row-major pixel data, top-left origin.
	pub pixels: HipPixels,
}


/// Pixel payload of a [`HipImage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HipPixels {
	/// Palette indices plus the 256-entry palette they refer to.
	Indexed {
		/// Logical palette and alpha table.
		palette: HipPalette,
		/// One logical palette index per pixel.
		indices: Vec<u8>,
	},

	/// One RGBA value per pixel.
	Direct {
		/// Pixel colors.
		rgba: Vec<Rgba<u8>>,
	},
}


impl Default for HipPixels {
	/// Returns an empty [`Direct`][`HipPixels::Direct`] buffer.
	fn default() -> Self {
		HipPixels::Direct { rgba: vec![] }
	}
}


impl HipPixels {
	/// Number of pixels in the buffer.
	pub fn len(&self) -> usize {
		match self {
			HipPixels::Indexed { indices, .. } => indices.len(),
			HipPixels::Direct { rgba } => rgba.len(),
		}
	}


	/// Return true if the buffer holds no pixels.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}


	/// The [`HipImageKind`] this payload is stored as.
	pub fn kind(&self) -> HipImageKind {
		match self {
			HipPixels::Indexed { .. } => HipImageKind::Indexed,
			HipPixels::Direct { .. } => HipImageKind::Direct,
		}
	}
}


impl HipImage {
	/// Construct an indexed image, checking that `indices` covers
	/// `width * height` pixels.
	///
	/// # Errors
	/// - [`ImageTooLarge`]: `width * height` overflows a [`usize`].
	/// - [`PixelBufferSizeMismatch`]: `indices.len() != width * height`.
	pub fn indexed(width: u32, height: u32, palette: HipPalette, indices: Vec<u8>) -> HipResult<Self> {
		let image = HipImage { width, height, pixels: HipPixels::Indexed { palette, indices } };
		image.check_pixel_count()?;
		Ok(image)
	}


	/// Construct a direct-color image, checking that `rgba` covers
	/// `width * height` pixels.
	///
	/// # Errors
	/// - [`ImageTooLarge`]: `width * height` overflows a [`usize`].
	/// - [`PixelBufferSizeMismatch`]: `rgba.len() != width * height`.
	pub fn direct(width: u32, height: u32, rgba: Vec<Rgba<u8>>) -> HipResult<Self> {
		let image = HipImage { width, height, pixels: HipPixels::Direct { rgba } };
		image.check_pixel_count()?;
		Ok(image)
	}


	/// Whether this image is stored with a palette.
	pub fn kind(&self) -> HipImageKind {
		self.pixels.kind()
	}


	/// `width * height`.
	///
	/// # Errors
	/// - [`ImageTooLarge`]: the product overflows a [`usize`].
	pub fn pixel_count(&self) -> HipResult<usize> {
		pixel_count(self.width, self.height)
	}


	/// Read a complete HIP file from an [`std::io::Read`].
	///
	/// # Errors
	/// - [`UnexpectedIoError`]: Reading from `input` failed.
	/// - Any error of [`HipImage::from_bytes`].
	pub fn read_from<R: Read>(input: &mut R) -> HipResult<Self> {
		let mut data: Vec<u8> = Vec::with_capacity(64 * 1024);
		input.read_to_end(&mut data)?;
		Self::from_bytes(&data)
	}


	/// Parse a complete HIP file.
	///
	/// # Errors
	/// - [`UnknownSignature`]: Input does not start with `"HIP\0"`.
	/// - [`UnexpectedEof`]: Input ends inside the header or the palette.
	/// - [`FileSizeMismatch`]: The header `file_size` is not the input length.
	/// - [`UnsupportedColorCount`]: `num_colors` is neither 0 nor 256.
	/// - [`ImageTooLarge`]: `width * height` overflows a [`usize`].
	/// - [`TruncatedRunData`], [`PixelCountMismatch`]: Corrupt run-length data.
	pub fn from_bytes(input: &[u8]) -> HipResult<Self> {
		let (info, body) = parse_header(input)?;
		let count = pixel_count(info.width, info.height)?;

		let pixels = match info.kind() {
			HipImageKind::Indexed => {
				if body.len() < HipPalette::DISK_SIZE {
					return Err(UnexpectedEof);
				};

				let (palette_data, run_data) = body.split_at(HipPalette::DISK_SIZE);
				let palette = HipPalette::from_disk(palette_data)?;
				let indices = decode_indexed(run_data, count)?;
				HipPixels::Indexed { palette, indices }
			},

			HipImageKind::Direct => {
				let rgba = decode_direct(body, count)?;
				HipPixels::Direct { rgba }
			},
		};

		macros::log!(debug, "Loaded {:?} HIP image, {}x{}", info.kind(), info.width, info.height);

		Ok(HipImage { width: info.width, height: info.height, pixels })
	}


	/// Serialize self to a complete HIP file.
	///
	/// # Errors
	/// - [`EmptyImage`]: The image holds no pixels.
	/// - [`PixelBufferSizeMismatch`]: The pixel buffer is not `width * height` long.
	/// - [`ImageTooLarge`]: The file size overflows a [`u32`].
	pub fn to_bytes(&self) -> HipResult<Vec<u8>> {
		self.check_pixels()?;

		let (palette_data, run_data) = match &self.pixels {
			HipPixels::Indexed { palette, indices } => (palette.to_disk()?, encode_indexed(indices)?),
			HipPixels::Direct { rgba } => (vec![], encode_direct(rgba)?),
		};

		let mut buf = build_header(self.width, self.height, self.kind(), run_data.len(), palette_data.len())?;
		buf.reserve_exact(palette_data.len() + run_data.len());
		buf.extend(palette_data);
		buf.extend(run_data);

		Ok(buf)
	}


	/// Serialize self and write the complete file to `output` with a single
	/// [`write_all`][std::io::Write::write_all].
	///
	/// # Errors
	/// - Any error of [`HipImage::to_bytes`].
	/// - [`UnexpectedIoError`]: Writing to `output` failed.
	pub fn write_to<W: Write>(&self, output: &mut W) -> HipResult<()> {
		let data = self.to_bytes()?;
		output.write_all(&data)
			.tap_err(|_e| { macros::log!(error, "Failed to write {} bytes of HIP data: {}", data.len(), _e); })?;
		Ok(())
	}


	/// An image can be saved or converted once it holds exactly
	/// `width * height` pixels, and at least one.
	pub(crate) fn check_pixels(&self) -> HipResult<()> {
		if self.pixels.is_empty() {
			return Err(EmptyImage);
		};

		self.check_pixel_count()
	}


	fn check_pixel_count(&self) -> HipResult<()> {
		let expected = self.pixel_count()?;
		let actual = self.pixels.len();

		if expected != actual {
			return Err(PixelBufferSizeMismatch { expected, actual });
		};

		Ok(())
	}
}


#[cfg(feature = "fuzz")]
impl<'a> Arbitrary<'a> for HipImage {
	fn arbitrary(input: &mut Unstructured<'a>) -> ArbitraryResult<Self> {
		let width: u32 = input.int_in_range(1..=64)?;
		let height: u32 = input.int_in_range(1..=64)?;
		let count = (width * height) as usize;

		let pixels = if input.arbitrary::<bool>()? {
			let mut colors = [image::Rgb([0u8; 3]); PALETTE_COLORS];
			let mut alpha = [0u8; PALETTE_COLORS];

			for c in &mut colors {
				*c = image::Rgb(input.arbitrary()?);
			};

			input.fill_buffer(&mut alpha)?;

			// Short runs keep the generated image compressible
			let mut indices = Vec::with_capacity(count);

			while indices.len() < count {
				let value: u8 = input.arbitrary()?;
				let run: usize = input.int_in_range(1..=600)?;
				indices.extend(std::iter::repeat(value).take(run.min(count - indices.len())));
			};

			HipPixels::Indexed { palette: HipPalette { colors, alpha }, indices }
		}
		else {
			let mut rgba = Vec::with_capacity(count);

			while rgba.len() < count {
				let value = Rgba::<u8>(input.arbitrary()?);
				let run: usize = input.int_in_range(1..=600)?;
				rgba.extend(std::iter::repeat(value).take(run.min(count - rgba.len())));
			};

			HipPixels::Direct { rgba }
		};

		Ok(HipImage { width, height, pixels })
	}
}


/// `width * height` as a [`usize`].
pub(crate) fn pixel_count(width: u32, height: u32) -> HipResult<usize> {
	let width = usize::try_from(width).map_err(|_| ImageTooLarge)?;
	let height = usize::try_from(height).map_err(|_| ImageTooLarge)?;
	(width.checked() * height).ok_or(ImageTooLarge)
}


#[test]
fn empty_image_is_not_saved() {
	assert_eq!(HipImage::default().to_bytes(), Err(EmptyImage));
	assert_eq!(HipImage::default().kind(), HipImageKind::Direct);
}


#[test]
fn pixel_buffer_must_match_dimensions() {
	let error = HipImage::direct(2, 2, vec![Rgba([0, 0, 0, 0]); 3]).unwrap_err();
	assert_eq!(error, PixelBufferSizeMismatch { expected: 4, actual: 3 });

	let image = HipImage { width: 1, height: 1, pixels: HipPixels::Indexed { palette: HipPalette::default(), indices: vec![0, 0] } };
	assert_eq!(image.to_bytes(), Err(PixelBufferSizeMismatch { expected: 1, actual: 2 }));
}


#[test]
fn write_to_emits_whole_file() {
	let image = HipImage::direct(3, 1, vec![Rgba([1, 2, 3, 4]); 3]).unwrap();
	let mut out: Vec<u8> = vec![];
	image.write_to(&mut out).unwrap();
	assert_eq!(out, image.to_bytes().unwrap());
	assert_eq!(HipImage::read_from(&mut &out[..]).unwrap(), image);
}


#[test]
fn io_errors_keep_eof() {
	let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
	assert_eq!(HipError::from(eof), UnexpectedEof);
	let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
	assert_eq!(HipError::from(denied).category(), HipErrorCategory::Io);
}


#[test]
fn deku_errors_keep_eof() {
	let incomplete = deku::DekuError::Incomplete(deku::error::NeedSize::new(8));
	assert_eq!(HipError::from(incomplete), UnexpectedEof);

	let layout = HipError::from(deku::DekuError::Parse("bad magic".into()));
	assert!(matches!(layout, BinaryLayoutError(_)));
	assert_eq!(layout.category(), HipErrorCategory::Io);
}


#[test]
fn assert_traits() {
	use std::fmt::{Debug, Display};
	use std::error::Error;
	use std::panic::{UnwindSafe, RefUnwindSafe};

	assert_impl_all!(HipError: Debug, Display, Error, Send, Sync, UnwindSafe, RefUnwindSafe);
	assert_impl_all!(HipImage: Debug, Clone, Send, Sync);
}

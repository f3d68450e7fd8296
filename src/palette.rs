use crate::{HipResult, PALETTE_COLORS};
use crate::HipError::*;

use deku::prelude::*;
use image::{Rgb, Rgba};
use static_assertions::const_assert_eq;


/// 256-entry color table of an indexed HIP, in logical index order
///
/// On disk the table is stored as BGRA entries in reverse order: disk entry
/// `i` holds logical index `255 - i`.  [`from_disk`][Self::from_disk] and
/// [`to_disk`][Self::to_disk] convert between the two orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HipPalette {
	/// RGB value of each logical index.
	pub colors: [Rgb<u8>; PALETTE_COLORS],
	/// Alpha value of each logical index.
	pub alpha: [u8; PALETTE_COLORS],
}


impl Default for HipPalette {
	/// Returns an all-black, fully opaque palette.
	fn default() -> Self {
		HipPalette {
			colors: [Rgb([0, 0, 0]); PALETTE_COLORS],
			alpha: [u8::MAX; PALETTE_COLORS],
		}
	}
}


impl HipPalette {
	/// Size of the on-disk palette in bytes.
	pub const DISK_SIZE: usize = PALETTE_COLORS * Bgra8888Pixel::SIZE;


	/// Read the on-disk palette (reverse order, BGRA) into logical order.
	///
	/// # Errors
	/// - [`PaletteSizeMismatch`]: `data` is not exactly 256 4-byte entries.
	///
	/// # Example
	/// ```
	/// # use libhip::HipPalette;
	/// let mut disk = vec![0u8; HipPalette::DISK_SIZE];
	/// disk[..4].copy_from_slice(&[0x30, 0x20, 0x10, 0x80]);
	/// let palette = HipPalette::from_disk(&disk).unwrap();
	/// assert_eq!(palette.colors[255].0, [0x10, 0x20, 0x30]);
	/// assert_eq!(palette.alpha[255], 0x80);
	/// ```
	pub fn from_disk(data: &[u8]) -> HipResult<Self> {
		if data.len() != Self::DISK_SIZE {
			return Err(PaletteSizeMismatch(data.len()));
		};

		let mut palette = HipPalette::default();

		for (i, entry) in data.chunks_exact(Bgra8888Pixel::SIZE).enumerate() {
			let (_, pixel) = Bgra8888Pixel::from_bytes((entry, 0))?;
			let logical = PALETTE_COLORS - 1 - i;
			palette.colors[logical] = Rgb([pixel.r, pixel.g, pixel.b]);
			palette.alpha[logical] = pixel.a;
		};

		Ok(palette)
	}


	/// Convert self into the on-disk palette; the exact inverse of
	/// [`from_disk`][Self::from_disk].
	///
	/// # Errors
	/// - [`BinaryLayoutError`]: deku failed to serialize an entry (should
	///   never happen).
	pub fn to_disk(&self) -> HipResult<Vec<u8>> {
		let mut buf: Vec<u8> = Vec::with_capacity(Self::DISK_SIZE);

		for logical in (0..PALETTE_COLORS).rev() {
			let Rgb([r, g, b]) = self.colors[logical];
			let pixel = Bgra8888Pixel { b, g, r, a: self.alpha[logical] };
			buf.extend(pixel.to_bytes()?);
		};

		Ok(buf)
	}


	/// Build a palette from packed RGB triples and an optional alpha table,
	/// as found in the `PLTE` and `tRNS` chunks of a PNG.  Colors without an
	/// alpha entry are opaque.
	///
	/// # Errors
	/// - [`UnsupportedPngPalette`]: `rgb` does not hold exactly 256 triples.
	/// - [`PaletteAlphaMismatch`]: `alpha` has more entries than `rgb`.
	pub fn from_rgb_and_alpha(rgb: &[u8], alpha: Option<&[u8]>) -> HipResult<Self> {
		let colors = rgb.len() / 3;

		if rgb.len() % 3 != 0 || colors != PALETTE_COLORS {
			return Err(UnsupportedPngPalette(colors));
		};

		let alpha = alpha.unwrap_or(&[]);

		if alpha.len() > colors {
			return Err(PaletteAlphaMismatch { colors, alpha: alpha.len() });
		};

		let mut palette = HipPalette::default();

		for (i, c) in rgb.chunks_exact(3).enumerate() {
			palette.colors[i] = Rgb([c[0], c[1], c[2]]);
		};

		palette.alpha[..alpha.len()].copy_from_slice(alpha);

		Ok(palette)
	}


	/// Colors as packed RGB triples in logical order, as stored in a PNG
	/// `PLTE` chunk.
	pub fn rgb_bytes(&self) -> Vec<u8> {
		self.colors.iter().flat_map(|c| c.0).collect()
	}


	/// RGBA value of a logical index.
	pub fn rgba(&self, index: u8) -> Rgba<u8> {
		let Rgb([r, g, b]) = self.colors[usize::from(index)];
		Rgba([r, g, b, self.alpha[usize::from(index)]])
	}
}


/// A color as stored in HIP palettes and direct-color runs; its byte layout
/// is B:G:R:A
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, DekuRead, DekuWrite)]
pub struct Bgra8888Pixel {
	#[allow(missing_docs)]
	pub b: u8,
	#[allow(missing_docs)]
	pub g: u8,
	#[allow(missing_docs)]
	pub r: u8,
	#[allow(missing_docs)]
	pub a: u8,
}


impl Bgra8888Pixel {
	/// Size in bytes.
	pub const SIZE: usize = 4;
}


const_assert_eq!(HipPalette::DISK_SIZE, 1024);


impl From<Rgba<u8>> for Bgra8888Pixel {
	fn from(rgba: Rgba<u8>) -> Self {
		let Rgba([r, g, b, a]) = rgba;
		Self { b, g, r, a }
	}
}


impl From<Bgra8888Pixel> for Rgba<u8> {
	fn from(pixel: Bgra8888Pixel) -> Self {
		Rgba([pixel.r, pixel.g, pixel.b, pixel.a])
	}
}


#[cfg(test)]
fn pseudo_random_bytes(len: usize, seed: u32) -> Vec<u8> {
	let mut state = seed;
	(0..len)
		.map(|_| {
			state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
			(state >> 16) as u8
		})
		.collect()
}


#[test]
fn disk_palette_is_reversed_and_channel_swapped() {
	let mut disk = vec![0u8; HipPalette::DISK_SIZE];
	// Disk entry 0 is logical 255, disk entry 255 is logical 0
	disk[0..4].copy_from_slice(&[1, 2, 3, 4]);
	disk[1020..1024].copy_from_slice(&[0xFF, 0xEE, 0xDD, 0xCC]);

	let palette = HipPalette::from_disk(&disk).unwrap();
	assert_eq!(palette.colors[255], Rgb([3, 2, 1]));
	assert_eq!(palette.alpha[255], 4);
	assert_eq!(palette.colors[0], Rgb([0xDD, 0xEE, 0xFF]));
	assert_eq!(palette.alpha[0], 0xCC);
	assert_eq!(palette.rgba(0), Rgba([0xDD, 0xEE, 0xFF, 0xCC]));
}


#[test]
fn disk_palette_involution() {
	for seed in [1, 7, 42, 1234] {
		let disk = pseudo_random_bytes(HipPalette::DISK_SIZE, seed);
		let palette = HipPalette::from_disk(&disk).unwrap();
		assert_eq!(palette.to_disk().unwrap(), disk);
	};
}


#[test]
fn reject_palette_of_wrong_size() {
	assert_eq!(HipPalette::from_disk(&[0u8; 1023]), Err(PaletteSizeMismatch(1023)));
	assert_eq!(HipPalette::from_disk(&[0u8; 1028]), Err(PaletteSizeMismatch(1028)));
	assert_eq!(HipPalette::from_disk(&[0u8; 1020]), Err(PaletteSizeMismatch(1020)));
	assert_eq!(HipPalette::from_disk(&[]), Err(PaletteSizeMismatch(0)));
}


#[test]
fn palette_from_png_chunks() {
	let rgb = pseudo_random_bytes(768, 3);
	let palette = HipPalette::from_rgb_and_alpha(&rgb, Some(&[0u8, 128][..])).unwrap();
	assert_eq!(palette.rgb_bytes(), rgb);
	assert_eq!(&palette.alpha[..3], &[0u8, 128, 255][..]);

	let opaque = HipPalette::from_rgb_and_alpha(&rgb, None).unwrap();
	assert!(opaque.alpha.iter().all(|a| *a == 255));
}


#[test]
fn reject_desynchronized_png_palette() {
	assert_eq!(HipPalette::from_rgb_and_alpha(&[0u8; 48], None), Err(UnsupportedPngPalette(16)));
	assert_eq!(
		HipPalette::from_rgb_and_alpha(&[0u8; 768], Some(&[0u8; 257][..])),
		Err(PaletteAlphaMismatch { colors: 256, alpha: 257 }),
	);
}

use crate::{HipResult, macros};
use crate::HipError::*;

use deku::prelude::*;
use static_assertions::const_assert;
use surety::Ensure;


/// The first four bytes of every HIP file.
pub const HIP_SIGNATURE: [u8; 4] = *b"HIP\0";

/// Value of [`HipHeader::unknown_a`] written by the game's tools.
pub const HIP_UNKNOWN_A: u32 = 0x125;

/// Value of [`HipHeader::unknown_b`] for indexed images.
pub const HIP_UNKNOWN_B_INDEXED: u32 = 0x0;

/// Value of [`HipHeader::unknown_b`] for direct-color images.
pub const HIP_UNKNOWN_B_DIRECT: u32 = 0x110;

/// Number of palette entries of an indexed HIP.
pub const PALETTE_COLORS: usize = 256;

/// Size of [`HipHeader`] including the signature.
pub const HEADER_SIZE: usize = 32;

/// Size of [`PaletteHeader`].
pub const PALETTE_HEADER_SIZE: usize = 32;

const_assert!(std::mem::size_of::<usize>() >= std::mem::size_of::<u32>());
const_assert!(PALETTE_COLORS <= u8::MAX as usize + 1);


/// Whether a HIP stores palette indices or RGBA colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HipImageKind {
	/// 256-color palette followed by 2-byte index runs.
	Indexed,
	/// 5-byte BGRA runs, no palette.
	Direct,
}


impl HipImageKind {
	/// Value of [`HipHeader::num_colors`] for this kind.
	pub const fn num_colors(self) -> u32 {
		match self {
			HipImageKind::Indexed => PALETTE_COLORS as u32,
			HipImageKind::Direct => 0,
		}
	}


	/// Value of [`HipHeader::unknown_b`] for this kind.
	pub const fn unknown_b(self) -> u32 {
		match self {
			HipImageKind::Indexed => HIP_UNKNOWN_B_INDEXED,
			HipImageKind::Direct => HIP_UNKNOWN_B_DIRECT,
		}
	}


	/// Value of [`HipHeader::color_depth`] for this kind.
	pub const fn color_depth(self) -> u32 {
		self.num_colors() / 8
	}
}


/// Fixed header at the start of every HIP file, following the `"HIP\0"`
/// signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(magic = b"HIP\x00", endian = "little")]
pub struct HipHeader {
	/// Undocumented; always [`HIP_UNKNOWN_A`] on write.
	pub unknown_a: u32,
	/// Length of the whole file in bytes.
	pub file_size: u32,
	/// 0 for direct-color images, 256 for indexed images.
	pub num_colors: u32,
	/// Image width; only meaningful when `num_colors == 0`.
	pub raw_width: u32,
	/// Image height; only meaningful when `num_colors == 0`.
	pub raw_height: u32,
	/// Undocumented; see [`HipImageKind::unknown_b`].
	pub unknown_b: u32,
	/// `num_colors / 8` on write.
	pub color_depth: u32,
}


/// Geometry block following [`HipHeader`] in indexed images
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "little")]
pub struct PaletteHeader {
	/// Image width.
	pub width: u32,
	/// Image height.
	pub height: u32,
	/// Always zero on write, ignored on read.
	pub reserved: [u32; 6],
}


/// What [`parse_header`] extracts from a HIP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
	/// [`HipHeader::num_colors`]; either 0 or 256.
	pub num_colors: u32,
	/// Image width in pixels.
	pub width: u32,
	/// Image height in pixels.
	pub height: u32,
}


impl HeaderInfo {
	/// Kind of image described by the header.
	pub fn kind(&self) -> HipImageKind {
		if self.num_colors == 0 {
			HipImageKind::Direct
		}
		else {
			HipImageKind::Indexed
		}
	}
}


/// Validate the header of a complete HIP file and return its geometry along
/// with the data that follows the header(s).
///
/// # Errors
/// - [`UnknownSignature`]: `input` does not start with [`HIP_SIGNATURE`].
/// - [`UnexpectedEof`]: `input` ends inside a header.
/// - [`FileSizeMismatch`]: [`HipHeader::file_size`] is not `input.len()`.
/// - [`UnsupportedColorCount`]: [`HipHeader::num_colors`] is neither 0 nor 256.
///
/// # Example
/// ```
/// # use libhip::*;
/// let mut file = build_header(2, 1, HipImageKind::Direct, 5, 0).unwrap();
/// file.extend([0, 0, 0, 0, 2]);
/// let (info, rest) = parse_header(&file).unwrap();
/// assert_eq!((info.kind(), info.width, info.height), (HipImageKind::Direct, 2, 1));
/// assert_eq!(rest.len(), 5);
/// ```
pub fn parse_header(input: &[u8]) -> HipResult<(HeaderInfo, &[u8])> {
	if !input.starts_with(&HIP_SIGNATURE) {
		let mut signature = [0u8; 4];
		let len = input.len().min(4);
		signature[..len].copy_from_slice(&input[..len]);
		return Err(UnknownSignature(signature));
	};

	let ((rest, _), header) = HipHeader::from_bytes((input, 0))
		.map_err(|_| UnexpectedEof)?;

	macros::log!(trace, "HIP header: {:?}", header);

	if header.file_size as usize != input.len() {
		return Err(FileSizeMismatch { declared: header.file_size, actual: input.len() });
	};

	let kind = match header.num_colors {
		0 => HipImageKind::Direct,
		n if n as usize == PALETTE_COLORS => HipImageKind::Indexed,
		n => return Err(UnsupportedColorCount(n)),
	};

	header.warn_unexpected_constants(kind);

	match kind {
		HipImageKind::Direct => {
			let info = HeaderInfo { num_colors: 0, width: header.raw_width, height: header.raw_height };
			Ok((info, rest))
		},

		HipImageKind::Indexed => {
			let ((rest, _), palette_header) = PaletteHeader::from_bytes((rest, 0))
				.map_err(|_| UnexpectedEof)?;

			macros::log!(trace, "HIP palette header: {:?}", palette_header);

			let info = HeaderInfo {
				num_colors: header.num_colors,
				width: palette_header.width,
				height: palette_header.height,
			};

			Ok((info, rest))
		},
	}
}


/// Serialize the header(s) of a HIP file whose palette and run-length data
/// are `palette_data_size` and `image_data_size` bytes long.
///
/// # Errors
/// - [`ImageTooLarge`]: The resulting file size overflows a [`u32`].
///
/// # Example
/// ```
/// # use libhip::*;
/// let header = build_header(4, 4, HipImageKind::Indexed, 2, 1024).unwrap();
/// assert_eq!(header.len(), HEADER_SIZE + PALETTE_HEADER_SIZE);
/// assert_eq!(&header[8..12], &(64u32 + 1024 + 2).to_le_bytes());
/// ```
pub fn build_header(width: u32, height: u32, kind: HipImageKind, image_data_size: usize, palette_data_size: usize) -> HipResult<Vec<u8>> {
	let sub_header_size = match kind {
		HipImageKind::Indexed => PALETTE_HEADER_SIZE,
		HipImageKind::Direct => 0,
	};

	let file_size = (HEADER_SIZE.checked() + sub_header_size + palette_data_size + image_data_size)
		.ok_or(ImageTooLarge)?;
	let file_size = u32::try_from(file_size).map_err(|_| ImageTooLarge)?;

	let (raw_width, raw_height) = match kind {
		HipImageKind::Indexed => (0, 0),
		HipImageKind::Direct => (width, height),
	};

	let header = HipHeader {
		unknown_a: HIP_UNKNOWN_A,
		file_size,
		num_colors: kind.num_colors(),
		raw_width,
		raw_height,
		unknown_b: kind.unknown_b(),
		color_depth: kind.color_depth(),
	};

	let mut buf = header.to_bytes()?;

	if kind == HipImageKind::Indexed {
		let palette_header = PaletteHeader { width, height, ..Default::default() };
		buf.extend(palette_header.to_bytes()?);
	};

	Ok(buf)
}


impl HipHeader {
	/// Log header fields that differ from what [`build_header`] would write;
	/// such files do not round-trip byte for byte.
	fn warn_unexpected_constants(&self, kind: HipImageKind) {
		if self.unknown_a != HIP_UNKNOWN_A {
			macros::log!(warn, "Unexpected HIP unknown_a value {:#x}; it will be rewritten as {:#x}", self.unknown_a, HIP_UNKNOWN_A);
		};

		if self.unknown_b != kind.unknown_b() {
			macros::log!(warn, "Unexpected HIP unknown_b value {:#x} for {:?}; it will be rewritten as {:#x}", self.unknown_b, kind, kind.unknown_b());
		};

		if self.color_depth != kind.color_depth() {
			macros::log!(warn, "Unexpected HIP color_depth {} for {:?}; it will be rewritten as {}", self.color_depth, kind, kind.color_depth());
		};
	}
}


#[cfg(test)]
fn direct_header_bytes(file_size: u32, num_colors: u32) -> Vec<u8> {
	let mut bytes = HIP_SIGNATURE.to_vec();

	for field in [HIP_UNKNOWN_A, file_size, num_colors, 3, 5, HIP_UNKNOWN_B_DIRECT, 0] {
		bytes.extend(field.to_le_bytes());
	};

	bytes
}


#[test]
fn direct_header_layout() {
	let header = build_header(3, 5, HipImageKind::Direct, 10, 0).unwrap();
	assert_eq!(header, direct_header_bytes(42, 0));
}


#[test]
fn indexed_header_layout() {
	let header = build_header(640, 480, HipImageKind::Indexed, 100, 1024).unwrap();

	let mut expected = HIP_SIGNATURE.to_vec();
	for field in [HIP_UNKNOWN_A, 32 + 32 + 1024 + 100, 256, 0, 0, HIP_UNKNOWN_B_INDEXED, 32, 640, 480, 0, 0, 0, 0, 0, 0] {
		expected.extend(u32::to_le_bytes(field));
	};

	assert_eq!(header, expected);
}


#[test]
fn parse_direct_header() {
	let mut file = direct_header_bytes(34, 0);
	file.extend([0xAA, 0xBB]);

	let (info, rest) = parse_header(&file).unwrap();
	assert_eq!(info, HeaderInfo { num_colors: 0, width: 3, height: 5 });
	assert_eq!(rest, &[0xAAu8, 0xBB][..]);
}


#[test]
fn parse_indexed_header_reads_geometry_from_sub_header() {
	let mut file = build_header(7, 9, HipImageKind::Indexed, 0, 0).unwrap();
	// Raw fields of an indexed header are ignored
	file[16..20].copy_from_slice(&1234u32.to_le_bytes());
	// Reserved fields are ignored as well
	file[40..44].copy_from_slice(&0xDEADu32.to_le_bytes());

	let (info, rest) = parse_header(&file).unwrap();
	assert_eq!(info, HeaderInfo { num_colors: 256, width: 7, height: 9 });
	assert_eq!(info.kind(), HipImageKind::Indexed);
	assert!(rest.is_empty());
}


#[test]
fn reject_bad_signature() {
	let mut file = direct_header_bytes(32, 0);
	file[0] = b'P';
	assert_eq!(parse_header(&file), Err(UnknownSignature(*b"PIP\0")));
	assert_eq!(parse_header(b"HI"), Err(UnknownSignature(*b"HI\0\0")));
}


#[test]
fn reject_file_size_off_by_one() {
	let mut file = direct_header_bytes(35, 0);
	file.extend([0, 0]);
	assert_eq!(parse_header(&file), Err(FileSizeMismatch { declared: 35, actual: 34 }));
}


#[test]
fn reject_partial_palette_color_count() {
	// No palette sub-header follows; the color count must fail first
	let file = direct_header_bytes(32, 4);
	assert_eq!(parse_header(&file), Err(UnsupportedColorCount(4)));

	let file = direct_header_bytes(32, 512);
	assert_eq!(parse_header(&file), Err(UnsupportedColorCount(512)));
}


#[test]
fn reject_truncated_headers() {
	let file = &direct_header_bytes(32, 0)[..20];
	assert_eq!(parse_header(file), Err(UnexpectedEof));

	// Indexed header without its sub-header
	let file = direct_header_bytes(32, 256);
	assert_eq!(parse_header(&file), Err(UnexpectedEof));
}


#[test]
fn color_depth_follows_num_colors() {
	assert_eq!(HipImageKind::Indexed.color_depth(), 32);
	assert_eq!(HipImageKind::Direct.color_depth(), 0);
}

//! Run-length chunks of HIP image data.
//!
//! Both chunk formats store a pixel value followed by a one-byte run length.
//! Runs are never longer than 255 pixels; longer runs are split into several
//! chunks with the same value.


use crate::{HipResult, Bgra8888Pixel, macros};
use crate::HipError::*;

use deku::{prelude::*, DekuContainerRead, DekuContainerWrite};
use image::Rgba;
use surety::Ensure;


/// Run of a single palette index
///
/// The index is stored counted from the end of the palette, matching the
/// reversed on-disk palette order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead, DekuWrite)]
pub struct IndexedChunk {
	/// `255 - logical_index`.
	pub stored_index: u8,
	/// Number of pixels in the run.
	pub count: u8,
}


/// Run of a single BGRA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, DekuRead, DekuWrite)]
pub struct DirectChunk {
	/// Color of the run.
	pub bgra: Bgra8888Pixel,
	/// Number of pixels in the run.
	pub count: u8,
}


pub(crate) trait RunChunk: for<'a> DekuContainerRead<'a> + DekuContainerWrite + Sized {
	type Value: Copy + PartialEq;

	const CHUNK_SIZE: usize;

	fn value(&self) -> Self::Value;
	fn count(&self) -> u8;
	fn with_run(value: Self::Value, count: u8) -> Self;
}


impl RunChunk for IndexedChunk {
	type Value = u8;

	const CHUNK_SIZE: usize = 2;

	fn value(&self) -> u8 {
		u8::MAX - self.stored_index
	}

	fn count(&self) -> u8 {
		self.count
	}

	fn with_run(value: u8, count: u8) -> Self {
		IndexedChunk { stored_index: u8::MAX - value, count }
	}
}


impl RunChunk for DirectChunk {
	type Value = Rgba<u8>;

	const CHUNK_SIZE: usize = 5;

	fn value(&self) -> Rgba<u8> {
		self.bgra.into()
	}

	fn count(&self) -> u8 {
		self.count
	}

	fn with_run(value: Rgba<u8>, count: u8) -> Self {
		DirectChunk { bgra: value.into(), count }
	}
}


fn decode_runs<C: RunChunk>(data: &[u8], pixel_count: usize) -> HipResult<Vec<C::Value>> {
	let chunks = data.chunks_exact(C::CHUNK_SIZE);
	let trailing = chunks.remainder().len();

	if trailing != 0 {
		return Err(TruncatedRunData(trailing));
	};

	let runs = chunks
		.map(|c| C::from_bytes((c, 0)).map(|(_, run)| run))
		.collect::<Result<Vec<C>, _>>()?;

	// Runs are validated against the header before any pixel is expanded
	let total = runs.iter()
		.fold(0usize.checked(), |acc, run| acc + usize::from(run.count()))
		.ok_or(ImageTooLarge)?;

	if total != pixel_count {
		return Err(PixelCountMismatch { expected: pixel_count, actual: total });
	};

	macros::log!(trace, "Decoding {} runs into {} pixels", runs.len(), pixel_count);

	let mut pixels: Vec<C::Value> = Vec::with_capacity(pixel_count);

	for run in &runs {
		pixels.extend(std::iter::repeat(run.value()).take(run.count().into()));
	};

	Ok(pixels)
}


fn encode_runs<C: RunChunk>(pixels: &[C::Value]) -> HipResult<Vec<u8>> {
	let mut buf: Vec<u8> = Vec::with_capacity(pixels.len().min(1 << 20));
	let mut values = pixels.iter().copied();

	let mut current = match values.next() {
		Some(v) => v,
		None => return Ok(buf),
	};
	let mut count: u8 = 1;

	for value in values {
		if value == current && count < u8::MAX {
			count += 1;
			continue;
		};

		buf.extend(C::with_run(current, count).to_bytes()?);
		current = value;
		count = 1;
	};

	buf.extend(C::with_run(current, count).to_bytes()?);

	macros::log!(trace, "Encoded {} pixels into {} runs", pixels.len(), buf.len() / C::CHUNK_SIZE);

	Ok(buf)
}


/// Expand 2-byte [`IndexedChunk`]s into `pixel_count` logical palette indices.
///
/// # Errors
/// - [`TruncatedRunData`]: `data` ends with a partial chunk.
/// - [`PixelCountMismatch`]: The runs do not add up to `pixel_count`.
///
/// # Example
/// ```
/// # use libhip::decode_indexed;
/// assert_eq!(decode_indexed(&[255, 2, 254, 2], 4).unwrap(), vec![0, 0, 1, 1]);
/// ```
pub fn decode_indexed(data: &[u8], pixel_count: usize) -> HipResult<Vec<u8>> {
	decode_runs::<IndexedChunk>(data, pixel_count)
}


/// Compress logical palette indices into 2-byte [`IndexedChunk`]s.
///
/// # Errors
/// - [`BinaryLayoutError`]: deku failed to serialize a chunk (should never
///   happen).
///
/// # Example
/// ```
/// # use libhip::encode_indexed;
/// assert_eq!(encode_indexed(&[0, 0, 1, 1]).unwrap(), vec![255, 2, 254, 2]);
/// ```
pub fn encode_indexed(indices: &[u8]) -> HipResult<Vec<u8>> {
	encode_runs::<IndexedChunk>(indices)
}


/// Expand 5-byte [`DirectChunk`]s into `pixel_count` RGBA colors.
///
/// # Errors
/// - [`TruncatedRunData`]: `data` ends with a partial chunk.
/// - [`PixelCountMismatch`]: The runs do not add up to `pixel_count`.
pub fn decode_direct(data: &[u8], pixel_count: usize) -> HipResult<Vec<Rgba<u8>>> {
	decode_runs::<DirectChunk>(data, pixel_count)
}


/// Compress RGBA colors into 5-byte [`DirectChunk`]s.
///
/// # Errors
/// - [`BinaryLayoutError`]: deku failed to serialize a chunk (should never
///   happen).
///
/// # Example
/// ```
/// # use libhip::encode_direct;
/// let red = image::Rgba([0xFF, 0, 0, 0x80]);
/// assert_eq!(encode_direct(&[red, red, red]).unwrap(), vec![0, 0, 0xFF, 0x80, 3]);
/// ```
pub fn encode_direct(pixels: &[Rgba<u8>]) -> HipResult<Vec<u8>> {
	encode_runs::<DirectChunk>(pixels)
}


#[test]
fn two_by_two_indexed_scenario() {
	let encoded = encode_indexed(&[0, 0, 1, 1]).unwrap();
	assert_eq!(encoded, vec![255, 2, 254, 2]);
	assert_eq!(decode_indexed(&encoded, 4).unwrap(), vec![0, 0, 1, 1]);
}


#[test]
fn run_of_256_is_split() {
	let encoded = encode_indexed(&[9u8; 256]).unwrap();
	assert_eq!(encoded, vec![246, 255, 246, 1]);

	let red = Rgba([0xFF, 0, 0, 0xFF]);
	let encoded = encode_direct(&vec![red; 256]).unwrap();
	assert_eq!(encoded, vec![0, 0, 0xFF, 0xFF, 255, 0, 0, 0xFF, 0xFF, 1]);
}


#[test]
fn long_runs_use_ceil_chunks() {
	for len in [255usize, 510, 511, 1000] {
		let encoded = encode_indexed(&vec![3u8; len]).unwrap();
		let chunks = encoded.len() / 2;
		assert_eq!(chunks, (len + 254) / 255);
		assert!(encoded.chunks(2).all(|c| c[0] == 252 && c[1] >= 1));
		assert_eq!(decode_indexed(&encoded, len).unwrap(), vec![3u8; len]);
	};
}


#[test]
fn direct_chunks_swap_channels() {
	let data = [0x10, 0x20, 0x30, 0x40, 2, 0xAA, 0xBB, 0xCC, 0xDD, 1];
	let pixels = decode_direct(&data, 3).unwrap();
	assert_eq!(pixels, vec![Rgba([0x30, 0x20, 0x10, 0x40]), Rgba([0x30, 0x20, 0x10, 0x40]), Rgba([0xCC, 0xBB, 0xAA, 0xDD])]);
	assert_eq!(encode_direct(&pixels).unwrap(), data.to_vec());
}


#[test]
fn alternating_pixels_are_not_merged() {
	let indices: Vec<u8> = (0..10).map(|i| (i % 2) as u8).collect();
	let encoded = encode_indexed(&indices).unwrap();
	assert_eq!(encoded.len(), 20);
	assert!(encoded.chunks(2).all(|c| c[1] == 1));
}


#[test]
fn empty_input_has_no_chunks() {
	assert!(encode_indexed(&[]).unwrap().is_empty());
	assert!(decode_indexed(&[], 0).unwrap().is_empty());
}


#[test]
fn reject_pixel_count_mismatch() {
	// Too few pixels: truncated file
	assert_eq!(decode_indexed(&[255, 2], 4), Err(PixelCountMismatch { expected: 4, actual: 2 }));
	// Too many pixels: corrupt run lengths
	assert_eq!(decode_indexed(&[255, 3, 254, 2], 4), Err(PixelCountMismatch { expected: 4, actual: 5 }));
	assert_eq!(decode_direct(&[0, 0, 0, 0, 200], 100), Err(PixelCountMismatch { expected: 100, actual: 200 }));
}


#[test]
fn reject_partial_chunk() {
	assert_eq!(decode_indexed(&[255, 2, 254], 2), Err(TruncatedRunData(1)));
	assert_eq!(decode_direct(&[0, 0, 0, 0, 1, 0, 0], 1), Err(TruncatedRunData(2)));
}

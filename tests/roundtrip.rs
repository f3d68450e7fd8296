use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use libhip::*;
use libhip::HipError::*;


fn direct_file(width: u32, height: u32, runs: &[u8]) -> Vec<u8> {
	let mut file: Vec<u8> = vec![];
	file.write_all(b"HIP\0").unwrap();
	file.write_u32::<LittleEndian>(0x125).unwrap();
	file.write_u32::<LittleEndian>((32 + runs.len()) as u32).unwrap();
	file.write_u32::<LittleEndian>(0).unwrap();
	file.write_u32::<LittleEndian>(width).unwrap();
	file.write_u32::<LittleEndian>(height).unwrap();
	file.write_u32::<LittleEndian>(0x110).unwrap();
	file.write_u32::<LittleEndian>(0).unwrap();
	file.write_all(runs).unwrap();
	file
}


fn indexed_file(width: u32, height: u32, palette: &[u8], runs: &[u8]) -> Vec<u8> {
	let mut file: Vec<u8> = vec![];
	file.write_all(b"HIP\0").unwrap();
	file.write_u32::<LittleEndian>(0x125).unwrap();
	file.write_u32::<LittleEndian>((64 + palette.len() + runs.len()) as u32).unwrap();
	file.write_u32::<LittleEndian>(256).unwrap();
	file.write_u32::<LittleEndian>(0).unwrap();
	file.write_u32::<LittleEndian>(0).unwrap();
	file.write_u32::<LittleEndian>(0).unwrap();
	file.write_u32::<LittleEndian>(32).unwrap();
	file.write_u32::<LittleEndian>(width).unwrap();
	file.write_u32::<LittleEndian>(height).unwrap();
	file.write_all(&[0; 24]).unwrap();
	file.write_all(palette).unwrap();
	file.write_all(runs).unwrap();
	file
}


/// Disk palette with logical index 0 black and logical index 1 white, both opaque
fn black_white_disk_palette() -> Vec<u8> {
	let mut palette = vec![0u8; 1024];
	// Disk entry 255 is logical 0, disk entry 254 is logical 1
	palette[1020..1024].copy_from_slice(&[0, 0, 0, 255]);
	palette[1016..1020].copy_from_slice(&[255, 255, 255, 255]);
	palette
}


#[test]
fn two_by_two_indexed_file() {
	let file = indexed_file(2, 2, &black_white_disk_palette(), &[255, 2, 254, 2]);
	let image = HipImage::from_bytes(&file).unwrap();

	assert_eq!((image.width, image.height, image.kind()), (2, 2, HipImageKind::Indexed));

	match &image.pixels {
		HipPixels::Indexed { palette, indices } => {
			assert_eq!(indices, &vec![0, 0, 1, 1]);
			assert_eq!(palette.rgba(0).0, [0, 0, 0, 255]);
			assert_eq!(palette.rgba(1).0, [255, 255, 255, 255]);
		},
		other => panic!("unexpected {:?}", other),
	};

	assert_eq!(image.to_bytes().unwrap(), file);
}


#[test]
fn indexed_file_is_saved_byte_for_byte() {
	let palette: Vec<u8> = (0..1024).map(|i| (i * 31 % 251) as u8).collect();
	// Runs of 255 followed by a short run, and single pixels
	let runs = [0, 255, 0, 45, 7, 1, 8, 1, 7, 1, 200, 97];
	let file = indexed_file(20, 20, &palette, &runs);

	let image = HipImage::from_bytes(&file).unwrap();
	assert_eq!(image.pixels.len(), 400);
	assert_eq!(image.to_bytes().unwrap(), file);
}


#[test]
fn direct_file_is_saved_byte_for_byte() {
	let runs = [
		0x10, 0x20, 0x30, 0xFF, 255,
		0x10, 0x20, 0x30, 0xFF, 5,
		0x00, 0x00, 0x00, 0x00, 1,
		0x01, 0x02, 0x03, 0x04, 3,
	];
	let file = direct_file(33, 8, &runs);

	let image = HipImage::from_bytes(&file).unwrap();
	assert_eq!((image.width, image.height, image.kind()), (33, 8, HipImageKind::Direct));

	match &image.pixels {
		HipPixels::Direct { rgba } => {
			assert_eq!(rgba.len(), 264);
			assert_eq!(rgba[0].0, [0x30, 0x20, 0x10, 0xFF]);
			assert_eq!(rgba[260].0, [0, 0, 0, 0]);
			assert_eq!(rgba[263].0, [0x03, 0x02, 0x01, 0x04]);
		},
		other => panic!("unexpected {:?}", other),
	};

	assert_eq!(image.to_bytes().unwrap(), file);
}


#[test]
fn indexed_png_roundtrip() {
	let file = indexed_file(2, 2, &black_white_disk_palette(), &[255, 2, 254, 2]);
	let image = HipImage::from_bytes(&file).unwrap();

	let png = HipDecoder::with_hip(image.clone()).to_png_bytes().unwrap();

	match load_png(&mut &png[..]).unwrap() {
		PngImage::Indexed(indexed) => {
			assert_eq!(indexed.indices, vec![0, 0, 1, 1]);
			assert_eq!(&indexed.palette.rgb_bytes()[..6], &[0u8, 0, 0, 255, 255, 255][..]);
			assert_eq!(&indexed.palette.alpha[..3], &[255u8, 255, 0][..]);
		},
		other => panic!("unexpected {:?}", other),
	};

	let back = HipEncoder::read_png(&mut &png[..]).unwrap().encode().unwrap();
	assert_eq!(back, image);
	assert_eq!(back.to_bytes().unwrap(), file);
}


#[test]
fn translucent_palette_survives_png() {
	let mut palette = HipPalette::default();

	for i in 0..256usize {
		palette.colors[i] = image::Rgb([i as u8, 0, 255 - i as u8]);
		palette.alpha[i] = (255 - i) as u8;
	};

	let indices: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
	let image = HipImage::indexed(8, 8, palette, indices).unwrap();

	let png = HipDecoder::with_hip(image.clone()).to_png_bytes().unwrap();
	let back = HipEncoder::read_png(&mut &png[..]).unwrap().encode().unwrap();
	assert_eq!(back, image);
}


#[test]
fn direct_png_roundtrip() {
	let rgba: Vec<image::Rgba<u8>> = (0..12u8).map(|i| image::Rgba([i, i * 2, i * 3, 255 - i])).collect();
	let image = HipImage::direct(4, 3, rgba).unwrap();

	let decoder = HipDecoder::with_hip(image.clone());
	let png = decoder.to_png_bytes().unwrap();
	assert_eq!(load_png_direct(&png).unwrap(), decoder.decode_rgba8().unwrap());

	let back = HipEncoder::read_png(&mut &png[..]).unwrap().encode().unwrap();
	assert_eq!(back, image);
}


#[test]
fn reject_file_size_off_by_one() {
	let mut file = direct_file(1, 1, &[0, 0, 0, 0, 1]);
	file[8] += 1;
	assert_eq!(HipImage::from_bytes(&file), Err(FileSizeMismatch { declared: 38, actual: 37 }));

	let mut file = direct_file(1, 1, &[0, 0, 0, 0, 1]);
	file.push(0);
	assert_eq!(HipImage::from_bytes(&file), Err(FileSizeMismatch { declared: 37, actual: 38 }));
}


#[test]
fn reject_unsupported_color_count() {
	let mut file = indexed_file(2, 2, &black_white_disk_palette(), &[255, 2, 254, 2]);
	file[12..16].copy_from_slice(&4u32.to_le_bytes());

	let error = HipImage::from_bytes(&file).unwrap_err();
	assert_eq!(error, UnsupportedColorCount(4));
	assert_eq!(error.category(), HipErrorCategory::Format);
}


#[test]
fn reject_run_lengths_that_do_not_cover_image() {
	let file = indexed_file(2, 2, &black_white_disk_palette(), &[255, 2, 254, 1]);
	assert_eq!(HipImage::from_bytes(&file), Err(PixelCountMismatch { expected: 4, actual: 3 }));

	let file = direct_file(2, 2, &[0, 0, 0, 0, 5]);
	assert_eq!(HipImage::from_bytes(&file), Err(PixelCountMismatch { expected: 4, actual: 5 }));
}


#[test]
fn reject_short_palette() {
	let file = indexed_file(1, 1, &[0; 1000], &[]);
	assert_eq!(HipImage::from_bytes(&file), Err(UnexpectedEof));
}


#[test]
fn reject_non_hip_input() {
	assert_eq!(HipImage::from_bytes(b"\x89PNG\r\n\x1a\n"), Err(UnknownSignature(*b"\x89PNG")));
	assert_eq!(HipImage::from_bytes(&[]), Err(UnknownSignature([0; 4])));
}


#[test]
fn unusual_header_constants_are_normalized() {
	let mut file = direct_file(1, 1, &[1, 2, 3, 4, 1]);
	file[4..8].copy_from_slice(&0x999u32.to_le_bytes());

	let image = HipImage::from_bytes(&file).unwrap();
	let saved = image.to_bytes().unwrap();
	assert_eq!(&saved[4..8], &0x125u32.to_le_bytes());
	assert_eq!(saved[8..], file[8..]);
}

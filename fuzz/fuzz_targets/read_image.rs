#![no_main]
use libfuzzer_sys::fuzz_target;

use libhip::HipImage;

fuzz_target!(|data: &[u8]| {
	if let Ok(image) = HipImage::from_bytes(data) {
		let _ = image.to_bytes();
	};
});

#![no_main]
use libfuzzer_sys::fuzz_target;

use libhip::HipImage;

fuzz_target!(|image: HipImage| {
	let data = image.to_bytes().unwrap();
	let parsed = HipImage::from_bytes(&data).unwrap();
	assert_eq!(parsed, image);
	assert_eq!(parsed.to_bytes().unwrap(), data);
});

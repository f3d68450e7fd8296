#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|indices: Vec<u8>| {
	let encoded = libhip::encode_indexed(&indices).unwrap();
	assert_eq!(encoded.len() % 2, 0);
	assert!(encoded.chunks(2).all(|c| c[1] >= 1));

	let decoded = libhip::decode_indexed(&encoded, indices.len()).unwrap();
	assert_eq!(decoded, indices);
});

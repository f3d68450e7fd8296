macro_rules! log {
	($fn:ident, $($arg:tt)*) => {
		#[cfg(feature = "log")]
		log::$fn!(target: "libhip", $($arg)*);
	}
}

pub(crate) use log;

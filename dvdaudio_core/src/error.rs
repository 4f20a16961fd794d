/*!
# DVD-Audio: Errors
*/

use std::{
	error::Error as StdError,
	fmt,
};



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
///
/// Every failure mode the read path can hit collapses into one of these
/// four buckets, matching the taxonomy a caller actually needs to act on.
/// End-of-stream is deliberately *not* a variant here: it's surfaced
/// structurally, as `Ok(0)`/`Ok(None)`, per the propagation policy below.
pub enum Error {
	/// # A required file is missing.
	///
	/// `AUDIO_TS.IFO`, an `ATS_XX_0.IFO`, an `ATS_XX_Y.AOB`, or
	/// `DVDAUDIO.MKB` could not be found or opened.
	NotFound(String),

	/// # The MPEG-2 program-stream container is malformed.
	///
	/// Bad magic, a bad pack header, a bad packet start code, or a short
	/// sector.
	MalformedContainer(&'static str),

	/// # The stream declares something this reader cannot decode.
	///
	/// An unknown codec id, an unknown bps/rate code, or a
	/// `channel_assignment` greater than 20.
	UnsupportedStream(&'static str),

	/// # The codec's own bitstream is malformed.
	///
	/// No MLP major sync was ever found, a substream's parity or CRC-8
	/// check failed, the FIR+IIR order sum exceeded eight, non-zero filter
	/// shifts disagreed, or a Huffman code didn't match any codebook entry.
	MalformedCodecFrame(&'static str),

	/// # An internal invariant was violated.
	///
	/// Per spec: implementations should treat this as end-of-stream rather
	/// than abort, but the condition is still worth reporting to whatever
	/// caller is deciding whether to retry, log, or resume elsewhere.
	Bug(&'static str),

	/// # A disc/track/titleset number fell outside the valid range.
	Parameter(&'static str),

	#[cfg(feature = "bin")]
	/// # Invalid CLI argument.
	CliArg(String),
}

impl StdError for Error {}

impl From<std::io::Error> for Error {
	#[inline]
	fn from(err: std::io::Error) -> Self { Self::NotFound(err.to_string()) }
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotFound(s) => write!(f, "Not found: {s}."),
			Self::MalformedContainer(s) => write!(f, "Malformed MPEG-2 program stream: {s}."),
			Self::UnsupportedStream(s) => write!(f, "Unsupported stream: {s}."),
			Self::MalformedCodecFrame(s) => write!(f, "Malformed codec frame: {s}."),
			Self::Bug(s) => write!(f, "Internal inconsistency: {s}."),
			Self::Parameter(s) => write!(f, "Invalid parameter: {s}."),

			#[cfg(feature = "bin")]
			Self::CliArg(s) => write!(f, "Invalid CLI option: {s}"),
		}
	}
}

#[cfg(feature = "bin")]
impl From<Error> for fyi_msg::Msg {
	#[inline]
	fn from(src: Error) -> Self { Self::error(src.to_string()) }
}



/// # Convenience Result Alias.
pub type Result<T> = std::result::Result<T, Error>;

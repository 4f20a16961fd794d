/*!
# DVD-Audio: Stream Parameters

`StreamParameters` is the small field set shared by every codec header on a
DVD-A disc (the PCM header and the MLP major sync both carry the same five
fields). Whichever arrives first on a track latches the stream's format;
every later occurrence — another PCM header, another MLP major sync — must
match it exactly or the track reader ends the stream.
*/

use crate::error::Error;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Stream Parameters.
pub struct StreamParameters {
	/// # Group 0 Bits-per-sample Code.
	pub group_0_bps: u8,
	/// # Group 1 Bits-per-sample Code.
	pub group_1_bps: u8,
	/// # Group 0 Sample-rate Code.
	pub group_0_rate: u8,
	/// # Group 1 Sample-rate Code.
	pub group_1_rate: u8,
	/// # Channel Assignment Code.
	pub channel_assignment: u8,
}

impl StreamParameters {
	#[must_use]
	/// # Group 0 Bits-per-sample.
	///
	/// Zero if the code is out of range (a caller probing a new track
	/// should treat that as [`Error::UnsupportedStream`]).
	pub const fn bits_per_sample(&self) -> u8 { unpack_bits_per_sample(self.group_0_bps) }

	#[must_use]
	/// # Group 0 Sample Rate (Hz).
	pub const fn sample_rate(&self) -> u32 { unpack_sample_rate(self.group_0_rate) }

	/// # Channel Assignment.
	///
	/// ## Errors
	///
	/// See [`crate::channels::ChannelAssignment::from_code`].
	pub fn channels(&self) -> Result<crate::channels::ChannelAssignment, Error> {
		crate::channels::ChannelAssignment::from_code(self.channel_assignment)
	}
}



#[must_use]
/// # Unpack Bits-per-sample Code.
///
/// Returns 0 for an unrecognized code (including the valid-but-unsupported
/// 20-bit mode, per spec: the deinterleaver never exercises it).
pub(crate) const fn unpack_bits_per_sample(code: u8) -> u8 {
	match code {
		0 => 16,
		2 => 24,
		_ => 0,
	}
}

#[must_use]
/// # Unpack Sample-rate Code.
///
/// Returns 0 for an unrecognized code.
pub(crate) const fn unpack_sample_rate(code: u8) -> u32 {
	match code {
		0 => 48_000,
		1 => 96_000,
		2 => 192_000,
		8 => 44_100,
		9 => 88_200,
		10 => 176_400,
		_ => 0,
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bps_code_16_and_24() {
		assert_eq!(unpack_bits_per_sample(0), 16);
		assert_eq!(unpack_bits_per_sample(2), 24);
		assert_eq!(unpack_bits_per_sample(1), 0); // 20-bit: unsupported.
	}

	#[test]
	fn rate_codes() {
		assert_eq!(unpack_sample_rate(0), 48_000);
		assert_eq!(unpack_sample_rate(8), 44_100);
		assert_eq!(unpack_sample_rate(10), 176_400);
		assert_eq!(unpack_sample_rate(99), 0);
	}

	#[test]
	fn equal_params_match() {
		let a = StreamParameters { group_0_bps: 0, group_1_bps: 0, group_0_rate: 0, group_1_rate: 0, channel_assignment: 1 };
		let b = a;
		assert_eq!(a, b);
	}
}

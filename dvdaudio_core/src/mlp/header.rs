/*!
# MLP: Major Sync, Substream Info, Restart Header
*/

use crate::{
	error::Error,
	mlp::MAX_MLP_CHANNELS,
	stream::StreamParameters,
};
use bitreader::BitReader;



/// # Major Sync Sync Word.
const SYNC_WORDS: u32 = 0xF8_726F;

/// # Major Sync Stream Type.
const STREAM_TYPE: u8 = 0xBB;

/// # Restart Header Sync.
const RESTART_SYNC: u16 = 0x18F5;



#[derive(Debug, Clone, Copy)]
/// # Major Sync.
pub(crate) struct MajorSync {
	/// # Shared Stream Parameters.
	pub parameters: StreamParameters,
	/// # Variable Bitrate Flag.
	pub is_vbr: bool,
	/// # Peak Bitrate.
	pub peak_bitrate: u16,
	/// # Substream Count (1 or 2).
	pub substream_count: u8,
}

/// # Major Sync Size (Bytes).
///
/// The field widths (`24+8+4+4+4+4+11+5+48+1+15+4+92` bits) sum to exactly
/// 224 bits, so a major sync — present or absent — never disturbs the
/// frame's byte alignment.
pub(super) const MAJOR_SYNC_SIZE: usize = 28;

impl MajorSync {
	/// # Try To Read A Major Sync From The Start Of `body`.
	///
	/// Returns `Ok(None)` without error when `body` is too short, or when
	/// the sync words / stream type / substream count don't validate —
	/// both cases mean "this frame has no major sync", which is normal,
	/// not a parse failure. On success, also returns the number of bytes
	/// consumed ([`MAJOR_SYNC_SIZE`]).
	pub(crate) fn try_read(body: &[u8]) -> Result<Option<(Self, usize)>, Error> {
		if body.len() < MAJOR_SYNC_SIZE { return Ok(None); }

		let mut r = BitReader::new(&body[..MAJOR_SYNC_SIZE]);
		let bad = |_| Error::Bug("major sync region is a fixed size but a read still failed");

		let sync_words = r.read_u32(24).map_err(bad)?;
		let stream_type = r.read_u8(8).map_err(bad)?;
		let group_0_bps = r.read_u8(4).map_err(bad)?;
		let group_1_bps = r.read_u8(4).map_err(bad)?;
		let group_0_rate = r.read_u8(4).map_err(bad)?;
		let group_1_rate = r.read_u8(4).map_err(bad)?;
		r.skip(11).map_err(bad)?;
		let channel_assignment = r.read_u8(5).map_err(bad)?;
		r.skip(48).map_err(bad)?;
		let is_vbr = r.read_bool().map_err(bad)?;
		let peak_bitrate = r.read_u16(15).map_err(bad)?;
		let substream_count = r.read_u8(4).map_err(bad)?;
		r.skip(92).map_err(bad)?;

		let valid = sync_words == SYNC_WORDS
			&& stream_type == STREAM_TYPE
			&& (substream_count == 1 || substream_count == 2);

		if valid {
			Ok(Some((
				Self {
					parameters: StreamParameters {
						group_0_bps, group_1_bps, group_0_rate, group_1_rate, channel_assignment,
					},
					is_vbr,
					peak_bitrate,
					substream_count,
				},
				MAJOR_SYNC_SIZE,
			)))
		}
		else {
			Ok(None)
		}
	}
}



#[derive(Debug, Clone, Copy, Default)]
/// # Substream Info Block.
pub(super) struct SubstreamInfo {
	/// # Non-restart Substream Flag (informational only).
	pub nonrestart_substream: bool,
	/// # Checkdata Present Flag.
	pub checkdata_present: bool,
	/// # Substream End, In Bytes From The Start Of The Substream Region.
	pub substream_end: u32,
}

impl SubstreamInfo {
	/// # Read.
	///
	/// ## Errors
	///
	/// Returns [`Error::UnsupportedStream`] if `extraword_present` is set
	/// (no extraword variant is supported), or [`Error::MalformedCodecFrame`]
	/// on a short read.
	pub(super) fn read(r: &mut BitReader) -> Result<Self, Error> {
		let bad = |_| Error::MalformedCodecFrame("short substream info block");
		let extraword_present = r.read_bool().map_err(bad)?;
		let nonrestart_substream = r.read_bool().map_err(bad)?;
		let checkdata_present = r.read_bool().map_err(bad)?;
		r.skip(1).map_err(bad)?;
		let substream_end = u32::from(r.read_u16(12).map_err(bad)?) * 2;

		if extraword_present {
			return Err(Error::UnsupportedStream("MLP extraword_present substreams are unsupported"));
		}

		Ok(Self { nonrestart_substream, checkdata_present, substream_end })
	}
}



#[derive(Debug, Clone, Copy)]
/// # Restart Header.
pub(super) struct RestartHeader {
	/// # Minimum Channel Index.
	pub min_channel: u8,
	/// # Maximum Channel Index.
	pub max_channel: u8,
	/// # Maximum Matrix Channel Index.
	pub max_matrix_channel: u8,
	/// # Noise Shift.
	pub noise_shift: u8,
	/// # Noise Generator Seed.
	pub noise_gen_seed: u32,
}

impl RestartHeader {
	/// # Read.
	///
	/// The per-channel 6-bit `channel_assignment` entries and the trailing
	/// checksum are read and validated but not retained; per the reference
	/// decoder they have no further effect on decoding.
	///
	/// ## Errors
	///
	/// Returns [`Error::MalformedCodecFrame`] on a bad sync word, a
	/// non-zero noise type, an out-of-order channel bound, an
	/// out-of-range per-channel assignment, or a short read.
	pub(super) fn read(r: &mut BitReader) -> Result<Self, Error> {
		let bad = |_| Error::MalformedCodecFrame("short restart header");

		let sync = r.read_u16(13).map_err(bad)?;
		let noise_type = r.read_bool().map_err(bad)?;
		let _output_timestamp = r.read_u16(16).map_err(bad)?;
		let min_channel = r.read_u8(4).map_err(bad)?;
		let max_channel = r.read_u8(4).map_err(bad)?;
		let max_matrix_channel = r.read_u8(4).map_err(bad)?;
		let noise_shift = r.read_u8(4).map_err(bad)?;
		let noise_gen_seed = r.read_u32(23).map_err(bad)?;
		r.skip(19).map_err(bad)?;
		let _check_data_present = r.read_bool().map_err(bad)?;
		let _lossless_check = r.read_u8(8).map_err(bad)?;
		r.skip(16).map_err(bad)?;

		if sync != RESTART_SYNC { return Err(Error::MalformedCodecFrame("bad restart header sync")); }
		if noise_type { return Err(Error::MalformedCodecFrame("restart header noise_type must be 0")); }
		if max_channel < min_channel || max_matrix_channel < max_channel {
			return Err(Error::MalformedCodecFrame("restart header channel bounds out of order"));
		}

		for _ in 0..=max_matrix_channel {
			let assignment = r.read_u8(6).map_err(bad)?;
			if assignment > max_matrix_channel {
				return Err(Error::MalformedCodecFrame("restart header channel_assignment out of range"));
			}
		}
		let _checksum = r.read_u8(8).map_err(bad)?;

		// Matrix coefficients are stored `0..=max_matrix_channel` plus two
		// trailing noise-channel slots, all in a `MAX_MLP_CHANNELS`-sized
		// array (see `MatrixParameters::coeff`), so `max_matrix_channel`
		// must leave room for both.
		if usize::from(max_matrix_channel) + 2 >= MAX_MLP_CHANNELS {
			return Err(Error::MalformedCodecFrame("restart header channel count exceeds maximum"));
		}

		Ok(Self { min_channel, max_channel, max_matrix_channel, noise_shift, noise_gen_seed })
	}
}

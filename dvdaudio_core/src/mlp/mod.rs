/*!
# DVD-Audio: MLP Decoder (L4b)

Meridian Lossless Packing: frame sync discovery, substream parity/CRC,
Huffman residuals, IIR/FIR synthesis, matrix rematrixing, noise shaping,
and RIFF-WAVE channel reordering. This is the largest and most intricate
piece of the read path; the submodules mirror the reference decoder's own
split (major sync / restart / decoding parameters / residuals / filter
synthesis / rematrix).
*/

mod filter;
mod header;
mod matrix;
mod params;
mod residual;
mod tables;

pub(crate) use header::MajorSync;

use crate::{
	error::Error,
	stream::StreamParameters,
};
use bitreader::BitReader;
use header::{RestartHeader, SubstreamInfo};
use params::DecodingParameters;



/// # Maximum Substreams Per Stream.
const MAX_MLP_SUBSTREAMS: usize = 2;

/// # Maximum Matrices Per Substream.
const MAX_MLP_MATRICES: usize = 6;

/// # Maximum Channels (6 audio + 2 noise).
pub(crate) const MAX_MLP_CHANNELS: usize = 8;



/// # Rolling Byte Queue.
///
/// MLP frames don't align to PES packet boundaries, so packet payloads are
/// pushed onto this queue and frames are pulled back off once enough bytes
/// have accumulated. Consumed bytes are only reclaimed by compaction, kept
/// cheap by doing it once per drain rather than per byte.
#[derive(Debug, Default)]
struct ByteQueue {
	buf: Vec<u8>,
	pos: usize,
}

impl ByteQueue {
	/// # Push.
	fn push(&mut self, bytes: &[u8]) {
		if self.pos > 0 && self.pos == self.buf.len() {
			self.buf.clear();
			self.pos = 0;
		}
		else if self.pos > 1 << 16 {
			self.buf.drain(..self.pos);
			self.pos = 0;
		}
		self.buf.extend_from_slice(bytes);
	}

	#[must_use]
	/// # Remaining Bytes.
	fn remaining(&self) -> &[u8] { &self.buf[self.pos..] }

	/// # Advance The Read Position.
	fn consume(&mut self, n: usize) { self.pos += n; }
}



/// # One Substream's Persisted Decode State.
#[derive(Debug, Default)]
struct Substream {
	restart: Option<RestartHeader>,
	params: DecodingParameters,
	/// # Per-channel Accumulated (Filtered) Samples For The Current Frame.
	channels: [Vec<i64>; MAX_MLP_CHANNELS],
	/// # Per-channel Raw Residuals, Scratch Space Reused Per Block.
	residuals: [Vec<i64>; MAX_MLP_CHANNELS],
	/// # Per-matrix Bypassed-LSB Bits, Scratch Space Reused Per Block.
	bypassed_lsb: Vec<Vec<i32>>,
}

impl Substream {
	/// # Decode One Block.
	///
	/// Returns the block's sample count (its contribution to this frame's
	/// total), or an error ending the substream's contribution to this
	/// frame. The end-of-substream flag is read and returned separately.
	fn decode_block(&mut self, r: &mut BitReader) -> Result<u16, Error> {
		let bad = |_| Error::MalformedCodecFrame("short block header");

		if r.read_bool().map_err(bad)? {
			let restart_present = r.read_bool().map_err(bad)?;
			if restart_present {
				self.restart = Some(RestartHeader::read(r)?);
			}
			let rh = self.restart.as_ref()
				.ok_or(Error::MalformedCodecFrame("decoding parameters before any restart header"))?;
			let (min_channel, max_channel, max_matrix_channel) =
				(rh.min_channel, rh.max_channel, rh.max_matrix_channel);
			self.params.decode_body(r, restart_present, min_channel, max_channel, max_matrix_channel)?;
		}

		let rh = self.restart.as_ref()
			.ok_or(Error::MalformedCodecFrame("residual data before any restart header"))?;
		let (min_channel, max_channel) = (rh.min_channel, rh.max_channel);

		residual::decode_block_residuals(
			r,
			min_channel,
			max_channel,
			self.params.block_size,
			&self.params.matrix,
			&self.params.quant_step_size,
			&self.params.channel,
			&mut self.residuals,
			&mut self.bypassed_lsb,
		)?;

		for c in usize::from(min_channel)..=usize::from(max_channel) {
			let filtered = filter::filter_channel(
				&self.residuals[c],
				&mut self.params.channel[c].fir,
				&mut self.params.channel[c].iir,
				self.params.quant_step_size[c],
			)?;
			self.channels[c].extend_from_slice(&filtered);
		}

		Ok(self.params.block_size)
	}
}



#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// # Stream State.
enum State {
	/// # No Major Sync Seen Yet.
	Initial,
	/// # Decoding Normally.
	Running,
	/// # Past `last_sector`; Decoding Until The Next Major Sync.
	Terminating,
	/// # Finished.
	Done,
}

/// # MLP Decoder (L4b).
pub(crate) struct MlpDecoder {
	queue: ByteQueue,
	state: State,
	parameters: Option<StreamParameters>,
	substream_count: u8,
	substreams: [Substream; MAX_MLP_SUBSTREAMS],
}

impl Default for MlpDecoder {
	fn default() -> Self {
		Self {
			queue: ByteQueue::default(),
			state: State::Initial,
			parameters: None,
			substream_count: 1,
			substreams: Default::default(),
		}
	}
}

impl MlpDecoder {
	#[must_use]
	/// # New.
	pub(crate) fn new() -> Self { Self::default() }

	#[must_use]
	/// # Latched Stream Parameters, If A Major Sync Has Been Seen.
	pub(crate) const fn parameters(&self) -> Option<StreamParameters> { self.parameters }

	#[must_use]
	/// # Whether Decoding Has Finished (Terminating State Exhausted).
	pub(crate) fn is_done(&self) -> bool { self.state == State::Done }

	/// # Signal That The Track's Last Sector Has Been Passed.
	///
	/// The decoder will keep decoding only until the next major sync, then
	/// stop, per the track reader's termination rule.
	pub(crate) fn begin_terminating(&mut self) {
		if self.state == State::Running { self.state = State::Terminating; }
	}

	/// # Decode A Packet's Worth Of MLP Data.
	///
	/// Pushes `payload` onto the rolling frame-reassembly queue, then
	/// drains and decodes as many complete frames as are available,
	/// appending RIFF-WAVE-ordered samples to `out` (one `Vec` per output
	/// channel). Returns the number of PCM frames produced.
	///
	/// ## Errors
	///
	/// A malformed frame ends the stream (`self.state` becomes
	/// [`State::Done`]); samples already appended to `out` remain valid.
	pub(crate) fn decode_packet(&mut self, payload: &[u8], out: &mut [Vec<i64>]) -> Result<usize, Error> {
		if self.state == State::Done { return Ok(0); }

		self.queue.push(payload);
		let mut produced = 0_usize;

		while let Some(frame_len) = self.peek_frame_len() {
			if self.queue.remaining().len() < frame_len { break; }

			let body = self.queue.remaining()[4..frame_len].to_vec();
			self.queue.consume(frame_len);

			match self.decode_frame(&body, out) {
				Ok(n) => produced += n,
				Err(_) => { self.state = State::Done; return Ok(produced); },
			}

			if self.state == State::Done { break; }
		}

		Ok(produced)
	}

	/// # Peek The Next Frame's Total Length (Bytes), If Enough Are Buffered.
	fn peek_frame_len(&self) -> Option<usize> {
		let buf = self.queue.remaining();
		if buf.len() < 4 { return None; }

		let mut r = BitReader::new(&buf[..4]);
		r.skip(4).ok()?;
		let total_frame_size = r.read_u16(12).ok()?;
		Some(usize::from(total_frame_size) * 2)
	}

	/// # Decode One Frame Body (After Its 4-byte Size Header).
	fn decode_frame(&mut self, body: &[u8], out: &mut [Vec<i64>]) -> Result<usize, Error> {
		let (major_sync, consumed) = match MajorSync::try_read(body)? {
			Some((sync, n)) => (Some(sync), n),
			None => (None, 0),
		};

		if let Some(sync) = major_sync {
			match self.parameters {
				Some(existing) if existing == sync.parameters => {},
				Some(_) => return Err(Error::MalformedCodecFrame("major sync parameters changed mid-stream")),
				None => {
					self.parameters = Some(sync.parameters);
					self.substream_count = sync.substream_count;
					self.state = State::Running;
				},
			}
		}

		if self.parameters.is_none() {
			// Initial state: no major sync latched yet and this frame
			// didn't carry one either. Skip it silently.
			return Ok(0);
		}

		let terminating_and_synced = self.state == State::Terminating && major_sync.is_some();

		let mut r = BitReader::new(&body[consumed..]);

		let mut infos = Vec::with_capacity(usize::from(self.substream_count));
		for _ in 0..self.substream_count {
			infos.push(SubstreamInfo::read(&mut r)?);
		}

		let region = &body[consumed + usize::from(self.substream_count) * 2..];
		let mut produced = 0_usize;
		let mut start = 0_usize;

		for (idx, info) in infos.iter().enumerate() {
			let end = info.substream_end as usize;
			let len = end.checked_sub(start)
				.ok_or(Error::MalformedCodecFrame("substream_end values out of order"))?;
			if len < 2 && info.checkdata_present {
				return Err(Error::MalformedCodecFrame("substream too short for checkdata"));
			}
			let slice = region.get(start..end)
				.ok_or(Error::MalformedCodecFrame("substream region out of bounds"))?;
			start = end;

			let body_slice = if info.checkdata_present {
				match validate_checkdata(slice) {
					Some(body) => body,
					None => continue, // parity/CRC mismatch: skip this substream's contribution.
				}
			}
			else {
				slice
			};

			let mut sr = BitReader::new(body_slice);
			let substream = &mut self.substreams[idx];
			for c in substream.channels.iter_mut() { c.clear(); }

			loop {
				match substream.decode_block(&mut sr) {
					Ok(_) => {},
					Err(_) => break,
				}
				let end_flag = sr.read_bool().unwrap_or(true);
				if end_flag { break; }
			}

			produced = produced.max(substream.channels[0].len());
		}

		self.rematrix_and_emit(out)?;

		if terminating_and_synced { self.state = State::Done; }

		Ok(produced)
	}

	/// # Rematrix, Apply Output Shift, And Reorder Into `out`.
	fn rematrix_and_emit(&mut self, out: &mut [Vec<i64>]) -> Result<usize, Error> {
		let params = self.parameters.ok_or(Error::Bug("rematrix attempted with no latched parameters"))?;
		let assignment = params.channels()?;

		let governing = if self.substream_count == 2 { 1 } else { 0 };
		let rh = self.substreams[governing].restart.clone()
			.ok_or(Error::MalformedCodecFrame("rematrix attempted with no restart header"))?;

		// Substream 1 (when present) shares substream 0's channel
		// accumulator; copy substream 0's decoded channels across before
		// rematrixing so both contribute to the same buffer.
		if self.substream_count == 2 {
			let (s0, s1) = self.substreams.split_at_mut(1);
			for c in 0..MAX_MLP_CHANNELS {
				if s1[0].channels[c].is_empty() && ! s0[0].channels[c].is_empty() {
					s1[0].channels[c] = std::mem::take(&mut s0[0].channels[c]);
				}
			}
		}

		let block_len = self.substreams[governing].channels.iter()
			.map(Vec::len)
			.find(|&l| l > 0)
			.unwrap_or(0);
		if block_len == 0 { return Ok(0); }

		let mut seed = rh.noise_gen_seed;
		let (noise0, noise1) = matrix::generate_noise(&mut seed, rh.noise_shift, block_len);
		self.substreams[governing].restart.as_mut().unwrap().noise_gen_seed = seed;

		matrix::apply_matrices(
			&mut self.substreams[governing].channels,
			rh.max_matrix_channel,
			&self.substreams[governing].params.matrix,
			&self.substreams[governing].params.quant_step_size,
			&self.substreams[governing].bypassed_lsb,
			&noise0,
			&noise1,
		);
		matrix::apply_output_shift(
			&mut self.substreams[governing].channels,
			rh.max_matrix_channel,
			&self.substreams[governing].params.output_shift,
		);
		matrix::reorder_to_wave(&mut self.substreams[governing].channels, &assignment, out);

		if self.substream_count == 2 {
			for c in self.substreams[0].channels.iter_mut() { c.clear(); }
		}

		Ok(block_len)
	}
}

/// # Validate Parity + CRC-8, Returning The Body (Sans Trailer) On Success.
fn validate_checkdata(slice: &[u8]) -> Option<&[u8]> {
	if slice.len() < 2 { return None; }
	let (body, trailer) = slice.split_at(slice.len() - 2);
	let (parity_byte, crc_byte) = (trailer[0], trailer[1]);

	let mut parity = 0_u8;
	let mut crc = tables::CRC8_INIT;
	for &byte in body {
		parity ^= byte;
		crc = tables::CRC8[usize::from(crc ^ byte)];
	}

	if parity_byte ^ parity != tables::PARITY_CHECK { return None; }
	if crc_byte != crc { return None; }

	Some(body)
}

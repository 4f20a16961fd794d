/*!
# DVD-Audio: Track Reader (L3)

Opens a track by seeking L1 to its first sector, probes the leading audio
packet for a codec id and stream parameters, and pumps packets through the
matching decoder into per-channel buffers that [`TrackReader::read`] drains
in RIFF-WAVE channel order.
*/

use crate::{
	channels::ChannelAssignment,
	demux::PacketReader,
	error::Error,
	mlp::MlpDecoder,
	pcm::PcmDecoder,
	sector::{AobReader, CppmConfig, Descrambler},
	stream::StreamParameters,
};
use bitreader::BitReader;
use std::collections::VecDeque;



/// # PCM Codec Id.
pub(crate) const CODEC_PCM: u8 = 0xA0;

/// # MLP Codec Id.
pub(crate) const CODEC_MLP: u8 = 0xA1;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Codec.
pub enum Codec {
	/// # DVD-Audio PCM.
	Pcm,
	/// # Meridian Lossless Packing.
	Mlp,
}

/// # Per-codec Decoder State.
enum Decoder {
	/// # PCM (L4a).
	Pcm(PcmDecoder),
	/// # MLP (L4b).
	Mlp(Box<MlpDecoder>),
}



#[derive(Debug, Clone, Copy)]
/// # Track Descriptor.
///
/// Input to [`open_track_reader`]; normally populated by external IFO
/// navigation (out of scope for this crate).
pub struct TrackDescriptor {
	/// # Title Set Number (1-99).
	pub titleset: u8,
	/// # First Sector (Global Index Within The Title Set).
	pub first_sector: u32,
	/// # Last Sector (Inclusive).
	pub last_sector: u32,
	/// # PTS Length, In 90000-tick-per-second Units.
	pub pts_length: u32,
}

/// # Track Reader (L3).
pub struct TrackReader<D: Descrambler> {
	packets: PacketReader<D>,
	decoder: Decoder,
	parameters: StreamParameters,
	assignment: ChannelAssignment,
	last_sector: u32,
	remaining_pcm_frames: u32,
	buffers: Vec<VecDeque<i64>>,
	finished: bool,
}

impl<D: Descrambler> TrackReader<D> {
	/// # Open A Track Reader.
	///
	/// Seeks L1 to `descriptor.first_sector`, pulls the first audio packet,
	/// and probes it for a codec id and stream parameters.
	///
	/// ## Errors
	///
	/// Returns [`Error::NotFound`] if the title set can't be opened,
	/// [`Error::Parameter`] if `first_sector > last_sector`,
	/// [`Error::UnsupportedStream`] for an unrecognized codec id or an
	/// invalid `channel_assignment`, or [`Error::MalformedContainer`] if no
	/// audio packet can be found at all.
	pub fn open(
		audio_ts_path: impl AsRef<std::path::Path>,
		descriptor: TrackDescriptor,
		cppm: &CppmConfig,
	) -> Result<Self, Error> {
		if descriptor.first_sector > descriptor.last_sector {
			return Err(Error::Parameter("track first_sector is after last_sector"));
		}

		let mut aob = AobReader::<D>::open(audio_ts_path, descriptor.titleset, cppm)?;
		aob.seek(descriptor.first_sector)?;
		let mut packets = PacketReader::new(aob);

		let (_sector, payload) = packets.next_audio_packet()?
			.ok_or(Error::MalformedContainer("no audio packet found at track start"))?;

		let preamble = AudioPreamble::read(&payload)?;

		match preamble.codec_id {
			CODEC_PCM => {
				let (parameters, data) = read_pcm_header(&payload, &preamble)?;
				let assignment = parameters.channels()?;
				let bits_per_sample = parameters.bits_per_sample();
				if bits_per_sample == 0 { return Err(Error::UnsupportedStream("PCM bits_per_sample code unsupported")); }

				let pcm = PcmDecoder::new(bits_per_sample, assignment.channel_count())?;
				let mut buffers = vec![VecDeque::new(); usize::from(assignment.channel_count())];
				let mut raw: Vec<Vec<i32>> = vec![Vec::new(); buffers.len()];
				pcm.decode_packet(data, &mut raw);
				for (buf, samples) in buffers.iter_mut().zip(raw) {
					buf.extend(samples.into_iter().map(i64::from));
				}

				let remaining_pcm_frames = pts_frame_bound(descriptor.pts_length, parameters.sample_rate());

				Ok(Self {
					packets,
					decoder: Decoder::Pcm(pcm),
					parameters,
					assignment,
					last_sector: descriptor.last_sector,
					remaining_pcm_frames,
					buffers,
					finished: false,
				})
			},
			CODEC_MLP => {
				let data = &payload[preamble.data_start()..];
				let mut mlp = Box::new(MlpDecoder::new());
				let mut buffers: Vec<VecDeque<i64>> = Vec::new();
				let parameters = feed_mlp_until_synced(&mut mlp, &mut packets, data, &mut buffers)?;
				let assignment = parameters.channels()?;

				let remaining_pcm_frames = pts_frame_bound(descriptor.pts_length, parameters.sample_rate());

				Ok(Self {
					packets,
					decoder: Decoder::Mlp(mlp),
					parameters,
					assignment,
					last_sector: descriptor.last_sector,
					remaining_pcm_frames,
					buffers,
					finished: false,
				})
			},
			_ => Err(Error::UnsupportedStream("unrecognized audio codec id")),
		}
	}

	#[must_use]
	/// # Codec.
	pub const fn codec(&self) -> Codec {
		match self.decoder {
			Decoder::Pcm(_) => Codec::Pcm,
			Decoder::Mlp(_) => Codec::Mlp,
		}
	}

	#[must_use]
	/// # Bits Per Sample.
	pub const fn bits_per_sample(&self) -> u8 { self.parameters.bits_per_sample() }

	#[must_use]
	/// # Sample Rate (Hz).
	pub const fn sample_rate(&self) -> u32 { self.parameters.sample_rate() }

	#[must_use]
	/// # Channel Count.
	pub const fn channel_count(&self) -> u8 { self.assignment.channel_count() }

	#[must_use]
	/// # RIFF-WAVE Channel Mask.
	pub const fn riff_wave_channel_mask(&self) -> u32 { self.assignment.wave_mask() }

	/// # Read.
	///
	/// Fills `out` (interleaved, channel-major, RIFF-WAVE order, length
	/// `n_frames * channel_count()`) and returns the number of frames
	/// actually produced (`< n_frames` only at end-of-stream).
	///
	/// ## Errors
	///
	/// A mid-stream parameter mismatch or malformed packet ends the stream
	/// (already-buffered samples are still emitted); the error itself is
	/// swallowed per the propagation policy, surfacing as a shorter read.
	pub fn read(&mut self, n_frames: usize, out: &mut [i32]) -> usize {
		let channels = self.buffers.len();
		debug_assert!(out.len() >= n_frames * channels);

		while ! self.finished
			&& self.buffers.iter().map(VecDeque::len).min().unwrap_or(0) < n_frames
			&& self.remaining_pcm_frames > 0
		{
			if self.pump_one_packet().is_err() { self.finished = true; }
		}

		let available = self.buffers.iter().map(VecDeque::len).min().unwrap_or(0);
		let emit = available.min(n_frames).min(self.remaining_pcm_frames as usize);
		self.remaining_pcm_frames -= emit as u32;

		for i in 0..emit {
			for (c, buf) in self.buffers.iter_mut().enumerate() {
				out[i * channels + c] = buf.pop_front().unwrap_or(0) as i32;
			}
		}

		emit
	}

	/// # Pump One Audio Packet Into The Decoder.
	fn pump_one_packet(&mut self) -> Result<(), Error> {
		let Some((sector, payload)) = self.packets.next_audio_packet()? else {
			self.finished = true;
			return Ok(());
		};

		if sector > self.last_sector {
			if let Decoder::Mlp(mlp) = &mut self.decoder { mlp.begin_terminating(); }
		}

		let preamble = AudioPreamble::read(&payload)?;

		match (&mut self.decoder, preamble.codec_id) {
			(Decoder::Pcm(pcm), CODEC_PCM) => {
				let (parameters, data) = read_pcm_header(&payload, &preamble)?;
				if parameters != self.parameters {
					self.finished = true;
					return Ok(());
				}
				let mut raw: Vec<Vec<i32>> = vec![Vec::new(); self.buffers.len()];
				pcm.decode_packet(data, &mut raw);
				for (buf, samples) in self.buffers.iter_mut().zip(raw) {
					buf.extend(samples.into_iter().map(i64::from));
				}
			},
			(Decoder::Mlp(mlp), CODEC_MLP) => {
				let data = &payload[preamble.data_start()..];
				let mut out = vec![Vec::new(); self.buffers.len()];
				mlp.decode_packet(data, &mut out)?;
				for (buf, samples) in self.buffers.iter_mut().zip(out) {
					buf.extend(samples);
				}
				if mlp.is_done() { self.finished = true; }
			},
			(Decoder::Mlp(_), _) => {}, // Codec mixing: skip non-MLP packets silently.
			_ => { self.finished = true; }, // PCM stream suddenly declares a different codec id.
		}

		Ok(())
	}
}

/// # Round `pts_length × rate / 90000`.
const fn pts_frame_bound(pts_length: u32, rate: u32) -> u32 {
	((pts_length as u64 * rate as u64 + 45_000) / 90_000) as u32
}

/// # Feed Packets Into An MLP Decoder Until A Major Sync Latches Parameters.
fn feed_mlp_until_synced<D: Descrambler>(
	mlp: &mut MlpDecoder,
	packets: &mut PacketReader<D>,
	first_data: &[u8],
	buffers: &mut Vec<VecDeque<i64>>,
) -> Result<StreamParameters, Error> {
	// The channel count is only known once a major sync has been parsed,
	// which can happen inside this very call (the frame carrying the sync
	// also carries its own substream data) — decode into a max-width
	// scratch buffer so that first block's samples aren't silently dropped.
	let mut scratch: Vec<Vec<i64>> = vec![Vec::new(); crate::channels::MAX_CHANNELS];
	mlp.decode_packet(first_data, &mut scratch)?;

	loop {
		if let Some(parameters) = mlp.parameters() {
			let assignment = parameters.channels()?;
			let count = usize::from(assignment.channel_count());
			*buffers = vec![VecDeque::new(); count];
			for (buf, samples) in buffers.iter_mut().zip(scratch) {
				buf.extend(samples);
			}
			return Ok(parameters);
		}

		let Some((_sector, payload)) = packets.next_audio_packet()? else {
			return Err(Error::MalformedCodecFrame("no MLP major sync found before end-of-stream"));
		};
		let preamble = AudioPreamble::read(&payload)?;
		if preamble.codec_id != CODEC_MLP { continue; }

		let data = &payload[preamble.data_start()..];
		scratch = vec![Vec::new(); crate::channels::MAX_CHANNELS];
		mlp.decode_packet(data, &mut scratch)?;
	}
}



/// # Audio-packet Preamble (Common To PCM And MLP).
struct AudioPreamble {
	codec_id: u8,
	/// # Byte Offset Of `pad_2` Within The Packet Payload.
	pad2_start: usize,
	pad2_size: u8,
}

impl AudioPreamble {
	/// # Read.
	///
	/// `payload` is the PES payload (the 48-bit PES header has already been
	/// stripped by L2).
	///
	/// ## Errors
	///
	/// Returns [`Error::MalformedContainer`] on a short read.
	fn read(payload: &[u8]) -> Result<Self, Error> {
		let bad = |_| Error::MalformedContainer("short audio packet preamble");
		let mut r = BitReader::new(payload);

		let _pad_1_size_marker = r.read_u16(16).map_err(bad)?;
		let pad_1_size = r.read_u8(8).map_err(bad)?;
		r.skip(u64::from(pad_1_size) * 8).map_err(bad)?;
		let codec_id = r.read_u8(8).map_err(bad)?;
		r.skip(16).map_err(bad)?;
		let pad2_size = r.read_u8(8).map_err(bad)?;

		let pad2_start = (r.position() / 8) as usize;
		if pad2_start + usize::from(pad2_size) > payload.len() {
			return Err(Error::MalformedContainer("audio packet pad_2 runs past payload end"));
		}

		Ok(Self { codec_id, pad2_start, pad2_size })
	}

	#[must_use]
	/// # Byte Offset Where `pad_2` Ends And The Codec Payload Begins.
	const fn data_start(&self) -> usize { self.pad2_start + self.pad2_size as usize }
}

/// # Read The PCM Header And Return `(parameters, remaining_payload)`.
///
/// `remaining_payload` starts right after `pad_2` (i.e. after the 9-byte
/// PCM header plus its `pad_2_size - 9` trailing skip bytes).
///
/// ## Errors
///
/// Returns [`Error::MalformedContainer`] if `pad_2_size < 9` or the payload
/// is too short.
fn read_pcm_header<'a>(payload: &'a [u8], preamble: &AudioPreamble) -> Result<(StreamParameters, &'a [u8]), Error> {
	if preamble.pad2_size < 9 {
		return Err(Error::MalformedContainer("PCM pad_2 shorter than the PCM header"));
	}

	let bad = |_| Error::MalformedContainer("short PCM header");
	let header = &payload[preamble.pad2_start..];
	let mut r = BitReader::new(header);

	let _first_audio_frame = r.read_u16(16).map_err(bad)?;
	r.skip(8).map_err(bad)?;
	let group_0_bps = r.read_u8(4).map_err(bad)?;
	let group_1_bps = r.read_u8(4).map_err(bad)?;
	let group_0_rate = r.read_u8(4).map_err(bad)?;
	let group_1_rate = r.read_u8(4).map_err(bad)?;
	r.skip(8).map_err(bad)?;
	let channel_assignment = r.read_u8(5).map_err(bad)?;
	r.skip(8).map_err(bad)?;
	let _crc = r.read_u8(8).map_err(bad)?;

	let parameters = StreamParameters { group_0_bps, group_1_bps, group_0_rate, group_1_rate, channel_assignment };

	let data = payload.get(preamble.data_start()..).ok_or(Error::MalformedContainer("PCM payload shorter than pad_2"))?;

	Ok((parameters, data))
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pts_bound_rounds_to_nearest() {
		assert_eq!(pts_frame_bound(90_000, 48_000), 48_000);
		assert_eq!(pts_frame_bound(45_000, 48_000), 24_000);
	}

	#[test]
	fn reads_pcm_preamble_and_header() {
		let mut bits: Vec<bool> = Vec::new();
		let push = |bits: &mut Vec<bool>, val: u32, n: u32| {
			for i in (0..n).rev() { bits.push((val >> i) & 1 == 1); }
		};
		// Preamble: pad_1_size_marker(16)=0, pad_1_size(8)=0, codec_id(8)=0xA0, 16 skipped, pad_2_size(8)=9.
		push(&mut bits, 0, 16);
		push(&mut bits, 0, 8);
		push(&mut bits, 0xA0, 8);
		push(&mut bits, 0, 16);
		push(&mut bits, 9, 8);
		// PCM header: first_audio_frame(16), 8 skip, bps/rate nibbles, 8 skip, channel_assignment(5), 8 skip, crc(8).
		push(&mut bits, 0, 16);
		push(&mut bits, 0, 8);
		push(&mut bits, 0, 4); // group_0_bps = 16-bit
		push(&mut bits, 0, 4);
		push(&mut bits, 0, 4); // group_0_rate = 48000
		push(&mut bits, 0, 4);
		push(&mut bits, 0, 8);
		push(&mut bits, 1, 5); // stereo
		push(&mut bits, 0, 8);
		push(&mut bits, 0, 8);
		// Payload data.
		push(&mut bits, 0xAB, 8);

		assert_eq!(bits.len() % 8, 0);
		let mut bytes = vec![0_u8; bits.len() / 8];
		for (i, bit) in bits.iter().enumerate() {
			if *bit { bytes[i / 8] |= 1 << (7 - (i % 8)); }
		}

		let preamble = AudioPreamble::read(&bytes).unwrap();
		assert_eq!(preamble.codec_id, CODEC_PCM);
		assert_eq!(preamble.pad2_size, 9);

		let (parameters, data) = read_pcm_header(&bytes, &preamble).unwrap();
		assert_eq!(parameters.bits_per_sample(), 16);
		assert_eq!(parameters.sample_rate(), 48_000);
		assert_eq!(data, &[0xAB]);
	}
}

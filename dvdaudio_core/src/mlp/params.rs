/*!
# MLP: Decoding Parameters

Block-level parameters: matrix definitions, output shifts, quant step
sizes, and per-channel FIR/IIR filter + Huffman setup. A block whose
parameter-presence flag is clear reuses the previous block's values
verbatim — callers own that persistence; this module only knows how to
parse a freshly-present set.
*/

use crate::{
	error::Error,
	mlp::{MAX_MLP_CHANNELS, MAX_MLP_MATRICES},
};
use bitreader::BitReader;



#[derive(Debug, Clone, Default)]
/// # Filter Parameters (shared shape for FIR and IIR).
pub(super) struct FilterParameters {
	/// # Output Shift.
	pub shift: u8,
	/// # Coefficients (left-shifted by `coeff_shift` already).
	pub coeff: Vec<i32>,
	/// # IIR Only: Persisted State (most-recent-last).
	pub state: Vec<i64>,
}

impl FilterParameters {
	/// # Read FIR Or IIR Parameters.
	///
	/// `is_iir` gates the optional state block; FIR filters never carry one.
	///
	/// ## Errors
	///
	/// Returns [`Error::MalformedCodecFrame`] for `order > 8`, a
	/// `coeff_bits` outside `1..=16`, `coeff_bits + coeff_shift > 16`, or a
	/// short read. Per spec, an FIR filter's parameter block itself must
	/// not set the (unused) extra flag bit that would otherwise gate a
	/// state block — the reference decoder treats that as malformed.
	pub(super) fn read(r: &mut BitReader, is_iir: bool) -> Result<Self, Error> {
		let bad = |_| Error::MalformedCodecFrame("short filter parameters");
		let order = r.read_u8(4).map_err(bad)?;

		if order > 8 {
			return Err(Error::MalformedCodecFrame("filter order exceeds 8"));
		}
		if order == 0 {
			return Ok(Self::default());
		}

		let shift = r.read_u8(4).map_err(bad)?;
		let coeff_bits = r.read_u8(5).map_err(bad)?;
		if ! (1..=16).contains(&coeff_bits) {
			return Err(Error::MalformedCodecFrame("filter coeff_bits out of range"));
		}
		let coeff_shift = r.read_u8(3).map_err(bad)?;
		if u16::from(coeff_bits) + u16::from(coeff_shift) > 16 {
			return Err(Error::MalformedCodecFrame("filter coeff_bits + coeff_shift exceeds 16"));
		}

		let mut coeff = Vec::with_capacity(usize::from(order));
		for _ in 0..order {
			let v = r.read_i32(coeff_bits).map_err(bad)?;
			coeff.push(v << coeff_shift);
		}

		let mut state = Vec::new();
		if is_iir {
			if r.read_bool().map_err(bad)? {
				let state_bits = r.read_u8(4).map_err(bad)?;
				let state_shift = r.read_u8(4).map_err(bad)?;
				let mut raw = Vec::with_capacity(usize::from(order));
				for _ in 0..order {
					let v = r.read_i32(state_bits).map_err(bad)?;
					raw.push(i64::from(v) << state_shift);
				}
				raw.reverse();
				state = raw;
			}
		}
		else if r.read_bool().map_err(bad)? {
			return Err(Error::MalformedCodecFrame("FIR filter unexpectedly carries a state block"));
		}

		Ok(Self { shift, coeff, state })
	}
}



#[derive(Debug, Clone, Default)]
/// # Per-channel Decoding Parameters.
pub(super) struct ChannelParameters {
	/// # FIR Filter.
	pub fir: FilterParameters,
	/// # IIR Filter.
	pub iir: FilterParameters,
	/// # Signed Huffman Offset.
	pub huffman_offset: i32,
	/// # Codebook Index (`0` = literal zero, `1..=3` = canonical tables).
	pub codebook: u8,
	/// # Huffman LSB Width.
	pub huffman_lsbs: u8,
}



#[derive(Debug, Clone, Default)]
/// # Matrix Parameters.
pub(super) struct MatrixParameters {
	/// # Output Channel.
	pub out_channel: u8,
	/// # LSB Bypass Flag.
	pub lsb_bypass: bool,
	/// # Coefficients, Indexed `0..=max_matrix_channel + 2` (the last two
	/// # slots are the noise channels).
	pub coeff: [i32; MAX_MLP_CHANNELS],
}

/// # Read Matrix Parameters.
///
/// ## Errors
///
/// Returns [`Error::MalformedCodecFrame`] for a matrix count above
/// [`MAX_MLP_MATRICES`], an `out_channel` above `max_matrix_channel`, a
/// `fractional_bits` above 14, or a short read.
pub(super) fn read_matrix_parameters(
	r: &mut BitReader,
	max_matrix_channel: u8,
) -> Result<Vec<MatrixParameters>, Error> {
	let bad = |_| Error::MalformedCodecFrame("short matrix parameters");
	let count = r.read_u8(4).map_err(bad)?;
	if usize::from(count) > MAX_MLP_MATRICES {
		return Err(Error::MalformedCodecFrame("matrix count exceeds maximum"));
	}

	let mut out = Vec::with_capacity(usize::from(count));
	for _ in 0..count {
		let out_channel = r.read_u8(4).map_err(bad)?;
		if out_channel > max_matrix_channel {
			return Err(Error::MalformedCodecFrame("matrix out_channel exceeds max_matrix_channel"));
		}
		let fractional_bits = r.read_u8(4).map_err(bad)?;
		if fractional_bits > 14 {
			return Err(Error::MalformedCodecFrame("matrix fractional_bits exceeds 14"));
		}
		let lsb_bypass = r.read_bool().map_err(bad)?;

		let mut coeff = [0_i32; MAX_MLP_CHANNELS];
		for c in coeff.iter_mut().take(usize::from(max_matrix_channel) + 3) {
			if r.read_bool().map_err(bad)? {
				let v = r.read_i32(fractional_bits + 2).map_err(bad)?;
				*c = v << (14 - fractional_bits);
			}
		}

		out.push(MatrixParameters { out_channel, lsb_bypass, coeff });
	}

	Ok(out)
}



#[derive(Debug, Clone)]
/// # Decoding Parameters.
///
/// One per substream, persisted across blocks that don't re-send it. The
/// eight `flags` (which *sections* are present on the next re-send) are
/// themselves persisted state, matching the reference decoder's struct
/// field rather than a transient local.
pub(super) struct DecodingParameters {
	/// # Per-section Presence Flags (`flag0..flag7`).
	pub flags: [bool; 8],
	/// # Block Size (Samples).
	pub block_size: u16,
	/// # Matrices, In Application Order.
	pub matrix: Vec<MatrixParameters>,
	/// # Output Shift, Per Channel.
	pub output_shift: [i8; MAX_MLP_CHANNELS],
	/// # Quant Step Size, Per Channel.
	pub quant_step_size: [u8; MAX_MLP_CHANNELS],
	/// # Per-channel Parameters.
	pub channel: [ChannelParameters; MAX_MLP_CHANNELS],
}

impl Default for DecodingParameters {
	fn default() -> Self {
		Self {
			flags: [true; 8],
			block_size: 8,
			matrix: Vec::new(),
			output_shift: [0; MAX_MLP_CHANNELS],
			quant_step_size: [0; MAX_MLP_CHANNELS],
			channel: Default::default(),
		}
	}
}

impl DecodingParameters {
	/// # Decode One Block's Body, Updating `self` In Place.
	///
	/// Only called when the block's top-level parameter-presence flag was
	/// set (a `0` there means "reuse the previous block's parameters
	/// entirely" and this function is skipped). `restart_present` is the
	/// same block's restart-header flag: when set, every omitted section
	/// resets to its documented default rather than persisting; when
	/// clear, an omitted section simply keeps its previous value.
	///
	/// ## Errors
	///
	/// See the individual field parsers; any failure here indicates a
	/// malformed substream and should end that substream's contribution.
	pub(super) fn decode_body(
		&mut self,
		r: &mut BitReader,
		restart_present: bool,
		min_channel: u8,
		max_channel: u8,
		max_matrix_channel: u8,
	) -> Result<(), Error> {
		let bad = |_| Error::MalformedCodecFrame("short decoding parameters");

		if restart_present {
			if r.read_bool().map_err(bad)? {
				for f in &mut self.flags { *f = r.read_bool().map_err(bad)?; }
			}
			else {
				self.flags = [true; 8];
			}
		}
		else if self.flags[0] && r.read_bool().map_err(bad)? {
			for f in &mut self.flags { *f = r.read_bool().map_err(bad)?; }
		}
		let flags = self.flags;
		let restart_header_present = restart_present;

		if flags[7] && r.read_bool().map_err(bad)? {
			let size = r.read_u16(9).map_err(bad)?;
			if size < 8 { return Err(Error::MalformedCodecFrame("block size below 8")); }
			self.block_size = size;
		}
		else if restart_header_present {
			self.block_size = 8;
		}

		if flags[6] && r.read_bool().map_err(bad)? {
			self.matrix = read_matrix_parameters(r, max_matrix_channel)?;
		}
		else if restart_header_present {
			self.matrix.clear();
		}

		if flags[5] && r.read_bool().map_err(bad)? {
			for c in 0..=usize::from(max_matrix_channel) {
				self.output_shift[c] = r.read_i8(4).map_err(bad)?;
			}
		}
		else if restart_header_present {
			self.output_shift = [0; MAX_MLP_CHANNELS];
		}

		if flags[4] && r.read_bool().map_err(bad)? {
			for c in 0..=usize::from(max_channel) {
				self.quant_step_size[c] = r.read_u8(4).map_err(bad)?;
			}
		}
		else if restart_header_present {
			self.quant_step_size = [0; MAX_MLP_CHANNELS];
		}

		for c in usize::from(min_channel)..=usize::from(max_channel) {
			if r.read_bool().map_err(bad)? {
				if flags[3] && r.read_bool().map_err(bad)? {
					self.channel[c].fir = FilterParameters::read(r, false)?;
				}
				else if restart_header_present {
					self.channel[c].fir = FilterParameters::default();
				}

				if flags[2] && r.read_bool().map_err(bad)? {
					self.channel[c].iir = FilterParameters::read(r, true)?;
				}
				else if restart_header_present {
					self.channel[c].iir = FilterParameters::default();
				}

				if flags[1] && r.read_bool().map_err(bad)? {
					self.channel[c].huffman_offset = r.read_i32(15).map_err(bad)?;
				}
				else if restart_header_present {
					self.channel[c].huffman_offset = 0;
				}

				self.channel[c].codebook = r.read_u8(2).map_err(bad)?;
				let lsbs = r.read_u8(5).map_err(bad)?;
				if lsbs > 24 {
					return Err(Error::MalformedCodecFrame("huffman_lsbs exceeds 24"));
				}
				self.channel[c].huffman_lsbs = lsbs;
			}
			else if restart_header_present {
				self.channel[c] = ChannelParameters {
					fir: FilterParameters::default(),
					iir: FilterParameters::default(),
					huffman_offset: 0,
					codebook: 0,
					huffman_lsbs: 24,
				};
			}
		}

		Ok(())
	}
}

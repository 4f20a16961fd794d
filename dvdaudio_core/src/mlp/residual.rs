/*!
# MLP: Residual Decode

Reads the per-sample, per-channel residuals for one block: a 2-bit
codebook-selected MSB (literal zero for codebook 0, one of the three
canonical Huffman tables otherwise) plus a fixed-width LSB, recombined with
a per-channel signed offset and the channel's quant step size.
*/

use crate::{
	error::Error,
	mlp::{
		params::{ChannelParameters, MatrixParameters},
		tables,
		MAX_MLP_CHANNELS,
	},
};
use bitreader::BitReader;



/// # Signed Huffman Offset, Per Channel.
///
/// Mirrors the reference decoder's `signed_huffman_offset` computation
/// exactly, including its two special-cased branches (a negative
/// `sign_shift` simply drops that term rather than shifting by a negative
/// amount).
fn signed_offset(channel: &ChannelParameters, quant_step_size: u8) -> i64 {
	let lsb_bits = i64::from(channel.huffman_lsbs) - i64::from(quant_step_size);

	if channel.codebook != 0 {
		let sign_shift = lsb_bits + 2 - i64::from(channel.codebook);
		let base = i64::from(channel.huffman_offset) - 7 * (1_i64 << lsb_bits.max(0));
		if sign_shift >= 0 { base - (1_i64 << sign_shift) } else { base }
	}
	else {
		let sign_shift = lsb_bits - 1;
		if sign_shift >= 0 {
			i64::from(channel.huffman_offset) - (1_i64 << sign_shift)
		}
		else {
			i64::from(channel.huffman_offset)
		}
	}
}

/// # Read One Huffman-coded MSB.
///
/// ## Errors
///
/// Returns [`Error::MalformedCodecFrame`] if 8 bits are consumed without
/// matching any codeword in the selected table.
fn read_huffman_msb(r: &mut BitReader, codebook: u8) -> Result<i32, Error> {
	if codebook == 0 { return Ok(0); }

	let table = tables::codebook(codebook);
	let mut code: u16 = 0;
	for len in 1..=8_u8 {
		let bit = r.read_bool().map_err(|_| Error::MalformedCodecFrame("short huffman code"))?;
		code = (code << 1) | u16::from(bit);
		if let Some((_, _, value)) = table.iter().find(|(c, l, _)| *c == code && *l == len) {
			return Ok(*value);
		}
	}

	Err(Error::MalformedCodecFrame("huffman code not in codebook"))
}

/// # Decode One Block's Residuals.
///
/// Appends `block_size` samples to `residuals[c]` for every
/// `c ∈ [min_channel..=max_channel]`, and `block_size` LSB-bypass bits
/// (or zero) to `matrix[m].bypassed_lsb`.
///
/// ## Errors
///
/// Propagates Huffman decode failures and short reads.
#[allow(clippy::too_many_arguments)]
pub(super) fn decode_block_residuals(
	r: &mut BitReader,
	min_channel: u8,
	max_channel: u8,
	block_size: u16,
	matrix: &[MatrixParameters],
	quant_step_size: &[u8; MAX_MLP_CHANNELS],
	channel: &[ChannelParameters; MAX_MLP_CHANNELS],
	residuals: &mut [Vec<i64>; MAX_MLP_CHANNELS],
	bypassed_lsb: &mut Vec<Vec<i32>>,
) -> Result<(), Error> {
	let bad = |_| Error::MalformedCodecFrame("short residual data");

	let offsets: Vec<i64> = (usize::from(min_channel)..=usize::from(max_channel))
		.map(|c| signed_offset(&channel[c], quant_step_size[c]))
		.collect();

	for c in usize::from(min_channel)..=usize::from(max_channel) {
		residuals[c].clear();
		residuals[c].reserve(usize::from(block_size));
	}
	while bypassed_lsb.len() < matrix.len() { bypassed_lsb.push(Vec::new()); }
	for bypass in bypassed_lsb.iter_mut() { bypass.clear(); }

	for _ in 0..block_size {
		for (m, mat) in matrix.iter().enumerate() {
			let bit = if mat.lsb_bypass {
				i32::from(r.read_bool().map_err(bad)?)
			}
			else {
				0
			};
			bypassed_lsb[m].push(bit);
		}

		for (i, c) in (usize::from(min_channel)..=usize::from(max_channel)).enumerate() {
			let lsb_bits = i64::from(channel[c].huffman_lsbs) - i64::from(quant_step_size[c]);
			if lsb_bits < 0 || lsb_bits > 24 {
				return Err(Error::MalformedCodecFrame("residual LSB width out of range"));
			}

			let msb = i64::from(read_huffman_msb(r, channel[c].codebook)?);
			let lsb = i64::from(r.read_u32(lsb_bits as u8).map_err(bad)?);

			let residual = ((msb << lsb_bits) + lsb + offsets[i]) << quant_step_size[c];
			residuals[c].push(residual);
		}
	}

	Ok(())
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::mlp::params::FilterParameters;

	fn default_channel() -> ChannelParameters {
		ChannelParameters {
			fir: FilterParameters::default(),
			iir: FilterParameters::default(),
			huffman_offset: 0,
			codebook: 0,
			huffman_lsbs: 16,
		}
	}

	#[test]
	fn literal_zero_codebook_reads_raw_lsb() {
		// codebook 0, quant_step_size 0, huffman_lsbs 16: LSB_bits = 16,
		// signed_offset = huffman_offset - (1 << 15) = -32768.
		// A raw LSB of 32768 (0x8000) should reconstruct to 0.
		let mut channel: [ChannelParameters; MAX_MLP_CHANNELS] = Default::default();
		channel[0] = default_channel();
		let quant_step_size = [0_u8; MAX_MLP_CHANNELS];

		let bits: u16 = 0x8000;
		let bytes = bits.to_be_bytes();
		let mut r = BitReader::new(&bytes);

		let mut residuals: [Vec<i64>; MAX_MLP_CHANNELS] = Default::default();
		let mut bypass = Vec::new();

		decode_block_residuals(&mut r, 0, 0, 1, &[], &quant_step_size, &channel, &mut residuals, &mut bypass).unwrap();
		assert_eq!(residuals[0], vec![0]);
	}

	#[test]
	fn huffman_decode_finds_short_codes() {
		// Codebook 1's shortest codeword is a single `0` bit -> value 0.
		let mut channel: [ChannelParameters; MAX_MLP_CHANNELS] = Default::default();
		channel[0] = ChannelParameters { codebook: 1, huffman_lsbs: 1, ..default_channel() };
		let quant_step_size = [0_u8; MAX_MLP_CHANNELS];

		// bit 0 (huffman "0" -> MSB 0), then 1 LSB bit (0).
		let bytes = [0b0000_0000_u8];
		let mut r = BitReader::new(&bytes);

		let mut residuals: [Vec<i64>; MAX_MLP_CHANNELS] = Default::default();
		let mut bypass = Vec::new();
		decode_block_residuals(&mut r, 0, 0, 1, &[], &quant_step_size, &channel, &mut residuals, &mut bypass).unwrap();
		assert_eq!(residuals[0].len(), 1);
	}
}

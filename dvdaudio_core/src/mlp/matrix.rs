/*!
# MLP: Rematrix, Noise, Output Shift

With a single substream, its own parameters are used directly. With two,
both substreams decode into the same channel accumulator and substream 1's
parameters govern rematrixing, noise generation, and output shift.
*/

use crate::{channels::ChannelAssignment, mlp::params::MatrixParameters, mlp::MAX_MLP_CHANNELS};



/// # Sign-extend The Low 8 Bits Of `v` To `i32`.
const fn sign_extend8(v: u32) -> i32 { (v as u8) as i8 as i32 }

/// # Generate The Two Noise Channels For One Block.
///
/// Advances `seed` in place per the reference recurrence; returns
/// `(noise0, noise1)`, each `block_size` samples long.
pub(super) fn generate_noise(seed: &mut u32, noise_shift: u8, block_size: usize) -> (Vec<i64>, Vec<i64>) {
	let mut noise0 = Vec::with_capacity(block_size);
	let mut noise1 = Vec::with_capacity(block_size);

	for _ in 0..block_size {
		let shifted = (*seed >> 7) & 0xFFFF;
		noise0.push(i64::from(sign_extend8(*seed >> 15) << noise_shift));
		noise1.push(i64::from(sign_extend8(shifted) << noise_shift));
		*seed = (seed.wrapping_shl(16)) ^ shifted ^ (shifted << 5);
	}

	(noise0, noise1)
}

/// # `mask(x, q) = (x >> q) << q`.
const fn mask(x: i64, q: u8) -> i64 {
	if q == 0 { x } else { (x >> q) << q }
}

/// # Apply Matrices, Rematrixing `channels` In Place.
///
/// `channels` must have valid data in `0..=max_matrix_channel`;
/// `bypassed_lsb[m]` holds one bit (as `i64`) per sample for matrix `m`.
pub(super) fn apply_matrices(
	channels: &mut [Vec<i64>; MAX_MLP_CHANNELS],
	max_matrix_channel: u8,
	matrix: &[MatrixParameters],
	quant_step_size: &[u8; MAX_MLP_CHANNELS],
	bypassed_lsb: &[Vec<i32>],
	noise0: &[i64],
	noise1: &[i64],
) {
	let block_size = channels[0].len();

	for (m, mat) in matrix.iter().enumerate() {
		for i in 0..block_size {
			let mut sum: i64 = 0;
			for c in 0..=usize::from(max_matrix_channel) {
				sum += channels[c][i] * i64::from(mat.coeff[c]);
			}
			sum += noise0[i] * i64::from(mat.coeff[usize::from(max_matrix_channel) + 1]);
			sum += noise1[i] * i64::from(mat.coeff[usize::from(max_matrix_channel) + 2]);

			let bypass = bypassed_lsb.get(m).and_then(|b| b.get(i)).copied().unwrap_or(0);
			channels[usize::from(mat.out_channel)][i] =
				mask(sum >> 14, quant_step_size[usize::from(mat.out_channel)]) + i64::from(bypass);
		}
	}
}

/// # Apply Per-channel Output Shift.
pub(super) fn apply_output_shift(
	channels: &mut [Vec<i64>; MAX_MLP_CHANNELS],
	max_matrix_channel: u8,
	output_shift: &[i8; MAX_MLP_CHANNELS],
) {
	for c in 0..=usize::from(max_matrix_channel) {
		let shift = output_shift[c];
		if shift != 0 {
			for v in &mut channels[c] {
				*v <<= shift;
			}
		}
	}
}

/// # Reorder MLP-order Channels Into RIFF-WAVE Order.
///
/// Appends `channels[0..channel_count]` into `out` per `assignment`'s
/// permutation, then clears the source channels for the next block.
pub(super) fn reorder_to_wave(
	channels: &mut [Vec<i64>; MAX_MLP_CHANNELS],
	assignment: &ChannelAssignment,
	out: &mut [Vec<i64>],
) {
	let perm = assignment.perm();
	let count = usize::from(assignment.channel_count());

	for c in 0..count {
		let dest = usize::from(perm[c]);
		if let Some(slot) = out.get_mut(dest) {
			slot.extend_from_slice(&channels[c]);
		}
	}

	for c in channels.iter_mut().take(count) { c.clear(); }
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn noise_sequence_matches_recurrence() {
		let mut seed = 0x1_2345_u32;
		let (n0, _n1) = generate_noise(&mut seed, 0, 1);
		assert_eq!(n0.len(), 1);

		let shifted = (0x1_2345_u32 >> 7) & 0xFFFF;
		let expected_seed = (0x1_2345_u32.wrapping_shl(16)) ^ shifted ^ (shifted << 5);
		assert_eq!(seed, expected_seed);
	}

	#[test]
	fn sign_extend_negative_byte() {
		assert_eq!(sign_extend8(0xFF), -1);
		assert_eq!(sign_extend8(0x7F), 127);
		assert_eq!(sign_extend8(0x80), -128);
	}

	#[test]
	fn reorder_stereo_is_identity() {
		let assignment = ChannelAssignment::from_code(1).unwrap();
		let mut channels: [Vec<i64>; MAX_MLP_CHANNELS] = Default::default();
		channels[0] = vec![1, 2];
		channels[1] = vec![10, 20];
		let mut out = vec![Vec::new(), Vec::new()];
		reorder_to_wave(&mut channels, &assignment, &mut out);
		assert_eq!(out[0], vec![1, 2]);
		assert_eq!(out[1], vec![10, 20]);
		assert!(channels[0].is_empty());
	}
}

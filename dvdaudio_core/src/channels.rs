/*!
# DVD-Audio: Channel Assignment

The 5-bit `channel_assignment` field (shared by the PCM and MLP codec
headers) selects a channel count, a RIFF-WAVE speaker mask, and — for MLP —
the permutation from MLP decode order into RIFF-WAVE channel order. The
table is reproduced verbatim from the reference decoder; values above 20
are invalid and fail probing.
*/

use crate::error::Error;



// RIFF-WAVE speaker positions.
// ---------------

/// # Front Left.
pub(crate) const WAVE_FL: u32 = 0x001;
/// # Front Right.
pub(crate) const WAVE_FR: u32 = 0x002;
/// # Front Center.
pub(crate) const WAVE_FC: u32 = 0x004;
/// # Low Frequency Effects.
pub(crate) const WAVE_LFE: u32 = 0x008;
/// # Back Left.
pub(crate) const WAVE_BL: u32 = 0x010;
/// # Back Right.
pub(crate) const WAVE_BR: u32 = 0x020;
/// # Back Center.
pub(crate) const WAVE_BC: u32 = 0x100;



/// # Maximum channel count any assignment can produce.
pub(crate) const MAX_CHANNELS: usize = 6;

/// # Maximum valid `channel_assignment` code.
pub(crate) const MAX_ASSIGNMENT: u8 = 20;



#[derive(Debug, Clone, Copy)]
/// # Channel Assignment.
///
/// A decoded `channel_assignment` field: how many channels there are, which
/// RIFF-WAVE speaker mask they occupy, and (for MLP) which RIFF-WAVE slot
/// each MLP-order channel index lands in.
pub struct ChannelAssignment {
	code: u8,
	count: u8,
	mask: u32,
	perm: [u8; MAX_CHANNELS],
}

impl ChannelAssignment {
	/// # From Code.
	///
	/// ## Errors
	///
	/// Returns [`Error::UnsupportedStream`] for any code greater than 20.
	pub fn from_code(code: u8) -> Result<Self, Error> {
		let (count, mask, perm) = TABLE.get(usize::from(code))
			.copied()
			.ok_or(Error::UnsupportedStream("channel_assignment > 20"))?;
		Ok(Self { code, count, mask, perm })
	}

	#[must_use]
	/// # Raw Code.
	pub const fn code(&self) -> u8 { self.code }

	#[must_use]
	/// # Channel Count.
	pub const fn channel_count(&self) -> u8 { self.count }

	#[must_use]
	/// # RIFF-WAVE Channel Mask.
	pub const fn wave_mask(&self) -> u32 { self.mask }

	#[must_use]
	/// # MLP-order → RIFF-WAVE-order Permutation.
	///
	/// `perm()[mlp_channel_index]` gives the RIFF-WAVE output slot for that
	/// MLP channel. Only the first [`channel_count`](Self::channel_count)
	/// entries are meaningful.
	pub const fn perm(&self) -> [u8; MAX_CHANNELS] { self.perm }
}



/// # Channel Assignment Table.
///
/// `(channel_count, riff_wave_mask, mlp_order -> wave_order permutation)`,
/// indexed by the 5-bit `channel_assignment` code. Unused permutation slots
/// are zero-filled and ignored (bounded by `channel_count`).
const TABLE: [(u8, u32, [u8; MAX_CHANNELS]); 21] = [
	/*  0 */ (1, WAVE_FC,                                  [0, 0, 0, 0, 0, 0]),
	/*  1 */ (2, WAVE_FL | WAVE_FR,                        [0, 1, 0, 0, 0, 0]),
	/*  2 */ (3, WAVE_FL | WAVE_FR | WAVE_BC,              [0, 1, 2, 0, 0, 0]),
	/*  3 */ (4, WAVE_FL | WAVE_FR | WAVE_BL | WAVE_BR,    [0, 1, 2, 3, 0, 0]),
	/*  4 */ (3, WAVE_FL | WAVE_FR | WAVE_LFE,             [0, 1, 2, 0, 0, 0]),
	/*  5 */ (4, WAVE_FL | WAVE_FR | WAVE_LFE | WAVE_BC,   [0, 1, 2, 3, 0, 0]),
	/*  6 */ (5, WAVE_FL | WAVE_FR | WAVE_LFE | WAVE_BL | WAVE_BR, [0, 1, 2, 3, 4, 0]),
	/*  7 */ (3, WAVE_FL | WAVE_FR | WAVE_FC,              [0, 1, 2, 0, 0, 0]),
	/*  8 */ (4, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_BC,    [0, 1, 2, 3, 0, 0]),
	/*  9 */ (5, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_BL | WAVE_BR, [0, 1, 2, 3, 4, 0]),
	/* 10 */ (4, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_LFE,   [0, 1, 2, 3, 0, 0]),
	/* 11 */ (5, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_LFE | WAVE_BC, [0, 1, 2, 3, 4, 0]),
	/* 12 */ (6, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_LFE | WAVE_BL | WAVE_BR, [0, 1, 2, 3, 4, 5]),
	/* 13 */ (4, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_BC,    [0, 1, 2, 3, 0, 0]),
	/* 14 */ (5, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_BL | WAVE_BR, [0, 1, 2, 3, 4, 0]),
	/* 15 */ (4, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_LFE,   [0, 1, 2, 3, 0, 0]),
	/* 16 */ (5, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_LFE | WAVE_BC, [0, 1, 2, 3, 4, 0]),
	/* 17 */ (6, WAVE_FL | WAVE_FR | WAVE_FC | WAVE_LFE | WAVE_BL | WAVE_BR, [0, 1, 2, 3, 4, 5]),
	/* 18 */ (5, WAVE_FL | WAVE_FR | WAVE_BL | WAVE_BR | WAVE_LFE, [0, 1, 3, 4, 2, 0]),
	/* 19 */ (5, WAVE_FL | WAVE_FR | WAVE_BL | WAVE_BR | WAVE_FC,  [0, 1, 3, 4, 2, 0]),
	/* 20 */ (6, WAVE_FL | WAVE_FR | WAVE_BL | WAVE_BR | WAVE_FC | WAVE_LFE, [0, 1, 4, 5, 2, 3]),
];



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn channel_counts_match_mask_popcount() {
		for code in 0..=MAX_ASSIGNMENT {
			let ca = ChannelAssignment::from_code(code).unwrap();
			assert_eq!(
				u32::from(ca.channel_count()),
				ca.wave_mask().count_ones(),
				"code {code} mismatched popcount",
			);
		}
	}

	#[test]
	fn rejects_out_of_range() {
		assert!(ChannelAssignment::from_code(21).is_err());
		assert!(ChannelAssignment::from_code(255).is_err());
	}

	#[test]
	fn stereo_is_identity() {
		let ca = ChannelAssignment::from_code(1).unwrap();
		assert_eq!(ca.channel_count(), 2);
		assert_eq!(ca.perm()[0], 0);
		assert_eq!(ca.perm()[1], 1);
	}

	#[test]
	fn six_one_reorders_surrounds_before_center_lfe() {
		let ca = ChannelAssignment::from_code(20).unwrap();
		assert_eq!(ca.channel_count(), 6);
		assert_eq!(ca.perm(), [0, 1, 4, 5, 2, 3]);
	}
}

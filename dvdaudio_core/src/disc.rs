/*!
# DVD-Audio: Catalog Navigation

The thin slice of `AUDIO_TS.IFO` navigation this crate owns: validating the
`DVDAUDIO-AMG` magic and reading the title-set count. Everything below that
— the title/track table inside each `ATS_NN_0.IFO` — is an external
collaborator's job; [`Title`] and [`Track`] exist here only as handles that
carry the caller-supplied sector range and PTS length through to
[`open_track_reader`].
*/

use crate::{
	error::Error,
	sector::{CppmConfig, Descrambler, NoDescrambler},
	track::{TrackDescriptor, TrackReader},
};
use std::{
	fs,
	path::{Path, PathBuf},
};



/// # AMG Magic (`AUDIO_TS.IFO`, Offset 0).
const AMG_MAGIC: &[u8; 12] = b"DVDAUDIO-AMG";

/// # Byte Offset Of The Title-set Count, Within `AUDIO_TS.IFO`.
///
/// Matches `original_source`'s `get_titleset_count` bitstream format exactly
/// (`12b 32p 12P 32p 16p 4P 16p 16p 8p 4P 8p 32p 10P 8p 8u 40P`): 63 bytes of
/// magic and padding precede the single-byte `8u` count field. Recorded in
/// DESIGN.md.
const TITLESET_COUNT_OFFSET: usize = 0x3F;

/// # Minimum `AUDIO_TS.IFO` Size Needed To Read Both Fields.
const AMG_MIN_LEN: usize = TITLESET_COUNT_OFFSET + 1;



#[derive(Debug, Clone)]
/// # Disc.
///
/// Rooted at an `AUDIO_TS` directory; owns nothing but the validated
/// title-set count. Title/track navigation is supplied by the caller.
pub struct Disc {
	path: PathBuf,
	titleset_count: u8,
}

impl Disc {
	#[must_use]
	/// # `AUDIO_TS` Path.
	pub fn path(&self) -> &Path { &self.path }

	#[must_use]
	/// # Title-set Count.
	pub const fn titleset_count(&self) -> u8 { self.titleset_count }
}

/// # Open A Disc.
///
/// Validates the `DVDAUDIO-AMG` magic at offset 0 of `AUDIO_TS/AUDIO_TS.IFO`
/// and reads the single-byte title-set count at a fixed offset.
///
/// ## Errors
///
/// Returns [`Error::NotFound`] if `AUDIO_TS.IFO` can't be opened, or
/// [`Error::MalformedContainer`] if it's too short or the magic doesn't
/// match.
pub fn open_disc(audio_ts_path: impl AsRef<Path>) -> Result<Disc, Error> {
	let audio_ts_path = audio_ts_path.as_ref();
	let ifo_path = find_ci(audio_ts_path, "AUDIO_TS.IFO")
		.ok_or_else(|| Error::NotFound("AUDIO_TS/AUDIO_TS.IFO".to_owned()))?;
	let bytes = fs::read(&ifo_path)?;

	if bytes.len() < AMG_MIN_LEN {
		return Err(Error::MalformedContainer("AUDIO_TS.IFO shorter than the AMG header"));
	}
	if &bytes[..12] != AMG_MAGIC {
		return Err(Error::MalformedContainer("AUDIO_TS.IFO missing DVDAUDIO-AMG magic"));
	}

	let titleset_count = bytes[TITLESET_COUNT_OFFSET];
	if titleset_count == 0 {
		return Err(Error::MalformedContainer("AUDIO_TS.IFO reports zero title sets"));
	}

	Ok(Disc { path: audio_ts_path.to_path_buf(), titleset_count })
}



#[derive(Debug, Clone)]
/// # Title Set.
///
/// Confirms `ATS_NN_0.IFO` exists and carries the `DVDAUDIO-ATS` magic; the
/// title table inside it is not parsed here.
pub struct Titleset {
	path: PathBuf,
	number: u8,
}

impl Titleset {
	#[must_use]
	/// # `AUDIO_TS` Path.
	pub fn path(&self) -> &Path { &self.path }

	#[must_use]
	/// # Title Set Number (1-99).
	pub const fn number(&self) -> u8 { self.number }
}

/// # ATS Magic (`ATS_NN_0.IFO`, Offset 0).
const ATS_MAGIC: &[u8; 12] = b"DVDAUDIO-ATS";

/// # Open A Title Set.
///
/// ## Errors
///
/// Returns [`Error::Parameter`] if `n` is `0` or exceeds
/// `disc.titleset_count()`, [`Error::NotFound`] if `ATS_NN_0.IFO` can't be
/// opened, or [`Error::MalformedContainer`] if it's too short or the magic
/// doesn't match.
pub fn open_titleset(disc: &Disc, n: u8) -> Result<Titleset, Error> {
	if n == 0 || n > disc.titleset_count {
		return Err(Error::Parameter("title set number out of range"));
	}

	let name = format!("ATS_{n:02}_0.IFO");
	let ifo_path = find_ci(&disc.path, &name).ok_or_else(|| Error::NotFound(name.clone()))?;
	let bytes = fs::read(&ifo_path)?;

	if bytes.len() < 12 {
		return Err(Error::MalformedContainer("ATS_NN_0.IFO shorter than its magic"));
	}
	if &bytes[..12] != ATS_MAGIC {
		return Err(Error::MalformedContainer("ATS_NN_0.IFO missing DVDAUDIO-ATS magic"));
	}

	Ok(Titleset { path: disc.path.clone(), number: n })
}



#[derive(Debug, Clone)]
/// # Title.
///
/// A handle within a title set; the title/track table that would validate
/// `n` against an actual track count lives in the external IFO parser, so
/// this only records the pair.
pub struct Title {
	path: PathBuf,
	titleset: u8,
	number: u8,
}

impl Title {
	#[must_use]
	/// # Title Set Number.
	pub const fn titleset(&self) -> u8 { self.titleset }

	#[must_use]
	/// # Title Number.
	pub const fn number(&self) -> u8 { self.number }
}

/// # Open A Title.
///
/// ## Errors
///
/// Returns [`Error::Parameter`] if `n` is `0`.
pub fn open_title(titleset: &Titleset, n: u8) -> Result<Title, Error> {
	if n == 0 {
		return Err(Error::Parameter("title number must be at least 1"));
	}
	Ok(Title { path: titleset.path.clone(), titleset: titleset.number, number: n })
}



#[derive(Debug, Clone)]
/// # Track.
///
/// Bundles a [`TrackDescriptor`] (first/last sector and PTS length, per
/// spec.md §3 supplied by the external IFO parser) under a title for
/// [`open_track_reader`] to act on.
pub struct Track {
	path: PathBuf,
	descriptor: TrackDescriptor,
}

impl Track {
	#[must_use]
	/// # Track Descriptor.
	pub const fn descriptor(&self) -> TrackDescriptor { self.descriptor }
}

/// # Open A Track.
///
/// `n` identifies the track for error messages only; the sector range and
/// PTS length come from the caller, since track-table parsing is out of
/// scope (see spec.md §1). `dvdaudio_probe` is the example caller that
/// supplies these explicitly on the command line.
///
/// ## Errors
///
/// Returns [`Error::Parameter`] if `n` is `0` or `first_sector >
/// last_sector`.
pub fn open_track(
	title: &Title,
	n: u8,
	first_sector: u32,
	last_sector: u32,
	pts_length: u32,
) -> Result<Track, Error> {
	if n == 0 {
		return Err(Error::Parameter("track number must be at least 1"));
	}
	if first_sector > last_sector {
		return Err(Error::Parameter("track first_sector is after last_sector"));
	}

	Ok(Track {
		path: title.path.clone(),
		descriptor: TrackDescriptor {
			titleset: title.titleset,
			first_sector,
			last_sector,
			pts_length,
		},
	})
}

/// # Open A Track Reader (No Descrambling).
///
/// Convenience wrapper over [`open_track_reader_with`] for the common case
/// of a non-CPPM disc image.
///
/// ## Errors
///
/// See [`TrackReader::open`].
pub fn open_track_reader(track: &Track) -> Result<TrackReader<NoDescrambler>, Error> {
	open_track_reader_with(track, &CppmConfig::default())
}

/// # Open A Track Reader.
///
/// Seeks L1 to the track's first sector, probes the leading audio packet,
/// and returns a reader positioned to stream decoded PCM frames.
///
/// ## Errors
///
/// See [`TrackReader::open`].
pub fn open_track_reader_with<D: Descrambler>(
	track: &Track,
	cppm: &CppmConfig,
) -> Result<TrackReader<D>, Error> {
	TrackReader::<D>::open(&track.path, track.descriptor, cppm)
}



/// # Case-insensitive Directory Lookup.
fn find_ci(dir: &Path, name: &str) -> Option<PathBuf> {
	let entries = fs::read_dir(dir).ok()?;
	for entry in entries.flatten() {
		let fname = entry.file_name();
		if let Some(fname) = fname.to_str() {
			if fname.eq_ignore_ascii_case(name) {
				return Some(entry.path());
			}
		}
	}
	None
}



#[cfg(test)]
mod tests {
	use super::*;
	use std::{fs::File, io::Write};

	fn write_amg(dir: &Path, titleset_count: u8) {
		let mut bytes = vec![0_u8; AMG_MIN_LEN];
		bytes[..12].copy_from_slice(AMG_MAGIC);
		bytes[TITLESET_COUNT_OFFSET] = titleset_count;
		File::create(dir.join("AUDIO_TS.IFO")).unwrap().write_all(&bytes).unwrap();
	}

	fn write_ats(dir: &Path, n: u8) {
		let mut bytes = vec![0_u8; 12];
		bytes[..12].copy_from_slice(ATS_MAGIC);
		File::create(dir.join(format!("ATS_{n:02}_0.IFO"))).unwrap().write_all(&bytes).unwrap();
	}

	fn tempdir() -> TempDir {
		let mut path = std::env::temp_dir();
		let unique = format!("dvdaudio_core_disc_test_{}_{:p}", std::process::id(), &path as *const _);
		path.push(unique);
		fs::create_dir_all(&path).unwrap();
		TempDir(path)
	}

	struct TempDir(PathBuf);
	impl TempDir {
		fn path(&self) -> &Path { &self.0 }
	}
	impl Drop for TempDir {
		fn drop(&mut self) { let _res = fs::remove_dir_all(&self.0); }
	}

	#[test]
	fn opens_valid_disc() {
		let dir = tempdir();
		write_amg(dir.path(), 3);
		let disc = open_disc(dir.path()).unwrap();
		assert_eq!(disc.titleset_count(), 3);
	}

	#[test]
	fn rejects_bad_magic() {
		let dir = tempdir();
		let bytes = vec![0_u8; AMG_MIN_LEN];
		File::create(dir.path().join("AUDIO_TS.IFO")).unwrap().write_all(&bytes).unwrap();
		assert!(open_disc(dir.path()).is_err());
	}

	#[test]
	fn titleset_bounds_are_enforced() {
		let dir = tempdir();
		write_amg(dir.path(), 1);
		write_ats(dir.path(), 1);
		let disc = open_disc(dir.path()).unwrap();

		assert!(open_titleset(&disc, 0).is_err());
		assert!(open_titleset(&disc, 2).is_err());

		let titleset = open_titleset(&disc, 1).unwrap();
		assert_eq!(titleset.number(), 1);
	}

	#[test]
	fn track_rejects_inverted_sector_range() {
		let dir = tempdir();
		write_amg(dir.path(), 1);
		write_ats(dir.path(), 1);
		let disc = open_disc(dir.path()).unwrap();
		let titleset = open_titleset(&disc, 1).unwrap();
		let title = open_title(&titleset, 1).unwrap();

		assert!(open_track(&title, 1, 10, 5, 90_000).is_err());

		let track = open_track(&title, 1, 0, 10, 90_000).unwrap();
		assert_eq!(track.descriptor().last_sector, 10);
	}
}

/*!
# DVD-Audio: Sector Reader (L1)

Presents the concatenation of `ATS_XX_1.AOB … ATS_XX_9.AOB` as a single
seekable sequence of fixed-size 2048-byte sectors, with an optional
in-place CPPM descrambling pass.
*/

use crate::error::Error;
use std::{
	fs::{
		self,
		File,
	},
	io::{
		Read,
		Seek,
		SeekFrom,
	},
	path::{
		Path,
		PathBuf,
	},
};



/// # Sector Size (Bytes).
pub const SECTOR_SIZE: usize = 2048;

/// # Maximum AOB Files Per Title Set.
const MAX_AOBS: u8 = 9;



/// # CPPM Descrambler.
///
/// CPPM (Content Protection for Pre-recorded Media) is an external
/// collaborator: given a device path and the disc's `DVDAUDIO.MKB`, it
/// performs an in-place block transform on sectors as they're read. This
/// crate only defines the seam; a real descrambler lives elsewhere.
pub trait Descrambler {
	/// # Initialize.
	///
	/// Returns `None` if the device/MKB pair can't be used to initialize a
	/// working descrambler (in which case the sector reader proceeds
	/// without descrambling).
	fn init(device: &Path, mkb_path: &Path) -> Option<Self>
	where Self: Sized;

	/// # Decrypt Block.
	///
	/// Transforms `sector` (exactly [`SECTOR_SIZE`] bytes) in place.
	fn decrypt_block(&mut self, sector: &mut [u8]);
}

/// # No-op Descrambler.
///
/// Used when no device/MKB pair is supplied; `init` always fails so
/// [`AobReader::open`] never attempts to construct one.
pub struct NoDescrambler;

impl Descrambler for NoDescrambler {
	fn init(_device: &Path, _mkb_path: &Path) -> Option<Self> { None }
	fn decrypt_block(&mut self, _sector: &mut [u8]) {}
}



/// # One Open AOB File.
struct Aob {
	file: File,
	total_sectors: u32,
	current_sector: u32,
}

impl Aob {
	/// # Open.
	fn open(path: &Path) -> Result<Self, Error> {
		let meta = fs::metadata(path)?;
		let file = File::open(path)?;
		let total_sectors = u32::try_from(meta.len() / SECTOR_SIZE as u64)
			.map_err(|_| Error::Bug("AOB larger than u32 sectors"))?;
		Ok(Self { file, total_sectors, current_sector: 0 })
	}

	/// # Read One Sector.
	///
	/// Returns `Ok(true)` on a full, in-bounds read, `Ok(false)` at (or
	/// past) this AOB's end. A short read from an otherwise-in-bounds
	/// position is treated the same as end-of-file.
	fn read_sector(&mut self, buf: &mut [u8; SECTOR_SIZE]) -> Result<bool, Error> {
		if self.current_sector >= self.total_sectors { return Ok(false); }
		match self.file.read_exact(buf) {
			Ok(()) => { self.current_sector += 1; Ok(true) },
			Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
			Err(e) => Err(e.into()),
		}
	}

	/// # Seek To Sector.
	fn seek_sector(&mut self, sector: u32) -> Result<(), Error> {
		let sector = sector.min(self.total_sectors);
		self.file.seek(SeekFrom::Start(u64::from(sector) * SECTOR_SIZE as u64))?;
		self.current_sector = sector;
		Ok(())
	}
}



#[derive(Debug, Default)]
/// # CPPM Configuration.
///
/// Carries the two pieces of information a [`Descrambler`] needs to
/// initialize itself: the raw device path and the disc's key-block file.
/// Passing `None` for the device disables descrambling unconditionally.
pub struct CppmConfig {
	/// # Device Path.
	pub device: Option<PathBuf>,
}

/// # Sector Reader (L1).
///
/// Opens `ATS_NN_1.AOB … ATS_NN_9.AOB` for a given title set and presents
/// them as one seekable run of 2048-byte sectors.
pub(crate) struct AobReader<D: Descrambler = NoDescrambler> {
	aobs: Vec<Aob>,
	current: usize,
	descrambler: Option<D>,
}

impl<D: Descrambler> AobReader<D> {
	/// # Open.
	///
	/// Opens the sequence `ATS_NN_1.AOB … ATS_NN_9.AOB` (two-digit
	/// zero-padded title set), stopping at the first missing file. If
	/// `cppm.device` is set and `DVDAUDIO.MKB` exists under
	/// `audio_ts_path`, a descrambler is initialized and applied to every
	/// sector read afterward; otherwise descrambling is disabled.
	///
	/// Filename lookup is case-insensitive, matching the first directory
	/// entry that case-folds to the target name.
	///
	/// ## Errors
	///
	/// Returns [`Error::NotFound`] if not even the first AOB
	/// (`ATS_NN_1.AOB`) can be opened.
	pub(crate) fn open<P: AsRef<Path>>(
		audio_ts_path: P,
		titleset: u8,
		cppm: &CppmConfig,
	) -> Result<Self, Error> {
		let audio_ts_path = audio_ts_path.as_ref();
		let mut aobs = Vec::new();

		for n in 1..=MAX_AOBS {
			let name = format!("ATS_{titleset:02}_{n}.AOB");
			let Some(path) = find_ci(audio_ts_path, &name) else { break; };
			match Aob::open(&path) {
				Ok(aob) => aobs.push(aob),
				Err(_) => break,
			}
		}

		if aobs.is_empty() {
			return Err(Error::NotFound(format!("ATS_{titleset:02}_1.AOB")));
		}

		let descrambler = cppm.device.as_deref().and_then(|device| {
			let mkb_path = find_ci(audio_ts_path, "DVDAUDIO.MKB")?;
			D::init(device, &mkb_path)
		});

		Ok(Self { aobs, current: 0, descrambler })
	}

	#[must_use]
	/// # Total Sectors.
	pub(crate) fn total_sectors(&self) -> u32 {
		self.aobs.iter().map(|a| a.total_sectors).sum()
	}

	/// # Read.
	///
	/// Reads the next 2048-byte sector, transparently advancing across
	/// AOB boundaries. Returns `Ok(false)` at end-of-stream (all AOBs
	/// exhausted).
	///
	/// ## Errors
	///
	/// Returns an IO-flavored [`Error`] on a genuine read failure.
	pub(crate) fn read(&mut self, buf: &mut [u8; SECTOR_SIZE]) -> Result<bool, Error> {
		loop {
			let Some(aob) = self.aobs.get_mut(self.current) else { return Ok(false); };
			if aob.read_sector(buf)? {
				if let Some(d) = self.descrambler.as_mut() { d.decrypt_block(buf); }
				return Ok(true);
			}
			self.current += 1;
		}
	}

	/// # Seek.
	///
	/// Locates the AOB containing global sector `index` by accumulating
	/// per-AOB sector counts and positions that file accordingly.
	///
	/// ## Errors
	///
	/// Returns [`Error::Parameter`] if `index` is past the end of the last
	/// AOB.
	pub(crate) fn seek(&mut self, mut index: u32) -> Result<(), Error> {
		for (i, aob) in self.aobs.iter_mut().enumerate() {
			if index < aob.total_sectors {
				aob.seek_sector(index)?;
				self.current = i;
				return Ok(());
			}
			index -= aob.total_sectors;
		}
		Err(Error::Parameter("sector index past end of title set"))
	}

	#[must_use]
	/// # Tell.
	///
	/// Returns the global index of the next sector to be read.
	pub(crate) fn tell(&self) -> u32 {
		let mut total = 0_u32;
		for aob in &self.aobs[..self.current.min(self.aobs.len())] {
			total += aob.total_sectors;
		}
		if let Some(aob) = self.aobs.get(self.current) {
			total += aob.current_sector;
		}
		total
	}
}



/// # Case-insensitive Directory Lookup.
///
/// Enumerates `dir` once and returns the full path of the first entry whose
/// name case-folds (ASCII) to `name`.
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
	use std::io::Write;

	fn write_aob(dir: &Path, name: &str, sectors: u32) {
		let mut f = File::create(dir.join(name)).unwrap();
		for s in 0..sectors {
			let mut buf = [0_u8; SECTOR_SIZE];
			buf[0] = (s & 0xFF) as u8;
			f.write_all(&buf).unwrap();
		}
	}

	#[test]
	fn spans_aob_boundary() {
		let dir = tempdir();
		write_aob(dir.path(), "ATS_01_1.AOB", 3);
		write_aob(dir.path(), "ATS_01_2.AOB", 3);

		let mut reader = AobReader::<NoDescrambler>::open(
			dir.path(), 1, &CppmConfig::default(),
		).unwrap();
		assert_eq!(reader.total_sectors(), 6);

		reader.seek(2).unwrap();
		let mut buf = [0_u8; SECTOR_SIZE];
		assert!(reader.read(&mut buf).unwrap());
		assert_eq!(buf[0], 2); // Last sector of AOB 1.
		assert!(reader.read(&mut buf).unwrap());
		assert_eq!(buf[0], 0); // First sector of AOB 2.
		assert_eq!(reader.tell(), 4);
	}

	#[test]
	fn ends_at_last_sector() {
		let dir = tempdir();
		write_aob(dir.path(), "ATS_02_1.AOB", 1);
		let mut reader = AobReader::<NoDescrambler>::open(
			dir.path(), 2, &CppmConfig::default(),
		).unwrap();

		let mut buf = [0_u8; SECTOR_SIZE];
		assert!(reader.read(&mut buf).unwrap());
		assert!(! reader.read(&mut buf).unwrap());
	}

	#[test]
	fn case_insensitive_lookup() {
		let dir = tempdir();
		write_aob(dir.path(), "ats_03_1.aob", 1);
		assert!(AobReader::<NoDescrambler>::open(
			dir.path(), 3, &CppmConfig::default(),
		).is_ok());
	}

	#[test]
	fn missing_first_aob_fails() {
		let dir = tempdir();
		assert!(AobReader::<NoDescrambler>::open(
			dir.path(), 9, &CppmConfig::default(),
		).is_err());
	}

	#[test]
	fn seek_past_end_fails() {
		let dir = tempdir();
		write_aob(dir.path(), "ATS_04_1.AOB", 1);
		let mut reader = AobReader::<NoDescrambler>::open(
			dir.path(), 4, &CppmConfig::default(),
		).unwrap();
		assert!(reader.seek(5).is_err());
	}

	/// # Minimal Temp Directory Helper.
	///
	/// Avoids pulling in a `tempfile` dependency for tests alone; cleans up
	/// on drop via `Drop` below.
	fn tempdir() -> TempDir {
		let mut path = std::env::temp_dir();
		let unique = format!(
			"dvdaudio_core_test_{}_{:p}",
			std::process::id(),
			&path as *const _,
		);
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
}

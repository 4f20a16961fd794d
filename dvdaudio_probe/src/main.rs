/*!
# DVD-Audio Probe!
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::allow_attributes,
	clippy::clone_on_ref_ptr,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	missing_copy_implementations,
	missing_docs,
	trivial_casts,
	trivial_numeric_casts,
	unused_extern_crates,
	unused_import_braces,
)]

use argyle::{
	Argue,
	ArgyleError,
	FLAG_HELP,
	FLAG_VERSION,
};
use dactyl::{
	NiceU32,
	traits::BytesToUnsigned,
};
use dvdaudio_core::{
	open_disc,
	open_title,
	open_titleset,
	open_track,
	open_track_reader,
	Codec,
	Error,
};
use fyi_msg::Msg;

/// # Read Chunk (Frames).
///
/// Frame counts are accumulated in chunks this large; the value has no
/// bearing on correctness, only on how many syscalls `read` makes.
const CHUNK_FRAMES: usize = 4096;



/// # Main.
fn main() {
	let args = match Argue::new(FLAG_HELP | FLAG_VERSION) {
		Ok(args) => args,
		Err(ArgyleError::WantsVersion) => {
			println!(concat!("DVD-Audio Probe v", env!("CARGO_PKG_VERSION")));
			return;
		},
		Err(ArgyleError::WantsHelp) => {
			helper();
			return;
		},
		Err(e) => {
			Msg::from(Error::CliArg(e.to_string())).eprint();
			std::process::exit(1);
		},
	};

	if let Err(e) = _main(&args) {
		Msg::from(e).eprint();
		std::process::exit(1);
	}
}

/// # Actual Main.
///
/// Opens a track by its explicit sector range and PTS length — the
/// title/track table lives in an external IFO parser this crate doesn't
/// have — and reports the decoded codec, format, and frame count.
fn _main(args: &Argue) -> Result<(), Error> {
	let audio_ts = args.option2(b"-a", b"--audio-ts")
		.ok_or_else(|| Error::CliArg("missing -a/--audio-ts".to_owned()))?;
	let audio_ts = std::str::from_utf8(audio_ts)
		.map_err(|_| Error::CliArg("-a/--audio-ts is not valid UTF-8".to_owned()))?;

	let titleset = arg_u8(args, b"--titleset", 1)?;
	let title = arg_u8(args, b"--title", 1)?;
	let track = arg_u8(args, b"--track", 1)?;
	let first_sector = arg_u32(args, b"--first-sector", 0)?;
	let last_sector = arg_u32(args, b"--last-sector", 0)?;
	let pts_length = arg_u32(args, b"--pts-length", 0)?;

	let disc = open_disc(audio_ts)?;
	let titleset = open_titleset(&disc, titleset)?;
	let title = open_title(&titleset, title)?;
	let track = open_track(&title, track, first_sector, last_sector, pts_length)?;
	let mut reader = open_track_reader(&track)?;

	let codec = match reader.codec() {
		Codec::Pcm => "PCM",
		Codec::Mlp => "MLP",
	};
	let channels = usize::from(reader.channel_count());

	let mut buf = vec![0_i32; CHUNK_FRAMES * channels];
	let mut total_frames: u64 = 0;
	loop {
		let got = reader.read(CHUNK_FRAMES, &mut buf);
		total_frames += got as u64;
		if got < CHUNK_FRAMES { break; }
	}

	println!("Codec:          {codec}");
	println!("Bits per sample: {}", reader.bits_per_sample());
	println!("Sample rate:     {} Hz", reader.sample_rate());
	println!("Channels:        {} (mask 0x{:03x})", reader.channel_count(), reader.riff_wave_channel_mask());
	println!("Frames decoded:  {}", NiceU32::from(u32::try_from(total_frames).unwrap_or(u32::MAX)));

	Ok(())
}

/// # Parse A `u8` CLI Option, Falling Back To `default`.
fn arg_u8(args: &Argue, key: &[u8], default: u8) -> Result<u8, Error> {
	args.option(key).map_or(Ok(default), |v| {
		u8::btou(v).ok_or_else(|| Error::CliArg(format!("invalid {}", String::from_utf8_lossy(key))))
	})
}

/// # Parse A `u32` CLI Option, Falling Back To `default`.
fn arg_u32(args: &Argue, key: &[u8], default: u32) -> Result<u32, Error> {
	args.option(key).map_or(Ok(default), |v| {
		u32::btou(v).ok_or_else(|| Error::CliArg(format!("invalid {}", String::from_utf8_lossy(key))))
	})
}

#[cold]
/// # Print Help.
fn helper() {
	println!(concat!(
		r#"
   ___ _   _ ___       _             _ _
  |   \ | | |   \ ___ / \ _  _ __| (_) ___
  | |) \ \/ /| |) / _` / _ \ || / _` | / _ \
  |___/ \__/ |___/\__,_\___/\_,_\__,_|_\___/
"#, "\x1b[38;5;69mDVD-Audio Probe\x1b[0m v", env!("CARGO_PKG_VERSION"), r#"
  Inspects a single DVD-Audio track; writes nothing.

USAGE:
    dvdaudio_probe [OPTIONS]

OPTIONS:
    -a, --audio-ts <PATH>     Path to the disc's AUDIO_TS directory.
        --titleset <NUM>      Title set number (1-99). [default: 1]
        --title <NUM>         Title number within the title set. [default: 1]
        --track <NUM>         Track number within the title. [default: 1]
        --first-sector <NUM>  Track's first sector (global, within the title set).
        --last-sector <NUM>   Track's last sector (inclusive).
        --pts-length <NUM>    Track length, in 90000-tick-per-second units.
    -h, --help                Print this message and exit.
    -V, --version             Print the version and exit.

Since IFO track-table parsing is out of scope for this crate, the sector
range and PTS length must be supplied explicitly; a real frontend would read
them from the title set's ATS_NN_0.IFO.
"#,
	));
}

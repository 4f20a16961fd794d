/*!
# DVD-Audio: Library

A read-only DVD-Audio decoder: sector reader, MPEG-2 program-stream
demultiplexer, DVD-Audio PCM deinterleaver, and MLP lossless decoder. Given
an `AUDIO_TS` directory and a caller-supplied track descriptor (sector range
and PTS length — the title/track table itself lives in an external IFO
parser), [`open_track_reader`] returns a pull-based [`TrackReader`] yielding
interleaved, signed PCM samples in RIFF-WAVE channel order.
*/

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
	unsafe_code,
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
	clippy::undocumented_unsafe_blocks,
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

mod channels;
mod demux;
mod disc;
mod error;
mod mlp;
mod pcm;
mod sector;
mod stream;
mod track;

pub use channels::ChannelAssignment;
pub use disc::{
	open_disc,
	open_title,
	open_titleset,
	open_track,
	open_track_reader,
	open_track_reader_with,
	Disc,
	Title,
	Titleset,
	Track,
};
pub use error::{Error, Result};
pub use sector::{CppmConfig, Descrambler, NoDescrambler, SECTOR_SIZE};
pub use stream::StreamParameters;
pub use track::{Codec, TrackDescriptor, TrackReader};

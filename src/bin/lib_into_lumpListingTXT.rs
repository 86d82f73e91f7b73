#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	anyhow::Context,
	clap::Parser,
	sc_isomap::{archive::ArchiveIndex, stdoutRaw},
	std::{
		fs,
		io::{BufWriter, Write},
		path::PathBuf,
	},
};

fn main() -> anyhow::Result<()> {
	/// Lists the lumps of an archive: name, offset, stored length, flags and unpacked length.
	#[derive(Parser)]
	struct Args {
		#[clap(value_parser)]
		archive: PathBuf,

		/// Headerless layout with a trailing entry count. Its map lumps use another body layout.
		#[clap(long)]
		legacy: bool,
	}
	let Args { archive, legacy } = Args::parse();
	env_logger::init();

	let buffer = fs::read(&archive).with_context(|| format!("{}", archive.display()))?;
	let index = if legacy { ArchiveIndex::openLegacy(&buffer) } else { ArchiveIndex::open(&buffer) }
		.with_context(|| format!("{}", archive.display()))?;
	let out = &mut BufWriter::new(stdoutRaw());
	for entry in index.entries() {
		writeln!(
			out,
			"{:<13} {:>8} {:>8} {}{:>9}",
			entry.name,
			entry.offset,
			entry.length,
			if entry.isCompressed() { "rle " } else { "    " },
			entry.unpackedLength,
		)?;
	}
	out.flush()?;
	Ok(())
}

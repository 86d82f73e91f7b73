use {
	crate::{
		archive::{ArchiveEntry, ArchiveIndex},
		error::Result,
		level::{self, LevelData},
	},
	log::{error, info},
};

pub const LEVEL_EXTENSION: &str = ".map";

/// Result of decoding one level lump. Failures stay local to their lump.
#[derive(Debug)]
pub struct LevelOutcome<'i> {
	pub entry: &'i ArchiveEntry,
	pub level: Result<LevelData>,
}

pub fn isLevelEntry(entry: &ArchiveEntry) -> bool {
	let name = entry.name.as_bytes();
	name.len() > LEVEL_EXTENSION.len()
		&& name[name.len() - LEVEL_EXTENSION.len()..].eq_ignore_ascii_case(LEVEL_EXTENSION.as_bytes())
}

/// Decodes every level lump in archive order, collecting failures instead of stopping at them.
pub fn decodeLevels<'i>(index: &'i ArchiveIndex, buffer: &[u8]) -> Vec<LevelOutcome<'i>> {
	let outcomes: Vec<_> = index
		.entries()
		.iter()
		.filter(|entry| isLevelEntry(entry))
		.map(|entry| {
			let level = entry.resource(buffer).and_then(|raw| level::decode(&entry.name, &raw));
			if let Err(err) = &level {
				error!("{}: {err}", entry.name);
			}
			LevelOutcome { entry, level }
		})
		.collect();
	let failed = outcomes.iter().filter(|outcome| outcome.level.is_err()).count();
	info!("decoded {} of {} levels", outcomes.len() - failed, outcomes.len());
	outcomes
}

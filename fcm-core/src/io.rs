use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

/// Reads a whole file into memory.
pub(crate) fn read_bytes<P: AsRef<Path>>(filename: P) -> io::Result<Vec<u8>> {
	let mut contents = Vec::new();
	File::open(filename)?.read_to_end(&mut contents)?;
	Ok(contents)
}

/// Creates (or truncates) a file and writes `bytes` to it.
pub(crate) fn write_bytes<P: AsRef<Path>>(filename: P, bytes: &[u8]) -> io::Result<()> {
	let mut writer = BufWriter::new(File::create(filename)?);
	writer.write_all(bytes)?;
	writer.flush()
}

//! Streaming ZIP reader for EPUB files
//!
//! Memory-efficient ZIP reader that reads entries on demand without loading
//! the entire archive. Uses a fixed-size central directory cache (max 256
//! entries) and supports DEFLATE decompression using miniz_oxide.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use heapless::Vec as HeaplessVec;
use log;
use miniz_oxide::{DataFormat, MZError, MZFlush, MZStatus};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::resolve::candidate_entry_names;

/// Maximum number of central directory entries to cache
const MAX_CD_ENTRIES: usize = 256;

/// Maximum filename length in ZIP entries
const MAX_FILENAME_LEN: usize = 256;

/// Scratch buffer size used for chunked entry reads
const CHUNK_SIZE: usize = 8 * 1024;

/// Upper bound on the up-front allocation made by `read_entry`
const MAX_READ_PREALLOC: usize = CHUNK_SIZE * 8;

/// Runtime-configurable ZIP safety limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZipLimits {
    /// Maximum compressed or uncompressed file size allowed for reads.
    pub max_file_read_size: usize,
    /// Maximum allowed size for the required `mimetype` entry.
    pub max_mimetype_size: usize,
    /// Whether ZIP parsing should fail on strict structural issues.
    pub strict: bool,
    /// Maximum bytes scanned from file tail while searching for EOCD.
    pub max_eocd_scan: usize,
}

impl ZipLimits {
    /// Create explicit ZIP limits.
    pub fn new(max_file_read_size: usize, max_mimetype_size: usize) -> Self {
        Self {
            max_file_read_size,
            max_mimetype_size,
            strict: false,
            max_eocd_scan: MAX_EOCD_SCAN,
        }
    }

    /// Enable or disable strict ZIP parsing behavior.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set a cap for EOCD tail scan bytes.
    pub fn with_max_eocd_scan(mut self, max_eocd_scan: usize) -> Self {
        self.max_eocd_scan = max_eocd_scan.max(EOCD_MIN_SIZE);
        self
    }
}

/// Local file header signature (little-endian)
const SIG_LOCAL_FILE_HEADER: u32 = 0x04034b50;

/// Central directory entry signature (little-endian)
const SIG_CD_ENTRY: u32 = 0x02014b50;

/// End of central directory signature (little-endian)
const SIG_EOCD: u32 = 0x06054b50;
/// ZIP64 end of central directory locator signature (little-endian)
const SIG_ZIP64_EOCD_LOCATOR: u32 = 0x07064b50;
/// Minimum EOCD record size in bytes
const EOCD_MIN_SIZE: usize = 22;
/// Maximum EOCD search window (EOCD + max comment length)
const MAX_EOCD_SCAN: usize = EOCD_MIN_SIZE + u16::MAX as usize;

/// Stored (uncompressed) entry
pub const METHOD_STORED: u16 = 0;
/// DEFLATE-compressed entry
pub const METHOD_DEFLATED: u16 = 8;

// Re-export the crate's public ZIP error alias for module consumers.
pub use crate::error::ZipError;

/// Object-safe `Read + Seek`, so component parsers can share one archive type.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Archive handed to component parsers during a pipeline run.
pub type EpubArchive<'a> = StreamingZip<&'a mut dyn ReadSeek>;

#[derive(Clone, Copy, Debug)]
struct EocdInfo {
    cd_offset: u64,
    cd_size: u32,
    num_entries: u16,
    uses_zip64: bool,
}

/// Central directory entry metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdEntry {
    /// Compression method (0=stored, 8=deflated)
    pub method: u16,
    /// Compressed size in bytes
    pub compressed_size: u32,
    /// Uncompressed size in bytes
    pub uncompressed_size: u32,
    /// Offset to local file header
    pub local_header_offset: u32,
    /// CRC32 checksum
    pub crc32: u32,
    /// Filename (max 255 chars)
    pub filename: String,
}

/// Streaming ZIP file reader
pub struct StreamingZip<F: Read + Seek> {
    /// File handle
    file: F,
    /// Central directory entries (fixed size), in central directory order
    entries: HeaplessVec<CdEntry, MAX_CD_ENTRIES>,
    /// Number of entries declared by the central directory
    num_entries: usize,
    /// Optional configurable resource/safety limits.
    limits: Option<ZipLimits>,
}

impl<F: Read + Seek> StreamingZip<F> {
    /// Open a ZIP file and parse the central directory
    pub fn new(file: F) -> Result<Self, ZipError> {
        Self::new_with_limits(file, None)
    }

    /// Open a ZIP file with explicit runtime limits.
    pub fn new_with_limits(mut file: F, limits: Option<ZipLimits>) -> Result<Self, ZipError> {
        let max_eocd_scan = limits
            .map(|l| l.max_eocd_scan.min(MAX_EOCD_SCAN))
            .unwrap_or(MAX_EOCD_SCAN);
        let eocd = Self::find_eocd(&mut file, max_eocd_scan)?;
        if eocd.uses_zip64 {
            return Err(ZipError::UnsupportedZip64);
        }
        let strict = limits.is_some_and(|l| l.strict);
        if strict && eocd.num_entries as usize > MAX_CD_ENTRIES {
            return Err(ZipError::CentralDirFull);
        }

        let mut entries: HeaplessVec<CdEntry, MAX_CD_ENTRIES> = HeaplessVec::new();

        file.seek(SeekFrom::Start(eocd.cd_offset))
            .map_err(|_| ZipError::IoError)?;
        let cd_end = eocd.cd_offset + eocd.cd_size as u64;

        for _ in 0..eocd.num_entries.min(MAX_CD_ENTRIES as u16) {
            let pos = file.stream_position().map_err(|_| ZipError::IoError)?;
            if pos >= cd_end {
                if strict {
                    return Err(ZipError::InvalidFormat);
                }
                break;
            }
            if let Some(entry) = Self::read_cd_entry(&mut file)? {
                entries.push(entry).map_err(|_| ZipError::CentralDirFull)?;
            } else if strict {
                return Err(ZipError::InvalidFormat);
            } else {
                break;
            }
        }

        if eocd.num_entries as usize > MAX_CD_ENTRIES {
            log::warn!(
                "[ZIP] Archive has {} entries but only {} were loaded (max: {})",
                eocd.num_entries,
                entries.len(),
                MAX_CD_ENTRIES
            );
        }

        log::debug!(
            "[ZIP] Parsed {} central directory entries (offset {})",
            entries.len(),
            eocd.cd_offset
        );

        Ok(Self {
            file,
            entries,
            num_entries: eocd.num_entries as usize,
            limits,
        })
    }

    /// Find EOCD and extract central directory info
    fn find_eocd(file: &mut F, max_eocd_scan: usize) -> Result<EocdInfo, ZipError> {
        let file_size = file.seek(SeekFrom::End(0)).map_err(|_| ZipError::IoError)?;

        if file_size < EOCD_MIN_SIZE as u64 {
            return Err(ZipError::InvalidFormat);
        }

        // Scan last (EOCD + max comment) bytes for EOCD signature.
        let scan_range = file_size.min(max_eocd_scan as u64) as usize;
        let mut buffer = alloc::vec![0u8; scan_range];

        file.seek(SeekFrom::Start(file_size - scan_range as u64))
            .map_err(|_| ZipError::IoError)?;
        file.read_exact(&mut buffer).map_err(|_| ZipError::IoError)?;
        let scan_base = file_size - scan_range as u64;

        // Scan backwards for EOCD signature
        for i in (0..=scan_range.saturating_sub(EOCD_MIN_SIZE)).rev() {
            if read_u32_le(&buffer, i) != SIG_EOCD {
                continue;
            }
            let num_entries = read_u16_le(&buffer, i + 10);
            let cd_size = read_u32_le(&buffer, i + 12);
            let cd_offset = read_u32_le(&buffer, i + 16) as u64;
            let comment_len = read_u16_le(&buffer, i + 20) as u64;
            let eocd_pos = scan_base + i as u64;
            let eocd_end = eocd_pos + EOCD_MIN_SIZE as u64 + comment_len;
            if eocd_end != file_size {
                continue;
            }

            let cd_end = cd_offset
                .checked_add(cd_size as u64)
                .ok_or(ZipError::InvalidFormat)?;
            if cd_end > eocd_pos || cd_end > file_size {
                return Err(ZipError::InvalidFormat);
            }

            let uses_zip64_sentinel =
                num_entries == u16::MAX || cd_size == u32::MAX || cd_offset == u32::MAX as u64;
            let uses_zip64_locator = if eocd_pos >= 20 {
                file.seek(SeekFrom::Start(eocd_pos - 20))
                    .map_err(|_| ZipError::IoError)?;
                let mut locator_sig = [0u8; 4];
                file.read_exact(&mut locator_sig)
                    .map_err(|_| ZipError::IoError)?;
                u32::from_le_bytes(locator_sig) == SIG_ZIP64_EOCD_LOCATOR
            } else {
                false
            };

            return Ok(EocdInfo {
                cd_offset,
                cd_size,
                num_entries,
                uses_zip64: uses_zip64_sentinel || uses_zip64_locator,
            });
        }

        Err(ZipError::InvalidFormat)
    }

    /// Read a central directory entry from file
    fn read_cd_entry(file: &mut F) -> Result<Option<CdEntry>, ZipError> {
        let mut sig_buf = [0u8; 4];
        if file.read_exact(&mut sig_buf).is_err() {
            return Ok(None);
        }
        if u32::from_le_bytes(sig_buf) != SIG_CD_ENTRY {
            return Ok(None);
        }

        // Fixed portion after the signature; buf[N] is CD entry offset N + 4.
        let mut buf = [0u8; 42];
        file.read_exact(&mut buf).map_err(|_| ZipError::IoError)?;

        let mut entry = CdEntry {
            method: read_u16_le(&buf, 6),
            crc32: read_u32_le(&buf, 12),
            compressed_size: read_u32_le(&buf, 16),
            uncompressed_size: read_u32_le(&buf, 20),
            local_header_offset: read_u32_le(&buf, 38),
            filename: String::new(),
        };
        let name_len = read_u16_le(&buf, 24) as usize;
        let extra_len = read_u16_le(&buf, 26) as usize;
        let comment_len = read_u16_le(&buf, 28) as usize;

        if name_len > 0 && name_len <= MAX_FILENAME_LEN {
            let mut name_buf = alloc::vec![0u8; name_len];
            file.read_exact(&mut name_buf)
                .map_err(|_| ZipError::IoError)?;
            entry.filename = String::from_utf8_lossy(&name_buf).to_string();
        } else if name_len > MAX_FILENAME_LEN {
            file.seek(SeekFrom::Current(name_len as i64))
                .map_err(|_| ZipError::IoError)?;
        }

        let skip_bytes = extra_len + comment_len;
        if skip_bytes > 0 {
            file.seek(SeekFrom::Current(skip_bytes as i64))
                .map_err(|_| ZipError::IoError)?;
        }

        Ok(Some(entry))
    }

    /// Get entry by exact filename
    pub fn get_entry(&self, name: &str) -> Option<&CdEntry> {
        self.entries.iter().find(|e| e.filename == name)
    }

    /// Get entry by nominal path, tolerating common packager mistakes.
    ///
    /// Tries the candidates produced by [`candidate_entry_names`] in order
    /// (leading separators, separator swaps, percent-decoding) and returns the
    /// first that names an entry.
    pub fn find_entry(&self, name: &str) -> Option<&CdEntry> {
        let found = candidate_entry_names(name)
            .into_iter()
            .find_map(|candidate| self.get_entry(&candidate));
        if let Some(entry) = found {
            if entry.filename != name {
                log::debug!("[ZIP] Resolved '{}' to entry '{}'", name, entry.filename);
            }
        }
        found
    }

    /// Position of `entry` in the central directory.
    pub fn index_of(&self, entry: &CdEntry) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.local_header_offset == entry.local_header_offset)
    }

    /// Read and decompress a whole entry into memory.
    pub fn read_entry(&mut self, entry: &CdEntry) -> Result<Vec<u8>, ZipError> {
        // Declared sizes are untrusted; let the buffer grow past this.
        let capacity = core::cmp::min(entry.uncompressed_size as usize, MAX_READ_PREALLOC);
        let mut out = Vec::with_capacity(capacity);
        self.read_file_to_writer(entry, &mut out)?;
        Ok(out)
    }

    /// Stream a file's decompressed bytes into an arbitrary writer.
    pub fn read_file_to_writer<W: Write>(
        &mut self,
        entry: &CdEntry,
        writer: &mut W,
    ) -> Result<usize, ZipError> {
        let mut input_buf = alloc::vec![0u8; CHUNK_SIZE];
        let mut output_buf = alloc::vec![0u8; CHUNK_SIZE];
        self.read_file_to_writer_with_scratch(entry, writer, &mut input_buf, &mut output_buf)
    }

    /// Stream a file's decompressed bytes into a writer using caller-provided scratch buffers.
    ///
    /// `input_buf` and `output_buf` must both be non-empty. The CRC32 recorded
    /// in the central directory is verified after the last chunk.
    pub fn read_file_to_writer_with_scratch<W: Write>(
        &mut self,
        entry: &CdEntry,
        writer: &mut W,
        input_buf: &mut [u8],
        output_buf: &mut [u8],
    ) -> Result<usize, ZipError> {
        if input_buf.is_empty() || output_buf.is_empty() {
            return Err(ZipError::InvalidFormat);
        }
        if let Some(limits) = self.limits {
            if entry.uncompressed_size as usize > limits.max_file_read_size
                || entry.compressed_size as usize > limits.max_file_read_size
            {
                return Err(ZipError::FileTooLarge);
            }
        }

        let data_offset = self.calc_data_offset(entry)?;
        self.file
            .seek(SeekFrom::Start(data_offset))
            .map_err(|_| ZipError::IoError)?;

        let mut hasher = crc32fast::Hasher::new();
        let written = match entry.method {
            METHOD_STORED => {
                let mut remaining = entry.compressed_size as usize;
                let mut written = 0usize;
                while remaining > 0 {
                    let take = core::cmp::min(remaining, input_buf.len());
                    self.file
                        .read_exact(&mut input_buf[..take])
                        .map_err(|_| ZipError::IoError)?;
                    writer
                        .write_all(&input_buf[..take])
                        .map_err(|_| ZipError::IoError)?;
                    hasher.update(&input_buf[..take]);
                    written += take;
                    remaining -= take;
                }
                written
            }
            METHOD_DEFLATED => {
                self.inflate_to_writer(entry, writer, &mut hasher, input_buf, output_buf)?
            }
            _ => return Err(ZipError::UnsupportedCompression),
        };

        if entry.crc32 != 0 && hasher.finalize() != entry.crc32 {
            return Err(ZipError::CrcMismatch);
        }
        Ok(written)
    }

    fn inflate_to_writer<W: Write>(
        &mut self,
        entry: &CdEntry,
        writer: &mut W,
        hasher: &mut crc32fast::Hasher,
        input_buf: &mut [u8],
        output_buf: &mut [u8],
    ) -> Result<usize, ZipError> {
        let mut state = alloc::boxed::Box::new(
            miniz_oxide::inflate::stream::InflateState::new(DataFormat::Raw),
        );
        let mut compressed_remaining = entry.compressed_size as usize;
        let mut pending = &[][..];
        let mut written = 0usize;

        loop {
            if pending.is_empty() && compressed_remaining > 0 {
                let take = core::cmp::min(compressed_remaining, input_buf.len());
                self.file
                    .read_exact(&mut input_buf[..take])
                    .map_err(|_| ZipError::IoError)?;
                pending = &input_buf[..take];
                compressed_remaining -= take;
            }

            // `MZFlush::Finish` needs the whole remaining output to fit in `output_buf`.
            let result = miniz_oxide::inflate::stream::inflate(
                &mut state,
                pending,
                output_buf,
                MZFlush::None,
            );
            let consumed = result.bytes_consumed;
            let produced = result.bytes_written;
            pending = &pending[consumed..];

            if produced > 0 {
                writer
                    .write_all(&output_buf[..produced])
                    .map_err(|_| ZipError::IoError)?;
                hasher.update(&output_buf[..produced]);
                written += produced;
            }
            if let Some(limits) = self.limits {
                if written > limits.max_file_read_size {
                    return Err(ZipError::FileTooLarge);
                }
            }

            match result.status {
                Ok(MZStatus::StreamEnd) => {
                    if compressed_remaining != 0 || !pending.is_empty() {
                        return Err(ZipError::DecompressError);
                    }
                    return Ok(written);
                }
                Ok(MZStatus::Ok) | Err(MZError::Buf) => {
                    // No progress with input exhausted means a truncated stream.
                    if consumed == 0 && produced == 0 {
                        return Err(ZipError::DecompressError);
                    }
                }
                Ok(MZStatus::NeedDict) | Err(_) => return Err(ZipError::DecompressError),
            }
        }
    }

    /// Calculate the offset to the actual file data (past local header)
    fn calc_data_offset(&mut self, entry: &CdEntry) -> Result<u64, ZipError> {
        let offset = entry.local_header_offset as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|_| ZipError::IoError)?;

        // Local file header: 30 bytes fixed + variable filename/extra
        let mut header = [0u8; 30];
        self.file
            .read_exact(&mut header)
            .map_err(|_| ZipError::IoError)?;

        if read_u32_le(&header, 0) != SIG_LOCAL_FILE_HEADER {
            return Err(ZipError::InvalidFormat);
        }

        let name_len = read_u16_le(&header, 26) as u64;
        let extra_len = read_u16_le(&header, 28) as u64;

        Ok(offset + 30 + name_len + extra_len)
    }

    /// Get number of entries in central directory
    pub fn num_entries(&self) -> usize {
        self.num_entries.min(self.entries.len())
    }

    /// Iterate over all entries
    pub fn entries(&self) -> impl Iterator<Item = &CdEntry> {
        self.entries.iter()
    }

    /// Get the active limits used by this ZIP reader.
    pub fn limits(&self) -> Option<ZipLimits> {
        self.limits
    }
}

/// Read u16 from buffer at offset (little-endian)
fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Read u32 from buffer at offset (little-endian)
fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct TestEntry<'a> {
        name: &'a str,
        content: &'a [u8],
        deflate: bool,
    }

    fn stored<'a>(name: &'a str, content: &'a [u8]) -> TestEntry<'a> {
        TestEntry {
            name,
            content,
            deflate: false,
        }
    }

    /// Build an in-memory ZIP archive from `entries`, in order.
    fn build_zip(entries: &[TestEntry<'_>]) -> Vec<u8> {
        let mut zip = Vec::new();
        let mut central = Vec::new();

        for entry in entries {
            let name_bytes = entry.name.as_bytes();
            let crc = crc32fast::hash(entry.content);
            let (method, data) = if entry.deflate {
                (
                    METHOD_DEFLATED,
                    miniz_oxide::deflate::compress_to_vec(entry.content, 6),
                )
            } else {
                (METHOD_STORED, entry.content.to_vec())
            };
            let local_offset = zip.len() as u32;

            // -- Local file header --
            zip.extend_from_slice(&SIG_LOCAL_FILE_HEADER.to_le_bytes());
            zip.extend_from_slice(&20u16.to_le_bytes()); // version needed
            zip.extend_from_slice(&0u16.to_le_bytes()); // flags
            zip.extend_from_slice(&method.to_le_bytes());
            zip.extend_from_slice(&0u32.to_le_bytes()); // mod time + date
            zip.extend_from_slice(&crc.to_le_bytes());
            zip.extend_from_slice(&(data.len() as u32).to_le_bytes());
            zip.extend_from_slice(&(entry.content.len() as u32).to_le_bytes());
            zip.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
            zip.extend_from_slice(&0u16.to_le_bytes()); // extra field length
            zip.extend_from_slice(name_bytes);
            zip.extend_from_slice(&data);

            // -- Central directory entry --
            central.extend_from_slice(&SIG_CD_ENTRY.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes()); // version made by
            central.extend_from_slice(&20u16.to_le_bytes()); // version needed
            central.extend_from_slice(&0u16.to_le_bytes()); // flags
            central.extend_from_slice(&method.to_le_bytes());
            central.extend_from_slice(&0u32.to_le_bytes()); // mod time + date
            central.extend_from_slice(&crc.to_le_bytes());
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(entry.content.len() as u32).to_le_bytes());
            central.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes()); // extra field length
            central.extend_from_slice(&0u16.to_le_bytes()); // comment length
            central.extend_from_slice(&0u16.to_le_bytes()); // disk number start
            central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
            central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
            central.extend_from_slice(&local_offset.to_le_bytes());
            central.extend_from_slice(name_bytes);
        }

        let cd_offset = zip.len() as u32;
        let cd_size = central.len() as u32;
        let count = entries.len() as u16;
        zip.extend_from_slice(&central);

        // -- End of central directory --
        zip.extend_from_slice(&SIG_EOCD.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes()); // disk number
        zip.extend_from_slice(&0u16.to_le_bytes()); // disk with CD
        zip.extend_from_slice(&count.to_le_bytes()); // entries on this disk
        zip.extend_from_slice(&count.to_le_bytes()); // total entries
        zip.extend_from_slice(&cd_size.to_le_bytes());
        zip.extend_from_slice(&cd_offset.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes()); // comment length

        zip
    }

    fn add_zip_comment(mut zip: Vec<u8>, comment_len: usize) -> Vec<u8> {
        let eocd_pos = zip.len() - EOCD_MIN_SIZE;
        let comment_len = comment_len as u16;
        zip[eocd_pos + 20..eocd_pos + 22].copy_from_slice(&comment_len.to_le_bytes());
        zip.extend_from_slice(&vec![b'A'; comment_len as usize]);
        zip
    }

    fn open(entries: &[TestEntry<'_>]) -> StreamingZip<Cursor<Vec<u8>>> {
        StreamingZip::new(Cursor::new(build_zip(entries))).unwrap()
    }

    #[test]
    fn test_read_stored_entry() {
        let mut zip = open(&[stored("mimetype", b"application/epub+zip")]);
        assert_eq!(zip.num_entries(), 1);

        let entry = zip.get_entry("mimetype").unwrap().clone();
        assert_eq!(entry.method, METHOD_STORED);
        assert_eq!(zip.read_entry(&entry).unwrap(), b"application/epub+zip");
    }

    #[test]
    fn test_read_deflated_entry() {
        let content = b"<container>".repeat(500);
        let mut zip = open(&[TestEntry {
            name: "META-INF/container.xml",
            content: &content,
            deflate: true,
        }]);

        let entry = zip.get_entry("META-INF/container.xml").unwrap().clone();
        assert_eq!(entry.method, METHOD_DEFLATED);
        assert!((entry.compressed_size as usize) < content.len());
        assert_eq!(zip.read_entry(&entry).unwrap(), content);
    }

    #[test]
    fn test_small_scratch_buffers_stream_deflated_entry() {
        let content = b"abcdefghij".repeat(100);
        let mut zip = open(&[TestEntry {
            name: "data.txt",
            content: &content,
            deflate: true,
        }]);
        let entry = zip.get_entry("data.txt").unwrap().clone();

        let mut out = Vec::new();
        let mut input = [0u8; 7];
        let mut output = [0u8; 16];
        let n = zip
            .read_file_to_writer_with_scratch(&entry, &mut out, &mut input, &mut output)
            .expect("streaming with scratch should succeed");
        assert_eq!(n, content.len());
        assert_eq!(out, content);
    }

    #[test]
    fn test_deflated_entry_larger_than_output_chunk() {
        // Compresses into a single input chunk but inflates to many output chunks.
        let content = b"<item id=\"x\" href=\"text/chapter.xhtml\"/>\n".repeat(4_000);
        assert!(content.len() > CHUNK_SIZE * 10);
        let mut zip = open(&[TestEntry {
            name: "EPUB/package.opf",
            content: &content,
            deflate: true,
        }]);

        let entry = zip.get_entry("EPUB/package.opf").unwrap().clone();
        assert!((entry.compressed_size as usize) < CHUNK_SIZE);
        assert_eq!(zip.read_entry(&entry).unwrap(), content);
    }

    #[test]
    fn test_read_entry_ignores_declared_size_for_allocation() {
        let mut data = build_zip(&[stored("data.txt", b"1234567890")]);
        let eocd_pos = data.len() - EOCD_MIN_SIZE;
        let cd_offset = read_u32_le(&data, eocd_pos + 16) as usize;
        data[cd_offset + 24..cd_offset + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());

        let mut zip = StreamingZip::new(Cursor::new(data)).unwrap();
        let entry = zip.get_entry("data.txt").unwrap().clone();
        assert_eq!(entry.uncompressed_size, 0xFFFF_FFF0);

        let bytes = zip.read_entry(&entry).unwrap();
        assert_eq!(bytes, b"1234567890");
        assert!(bytes.capacity() <= MAX_READ_PREALLOC);
    }

    #[test]
    fn test_crc_mismatch_detected() {
        let mut data = build_zip(&[stored("mimetype", b"application/epub+zip")]);
        // Corrupt the first content byte (local header is 30 bytes + 8-byte name).
        data[38] = b'A';
        let mut zip = StreamingZip::new(Cursor::new(data)).unwrap();
        let entry = zip.get_entry("mimetype").unwrap().clone();
        assert_eq!(zip.read_entry(&entry), Err(ZipError::CrcMismatch));
    }

    #[test]
    fn test_get_entry_is_exact() {
        let zip = open(&[stored("META-INF/container.xml", b"x")]);
        assert!(zip.get_entry("META-INF/container.xml").is_some());
        assert!(zip.get_entry("meta-inf/container.xml").is_none());
        assert!(zip.get_entry("/META-INF/container.xml").is_none());
    }

    #[test]
    fn test_find_entry_resolves_packager_variants() {
        let zip = open(&[
            stored("/mimetype", b"a"),
            stored("META-INF\\container.xml", b"b"),
            stored("OEBPS/my book.opf", b"c"),
        ]);

        assert_eq!(zip.find_entry("mimetype").unwrap().filename, "/mimetype");
        assert_eq!(
            zip.find_entry("META-INF/container.xml").unwrap().filename,
            "META-INF\\container.xml"
        );
        assert_eq!(
            zip.find_entry("OEBPS/my%20book.opf").unwrap().filename,
            "OEBPS/my book.opf"
        );
        assert!(zip.find_entry("missing.txt").is_none());
    }

    #[test]
    fn test_index_of_follows_central_directory_order() {
        let zip = open(&[stored("a.txt", b"a"), stored("mimetype", b"m")]);
        let entry = zip.get_entry("mimetype").unwrap();
        assert_eq!(zip.index_of(entry), Some(1));
    }

    #[test]
    fn test_eocd_found_with_long_comment() {
        let data = add_zip_comment(build_zip(&[stored("mimetype", b"x")]), 2_000);
        let zip = StreamingZip::new(Cursor::new(data)).expect("EOCD should be discoverable");
        assert!(zip.get_entry("mimetype").is_some());
    }

    #[test]
    fn test_eocd_scan_limit_rejects_long_tail() {
        let data = add_zip_comment(build_zip(&[stored("mimetype", b"x")]), 2_000);
        let limits = ZipLimits::new(1024 * 1024, 1024).with_max_eocd_scan(128);
        let result = StreamingZip::new_with_limits(Cursor::new(data), Some(limits));
        assert!(matches!(result, Err(ZipError::InvalidFormat)));
    }

    #[test]
    fn test_not_a_zip() {
        let result = StreamingZip::new(Cursor::new(b"definitely not a zip archive".to_vec()));
        assert!(matches!(result, Err(ZipError::InvalidFormat)));
    }

    #[test]
    fn test_zip64_sentinel_rejected() {
        let mut data = build_zip(&[stored("mimetype", b"x")]);
        let eocd_pos = data.len() - EOCD_MIN_SIZE;
        data[eocd_pos + 10..eocd_pos + 12].copy_from_slice(&u16::MAX.to_le_bytes());
        let result = StreamingZip::new(Cursor::new(data));
        assert!(matches!(result, Err(ZipError::UnsupportedZip64)));
    }

    #[test]
    fn test_strict_rejects_too_many_cd_entries() {
        let mut data = build_zip(&[stored("mimetype", b"x")]);
        let eocd_pos = data.len() - EOCD_MIN_SIZE;
        let count = (MAX_CD_ENTRIES as u16) + 1;
        data[eocd_pos + 8..eocd_pos + 10].copy_from_slice(&count.to_le_bytes());
        data[eocd_pos + 10..eocd_pos + 12].copy_from_slice(&count.to_le_bytes());
        let limits = ZipLimits::new(1024 * 1024, 1024).with_strict(true);
        let result = StreamingZip::new_with_limits(Cursor::new(data), Some(limits));
        assert!(matches!(result, Err(ZipError::CentralDirFull)));
    }

    #[test]
    fn test_zip_limits_enforced_when_configured() {
        let data = build_zip(&[stored("data.txt", b"1234567890")]);
        let limits = ZipLimits::new(8, 8);
        let mut zip = StreamingZip::new_with_limits(Cursor::new(data), Some(limits)).unwrap();
        let entry = zip.get_entry("data.txt").unwrap().clone();
        assert_eq!(zip.read_entry(&entry), Err(ZipError::FileTooLarge));
    }

    #[test]
    fn test_zip_limits_not_enforced_by_default() {
        let mut zip = open(&[stored("data.txt", b"1234567890")]);
        let entry = zip.get_entry("data.txt").unwrap().clone();
        assert_eq!(zip.read_entry(&entry).unwrap(), b"1234567890");
    }

    #[test]
    fn test_dyn_archive_reads_entries() {
        let mut cursor = Cursor::new(build_zip(&[stored("mimetype", b"x")]));
        let mut zip: EpubArchive<'_> = StreamingZip::new(&mut cursor as &mut dyn ReadSeek).unwrap();
        let entry = zip.get_entry("mimetype").unwrap().clone();
        assert_eq!(zip.read_entry(&entry).unwrap(), b"x");
    }
}

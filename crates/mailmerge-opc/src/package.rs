use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::path::{normalize_part_name, rels_for_part, resolve_target};
use crate::rels::{parse_relationships, Relationship};
use crate::OpcError;

/// Default maximum uncompressed size of any single part inflated into memory.
///
/// ZIP metadata is untrusted: a tiny archive can advertise (or actually inflate to) enormous
/// sizes, so every part read is capped.
pub const DEFAULT_MAX_PART_BYTES: u64 = 256 * 1024 * 1024; // 256MiB

/// Default maximum total uncompressed bytes across all parts of one package.
pub const DEFAULT_MAX_PACKAGE_BYTES: u64 = 512 * 1024 * 1024; // 512MiB

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackageLimits {
    pub max_part_bytes: u64,
    pub max_total_bytes: u64,
}

impl Default for PackageLimits {
    fn default() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            max_total_bytes: DEFAULT_MAX_PACKAGE_BYTES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// An inflated OPC package. Part order is the ZIP entry order of the source archive and is kept
/// on write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpcError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file), PackageLimits::default())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OpcError> {
        Self::from_reader(Cursor::new(bytes), PackageLimits::default())
    }

    pub fn from_reader<R: Read + Seek>(reader: R, limits: PackageLimits) -> Result<Self, OpcError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());
        let mut total: u64 = 0;

        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').replace('\\', "/");
            if file.size() > limits.max_part_bytes {
                return Err(OpcError::PartTooLarge {
                    part: name,
                    size: file.size(),
                    max: limits.max_part_bytes,
                });
            }

            // Do not trust the advertised size for allocation; read at most one byte past the cap.
            let mut bytes = Vec::new();
            file.take(limits.max_part_bytes + 1).read_to_end(&mut bytes)?;
            let size = bytes.len() as u64;
            if size > limits.max_part_bytes {
                return Err(OpcError::PartTooLarge {
                    part: name,
                    size,
                    max: limits.max_part_bytes,
                });
            }

            total = total.saturating_add(size);
            if total > limits.max_total_bytes {
                return Err(OpcError::PackageTooLarge {
                    total,
                    max: limits.max_total_bytes,
                });
            }
            parts.push(Part { name, bytes });
        }

        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    fn position(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.parts.iter().position(|p| p.name == name) {
            return Some(idx);
        }
        let key = normalize_part_name(name);
        self.parts
            .iter()
            .position(|p| normalize_part_name(&p.name) == key)
    }

    /// Look up a part, tolerating leading `/`, `\` separators, case and percent-encoding
    /// differences. An exact match always wins.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.position(name).map(|idx| self.parts[idx].bytes.as_slice())
    }

    pub fn require_part(&self, name: &str) -> Result<&[u8], OpcError> {
        self.part(name)
            .ok_or_else(|| OpcError::MissingPart(name.to_string()))
    }

    /// Replace the bytes of an existing part (keeping its position and name) or append a new one.
    pub fn set_part(&mut self, name: &str, bytes: Vec<u8>) {
        match self.position(name) {
            Some(idx) => self.parts[idx].bytes = bytes,
            None => self.parts.push(Part {
                name: name.to_string(),
                bytes,
            }),
        }
    }

    /// Relationships owned by `part`. A missing `.rels` part means no relationships.
    pub fn relationships(&self, part: &str) -> Result<Vec<Relationship>, OpcError> {
        let rels_name = rels_for_part(part);
        match self.part(&rels_name) {
            Some(bytes) => parse_relationships(bytes, &rels_name),
            None => Ok(Vec::new()),
        }
    }

    /// Resolved internal targets of `part`'s relationships whose type ends with `/{kind}`, in
    /// relationship order.
    pub fn related_parts(&self, part: &str, kind: &str) -> Result<Vec<String>, OpcError> {
        Ok(self
            .relationships(part)?
            .into_iter()
            .filter(|rel| rel.has_kind(kind) && !rel.is_external())
            .map(|rel| resolve_target(part, &rel.target))
            .collect())
    }

    /// Serialize the package as a ZIP archive.
    ///
    /// Entries are written in part order with a fixed timestamp, so equal packages always
    /// serialize to equal bytes. Media is stored, everything else deflated.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W, OpcError> {
        let mut zip = ZipWriter::new(writer);
        let base = SimpleFileOptions::default().last_modified_time(zip::DateTime::default());
        let deflated = base.compression_method(CompressionMethod::Deflated);
        let stored = base.compression_method(CompressionMethod::Stored);

        for part in &self.parts {
            let options = if part.name.contains("/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.bytes)?;
        }
        Ok(zip.finish()?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, OpcError> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}

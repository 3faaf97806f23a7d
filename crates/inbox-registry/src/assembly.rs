//! Assembly and file version extraction from .NET binaries.
//!
//! Reads just enough of a PE image to answer two questions:
//!
//! - the assembly version, from the single row of the CLI metadata
//!   `Assembly` table (ECMA-335 §II.22.2);
//! - the file version, from the `VS_FIXEDFILEINFO` block of the Win32
//!   version resource.
//!
//! Locating the `Assembly` table requires the byte size of every table
//! that precedes it in the `#~` stream, so the column layout of tables
//! 0x00 to 0x1F is spelled out below.

use inbox_core::{AssemblyVersion, VersionPair};

use crate::error::{RegistryError, Result};

const IMAGE_DIRECTORY_ENTRY_RESOURCE: usize = 2;
const IMAGE_DIRECTORY_ENTRY_CLI: usize = 14;
const METADATA_SIGNATURE: u32 = 0x424A_5342;
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;
const RT_VERSION: u32 = 16;
const ASSEMBLY_TABLE: usize = 0x20;

/// Read the (assembly version, file version) pair of a managed binary.
/// A binary without a version resource has file version `0.0.0.0`.
pub fn read_version_pair(image: &[u8]) -> Result<VersionPair> {
    let pe = PeImage::parse(image)?;
    let assembly = pe.assembly_version()?;
    let file = pe.file_version()?.unwrap_or_default();
    Ok(VersionPair::new(assembly, file))
}

fn invalid(detail: impl Into<String>) -> RegistryError {
    RegistryError::InvalidAssembly {
        detail: detail.into(),
    }
}

/// `len` bytes at `offset`, failing on truncation or offset overflow.
fn bytes_at(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| invalid(format!("truncated at offset {offset:#x}")))
}

fn u16_at(data: &[u8], offset: usize) -> Result<u16> {
    bytes_at(data, offset, 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn u32_at(data: &[u8], offset: usize) -> Result<u32> {
    bytes_at(data, offset, 4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn u64_at(data: &[u8], offset: usize) -> Result<u64> {
    bytes_at(data, offset, 8).map(|b| {
        u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
    })
}

#[derive(Debug, Clone, Copy)]
struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_size: u32,
    raw_pointer: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct DataDirectory {
    rva: u32,
    size: u32,
}

struct PeImage<'a> {
    data: &'a [u8],
    sections: Vec<Section>,
    directories: Vec<DataDirectory>,
}

impl<'a> PeImage<'a> {
    fn parse(data: &'a [u8]) -> Result<Self> {
        if data.get(..2) != Some(&b"MZ"[..]) {
            return Err(invalid("missing MZ header"));
        }
        let pe = u32_at(data, 0x3C)? as usize;
        if bytes_at(data, pe, 4).ok() != Some(&b"PE\0\0"[..]) {
            return Err(invalid("missing PE signature"));
        }

        let coff = pe + 4;
        let section_count = u16_at(data, coff + 2)? as usize;
        let optional_size = u16_at(data, coff + 16)? as usize;
        let optional = coff + 20;

        let (count_offset, directories_offset) = match u16_at(data, optional)? {
            0x10b => (92, 96),
            0x20b => (108, 112),
            magic => return Err(invalid(format!("unknown optional header magic {magic:#x}"))),
        };
        let directory_count = u32_at(data, optional + count_offset)? as usize;
        let mut directories = Vec::with_capacity(directory_count.min(16));
        for index in 0..directory_count.min(16) {
            let at = optional + directories_offset + index * 8;
            directories.push(DataDirectory {
                rva: u32_at(data, at)?,
                size: u32_at(data, at + 4)?,
            });
        }

        let table = optional + optional_size;
        let mut sections = Vec::with_capacity(section_count);
        for index in 0..section_count {
            let at = table + index * 40;
            sections.push(Section {
                virtual_size: u32_at(data, at + 8)?,
                virtual_address: u32_at(data, at + 12)?,
                raw_size: u32_at(data, at + 16)?,
                raw_pointer: u32_at(data, at + 20)?,
            });
        }

        Ok(PeImage {
            data,
            sections,
            directories,
        })
    }

    fn directory(&self, index: usize) -> Option<DataDirectory> {
        self.directories
            .get(index)
            .copied()
            .filter(|d| d.rva != 0 && d.size != 0)
    }

    fn offset_of(&self, rva: u32) -> Result<usize> {
        let section = self
            .sections
            .iter()
            .find(|s| {
                let extent = s.virtual_size.max(s.raw_size);
                rva.checked_sub(s.virtual_address)
                    .is_some_and(|delta| delta < extent)
            })
            .ok_or_else(|| invalid(format!("rva {rva:#x} is outside every section")))?;
        let delta = rva - section.virtual_address;
        (section.raw_pointer as usize)
            .checked_add(delta as usize)
            .ok_or_else(|| invalid(format!("section pointer for rva {rva:#x} overflows")))
    }

    fn slice(&self, rva: u32, size: u32) -> Result<&'a [u8]> {
        let start = self.offset_of(rva)?;
        start
            .checked_add(size as usize)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| invalid(format!("rva {rva:#x}+{size:#x} exceeds the image")))
    }

    fn assembly_version(&self) -> Result<AssemblyVersion> {
        let cli = self
            .directory(IMAGE_DIRECTORY_ENTRY_CLI)
            .ok_or_else(|| invalid("not a managed assembly (no CLI header)"))?;
        let header = self.slice(cli.rva, cli.size)?;
        let metadata = self.slice(u32_at(header, 8)?, u32_at(header, 12)?)?;
        let tables = tables_stream(metadata)?;
        TableStream::parse(tables)?.assembly_version()
    }

    fn file_version(&self) -> Result<Option<AssemblyVersion>> {
        let Some(resources) = self.directory(IMAGE_DIRECTORY_ENTRY_RESOURCE) else {
            return Ok(None);
        };
        let root = self.slice(resources.rva, resources.size)?;

        let Some(types) = find_resource_entry(root, 0, Some(RT_VERSION))? else {
            return Ok(None);
        };
        let Some(names) = subdirectory(types) else {
            return Ok(None);
        };
        let Some(languages) = find_resource_entry(root, names, None)? else {
            return Ok(None);
        };
        let Some(language_dir) = subdirectory(languages) else {
            return Ok(None);
        };
        let Some(data_entry) = find_resource_entry(root, language_dir, None)? else {
            return Ok(None);
        };
        if subdirectory(data_entry).is_some() {
            return Ok(None);
        }
        let data_entry = data_entry as usize;
        let data = self.slice(u32_at(root, data_entry)?, u32_at(root, data_entry + 4)?)?;
        Ok(fixed_file_version(data))
    }
}

/// Offset of a resource subdirectory, when the entry points at one.
fn subdirectory(entry: u32) -> Option<usize> {
    (entry & 0x8000_0000 != 0).then_some((entry & 0x7FFF_FFFF) as usize)
}

/// The `OffsetToData` of the entry with the given id in the resource
/// directory at `dir`, or of its first entry when `id` is `None`.
fn find_resource_entry(root: &[u8], dir: usize, id: Option<u32>) -> Result<Option<u32>> {
    let named = u16_at(root, dir + 12)? as usize;
    let ids = u16_at(root, dir + 14)? as usize;
    for index in 0..named + ids {
        let at = dir + 16 + index * 8;
        let name = u32_at(root, at)?;
        let matches = match id {
            None => true,
            Some(id) => name & 0x8000_0000 == 0 && name == id,
        };
        if matches {
            return Ok(Some(u32_at(root, at + 4)?));
        }
    }
    Ok(None)
}

fn fixed_file_version(data: &[u8]) -> Option<AssemblyVersion> {
    (0..data.len().saturating_sub(16))
        .step_by(4)
        .find(|&at| u32_at(data, at).ok() == Some(FIXED_FILE_INFO_SIGNATURE))
        .and_then(|at| {
            let ms = u32_at(data, at + 8).ok()?;
            let ls = u32_at(data, at + 12).ok()?;
            Some(AssemblyVersion::new(
                (ms >> 16) as u16,
                ms as u16,
                (ls >> 16) as u16,
                ls as u16,
            ))
        })
}

/// Locate the `#~` (or uncompressed `#-`) stream in the metadata root.
fn tables_stream(metadata: &[u8]) -> Result<&[u8]> {
    if u32_at(metadata, 0)? != METADATA_SIGNATURE {
        return Err(invalid("bad metadata signature"));
    }
    let version_length = u32_at(metadata, 12)? as usize;
    let mut at = 16 + version_length;
    let stream_count = u16_at(metadata, at + 2)? as usize;
    at += 4;

    for _ in 0..stream_count {
        let offset = u32_at(metadata, at)? as usize;
        let size = u32_at(metadata, at + 4)? as usize;
        let name_start = at + 8;
        let name_len = metadata
            .get(name_start..)
            .and_then(|rest| rest.iter().position(|&b| b == 0))
            .ok_or_else(|| invalid("unterminated stream name"))?;
        let name = &metadata[name_start..name_start + name_len];
        if name == b"#~" || name == b"#-" {
            return bytes_at(metadata, offset, size)
                .map_err(|_| invalid("tables stream exceeds metadata"));
        }
        at = name_start + (name_len + 4) / 4 * 4;
    }
    Err(invalid("no metadata tables stream"))
}

#[derive(Debug, Clone, Copy)]
enum Coded {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    CustomAttributeType,
    ResolutionScope,
}

impl Coded {
    fn layout(self) -> (u32, &'static [usize]) {
        match self {
            Coded::TypeDefOrRef => (2, &[0x02, 0x01, 0x1B]),
            Coded::HasConstant => (2, &[0x04, 0x08, 0x17]),
            Coded::HasCustomAttribute => (
                5,
                &[
                    0x06, 0x04, 0x01, 0x02, 0x08, 0x09, 0x0A, 0x00, 0x0E, 0x17, 0x14, 0x11, 0x1A,
                    0x1B, 0x20, 0x23, 0x26, 0x27, 0x28, 0x2A, 0x2C, 0x2B,
                ],
            ),
            Coded::HasFieldMarshal => (1, &[0x04, 0x08]),
            Coded::HasDeclSecurity => (2, &[0x02, 0x06, 0x20]),
            Coded::MemberRefParent => (3, &[0x02, 0x01, 0x1A, 0x06, 0x1B]),
            Coded::HasSemantics => (1, &[0x14, 0x17]),
            Coded::MethodDefOrRef => (1, &[0x06, 0x0A]),
            Coded::MemberForwarded => (1, &[0x04, 0x06]),
            Coded::CustomAttributeType => (3, &[0x06, 0x0A]),
            Coded::ResolutionScope => (2, &[0x00, 0x1A, 0x23, 0x01]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Column {
    Fixed(usize),
    Str,
    Guid,
    Blob,
    Table(usize),
    Coded(Coded),
}

use Column::{Blob, Coded as C, Fixed, Guid, Str, Table};

/// Column layout of metadata tables 0x00 to 0x1F.
const SCHEMA: [&[Column]; ASSEMBLY_TABLE] = [
    /* 0x00 Module */ &[Fixed(2), Str, Guid, Guid, Guid],
    /* 0x01 TypeRef */ &[C(Coded::ResolutionScope), Str, Str],
    /* 0x02 TypeDef */
    &[Fixed(4), Str, Str, C(Coded::TypeDefOrRef), Table(0x04), Table(0x06)],
    /* 0x03 FieldPtr */ &[Table(0x04)],
    /* 0x04 Field */ &[Fixed(2), Str, Blob],
    /* 0x05 MethodPtr */ &[Table(0x06)],
    /* 0x06 MethodDef */ &[Fixed(4), Fixed(2), Fixed(2), Str, Blob, Table(0x08)],
    /* 0x07 ParamPtr */ &[Table(0x08)],
    /* 0x08 Param */ &[Fixed(2), Fixed(2), Str],
    /* 0x09 InterfaceImpl */ &[Table(0x02), C(Coded::TypeDefOrRef)],
    /* 0x0A MemberRef */ &[C(Coded::MemberRefParent), Str, Blob],
    /* 0x0B Constant */ &[Fixed(2), C(Coded::HasConstant), Blob],
    /* 0x0C CustomAttribute */
    &[C(Coded::HasCustomAttribute), C(Coded::CustomAttributeType), Blob],
    /* 0x0D FieldMarshal */ &[C(Coded::HasFieldMarshal), Blob],
    /* 0x0E DeclSecurity */ &[Fixed(2), C(Coded::HasDeclSecurity), Blob],
    /* 0x0F ClassLayout */ &[Fixed(2), Fixed(4), Table(0x02)],
    /* 0x10 FieldLayout */ &[Fixed(4), Table(0x04)],
    /* 0x11 StandAloneSig */ &[Blob],
    /* 0x12 EventMap */ &[Table(0x02), Table(0x14)],
    /* 0x13 EventPtr */ &[Table(0x14)],
    /* 0x14 Event */ &[Fixed(2), Str, C(Coded::TypeDefOrRef)],
    /* 0x15 PropertyMap */ &[Table(0x02), Table(0x17)],
    /* 0x16 PropertyPtr */ &[Table(0x17)],
    /* 0x17 Property */ &[Fixed(2), Str, Blob],
    /* 0x18 MethodSemantics */ &[Fixed(2), Table(0x06), C(Coded::HasSemantics)],
    /* 0x19 MethodImpl */
    &[Table(0x02), C(Coded::MethodDefOrRef), C(Coded::MethodDefOrRef)],
    /* 0x1A ModuleRef */ &[Str],
    /* 0x1B TypeSpec */ &[Blob],
    /* 0x1C ImplMap */ &[Fixed(2), C(Coded::MemberForwarded), Str, Table(0x1A)],
    /* 0x1D FieldRVA */ &[Fixed(4), Table(0x04)],
    /* 0x1E EncLog */ &[Fixed(4), Fixed(4)],
    /* 0x1F EncMap */ &[Fixed(4)],
];

struct TableStream<'a> {
    data: &'a [u8],
    heap_sizes: u8,
    rows: [u32; 64],
    tables_start: usize,
}

impl<'a> TableStream<'a> {
    fn parse(data: &'a [u8]) -> Result<Self> {
        let heap_sizes = *data.get(6).ok_or_else(|| invalid("truncated tables stream"))?;
        let valid = u64_at(data, 8)?;

        let mut rows = [0u32; 64];
        let mut at = 24;
        for (table, count) in rows.iter_mut().enumerate() {
            if valid & (1 << table) != 0 {
                *count = u32_at(data, at)?;
                at += 4;
            }
        }
        if heap_sizes & 0x40 != 0 {
            at += 4;
        }

        Ok(TableStream {
            data,
            heap_sizes,
            rows,
            tables_start: at,
        })
    }

    fn heap_index_size(&self, flag: u8) -> usize {
        if self.heap_sizes & flag != 0 {
            4
        } else {
            2
        }
    }

    fn column_size(&self, column: Column) -> usize {
        match column {
            Fixed(size) => size,
            Str => self.heap_index_size(0x01),
            Guid => self.heap_index_size(0x02),
            Blob => self.heap_index_size(0x04),
            Table(table) => {
                if self.rows[table] < 1 << 16 {
                    2
                } else {
                    4
                }
            }
            C(coded) => {
                let (tag_bits, tables) = coded.layout();
                let max_rows = tables.iter().map(|&t| self.rows[t]).max().unwrap_or(0);
                if max_rows < 1 << (16 - tag_bits) {
                    2
                } else {
                    4
                }
            }
        }
    }

    fn row_size(&self, table: usize) -> usize {
        SCHEMA[table].iter().map(|&c| self.column_size(c)).sum()
    }

    fn assembly_version(&self) -> Result<AssemblyVersion> {
        if self.rows[ASSEMBLY_TABLE] == 0 {
            return Err(invalid("metadata has no Assembly row"));
        }
        let offset = (0..ASSEMBLY_TABLE)
            .try_fold(self.tables_start, |at, t| {
                (self.rows[t] as usize)
                    .checked_mul(self.row_size(t))
                    .and_then(|size| at.checked_add(size))
            })
            .ok_or_else(|| invalid("metadata table sizes overflow"))?;
        // HashAlgId precedes the four version components.
        Ok(AssemblyVersion::new(
            u16_at(self.data, offset + 4)?,
            u16_at(self.data, offset + 6)?,
            u16_at(self.data, offset + 8)?,
            u16_at(self.data, offset + 10)?,
        ))
    }
}

/// Build a minimal PE32 image carrying the given versions. The metadata
/// holds one Module row (with 4-byte string indexes) and one Assembly row.
#[cfg(test)]
pub(crate) fn build_test_assembly(
    assembly: AssemblyVersion,
    file: Option<AssemblyVersion>,
) -> Vec<u8> {
    fn put16(buf: &mut [u8], at: usize, v: u16) {
        buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
    }
    fn put32(buf: &mut [u8], at: usize, v: u32) {
        buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    let mut image = vec![0u8; 0x400];
    image[..2].copy_from_slice(b"MZ");
    put32(&mut image, 0x3C, 0x80);
    image[0x80..0x84].copy_from_slice(b"PE\0\0");
    put16(&mut image, 0x84, 0x14C);
    put16(&mut image, 0x86, 1);
    put16(&mut image, 0x94, 0xE0);

    let optional = 0x98;
    put16(&mut image, optional, 0x10B);
    put32(&mut image, optional + 92, 16);
    let directories = optional + 96;
    if file.is_some() {
        put32(&mut image, directories + 2 * 8, 0x2100);
        put32(&mut image, directories + 2 * 8 + 4, 0x100);
    }
    put32(&mut image, directories + 14 * 8, 0x2000);
    put32(&mut image, directories + 14 * 8 + 4, 72);

    let section = optional + 0xE0;
    image[section..section + 5].copy_from_slice(b".text");
    put32(&mut image, section + 8, 0x200);
    put32(&mut image, section + 12, 0x2000);
    put32(&mut image, section + 16, 0x200);
    put32(&mut image, section + 20, 0x200);

    // CLI header at rva 0x2000.
    let base = 0x200;
    put32(&mut image, base, 72);
    put32(&mut image, base + 8, 0x2050);
    put32(&mut image, base + 12, 0xA0);

    // Metadata root at rva 0x2050.
    let root = base + 0x50;
    put32(&mut image, root, METADATA_SIGNATURE);
    put16(&mut image, root + 4, 1);
    put16(&mut image, root + 6, 1);
    put32(&mut image, root + 12, 12);
    image[root + 16..root + 26].copy_from_slice(b"v4.0.30319");
    put16(&mut image, root + 30, 1);
    put32(&mut image, root + 32, 48);
    put32(&mut image, root + 36, 0x60);
    image[root + 40..root + 42].copy_from_slice(b"#~");

    // Tables stream.
    let tables = root + 48;
    put16(&mut image, tables + 4, 2);
    image[tables + 6] = 0x01;
    image[tables + 7] = 1;
    put32(&mut image, tables + 8, 1);
    put32(&mut image, tables + 12, 1);
    put32(&mut image, tables + 24, 1);
    put32(&mut image, tables + 28, 1);
    // Module row: 2 + 4 + 2 + 2 + 2 bytes.
    let assembly_row = tables + 32 + 12;
    put32(&mut image, assembly_row, 0x8004);
    put16(&mut image, assembly_row + 4, assembly.major);
    put16(&mut image, assembly_row + 6, assembly.minor);
    put16(&mut image, assembly_row + 8, assembly.build);
    put16(&mut image, assembly_row + 10, assembly.revision);

    if let Some(file) = file {
        // Resource tree at rva 0x2100: type 16 → name 1 → language 0x409.
        let rsrc = base + 0x100;
        put16(&mut image, rsrc + 14, 1);
        put32(&mut image, rsrc + 16, RT_VERSION);
        put32(&mut image, rsrc + 20, 0x8000_0018);
        put16(&mut image, rsrc + 0x18 + 14, 1);
        put32(&mut image, rsrc + 0x18 + 16, 1);
        put32(&mut image, rsrc + 0x18 + 20, 0x8000_0030);
        put16(&mut image, rsrc + 0x30 + 14, 1);
        put32(&mut image, rsrc + 0x30 + 16, 0x409);
        put32(&mut image, rsrc + 0x30 + 20, 0x48);
        put32(&mut image, rsrc + 0x48, 0x2160);
        put32(&mut image, rsrc + 0x48 + 4, 0x60);

        let info = base + 0x160;
        put16(&mut image, info, 92);
        put16(&mut image, info + 2, 52);
        for (i, unit) in "VS_VERSION_INFO".encode_utf16().enumerate() {
            put16(&mut image, info + 6 + i * 2, unit);
        }
        let fixed = info + 40;
        put32(&mut image, fixed, FIXED_FILE_INFO_SIGNATURE);
        put32(&mut image, fixed + 4, 0x0001_0000);
        put32(
            &mut image,
            fixed + 8,
            (u32::from(file.major) << 16) | u32::from(file.minor),
        );
        put32(
            &mut image,
            fixed + 12,
            (u32::from(file.build) << 16) | u32::from(file.revision),
        );
    }

    image
}

//! Reading and writing scipy `.npz` sparse matrices
//!
//! An `.npz` file is a zip archive of `.npy` members. scipy's `save_npz`
//! writes `format.npy` (a 0-d string array naming the layout), `shape.npy`
//! and either `data`/`indices`/`indptr` (csr, csc) or `data`/`row`/`col`
//! (coo). Numeric members are decoded with `ndarray-npy`; the string member
//! is decoded here since `ndarray-npy` has no string dtype.

use crate::data::SparseMatrix;
use crate::error::{LoadError, WriteError};
use ndarray::Array1;
use ndarray_npy::{ReadNpyExt, ReadableElement, WriteNpyExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Which axis the compressed index pointer runs over
#[derive(Debug, Clone, Copy)]
enum Major {
    Row,
    Column,
}

/// Element type of an `.npy` member, decoded from its `descr` string
#[derive(Debug, Clone, Copy, PartialEq)]
enum ElementKind {
    Signed(usize),
    Unsigned(usize),
    Float(usize),
    Bool,
    Unicode(usize),
    Bytes(usize),
}

impl ElementKind {
    fn from_descr(descr: &str) -> Option<Self> {
        let body = descr.trim_start_matches(|c| matches!(c, '<' | '>' | '|' | '='));
        let mut chars = body.chars();
        let code = chars.next()?;
        let size: usize = chars.as_str().parse().ok()?;
        match code {
            'i' => Some(Self::Signed(size)),
            'u' => Some(Self::Unsigned(size)),
            'f' => Some(Self::Float(size)),
            'b' if size == 1 => Some(Self::Bool),
            'U' => Some(Self::Unicode(size)),
            'S' => Some(Self::Bytes(size)),
            _ => None,
        }
    }
}

/// Parsed `.npy` header: dtype descriptor, shape and payload offset
#[derive(Debug, Clone, PartialEq)]
struct NpyHeader {
    descr: String,
    shape: Vec<usize>,
    data_offset: usize,
}

impl NpyHeader {
    fn parse(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
            return Err("missing NPY magic".to_string());
        }

        // Header length field: 2 bytes in v1, 4 bytes in v2 and v3
        let (header_len, header_start) = match bytes[6] {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 if bytes.len() >= 12 => (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            ),
            version => return Err(format!("unsupported NPY version {}", version)),
        };
        let data_offset = header_start + header_len;
        if bytes.len() < data_offset {
            return Err("truncated NPY header".to_string());
        }
        let header = String::from_utf8_lossy(&bytes[header_start..data_offset]).into_owned();

        // Example: {'descr': '<U3', 'fortran_order': False, 'shape': (), }
        let descr = header
            .find("'descr':")
            .and_then(|start| {
                let rest = &header[start + "'descr':".len()..];
                let open = rest.find('\'')?;
                let rest = &rest[open + 1..];
                let close = rest.find('\'')?;
                Some(rest[..close].to_string())
            })
            .ok_or_else(|| "NPY header has no descr".to_string())?;

        let shape = header
            .find("'shape': (")
            .and_then(|start| {
                let rest = &header[start + "'shape': (".len()..];
                let end = rest.find(')')?;
                Some(
                    rest[..end]
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| s.trim_end_matches('L').parse::<usize>())
                        .collect::<Result<Vec<_>, _>>(),
                )
            })
            .ok_or_else(|| "NPY header has no shape".to_string())?
            .map_err(|e| format!("bad NPY shape: {}", e))?;

        Ok(Self {
            descr,
            shape,
            data_offset,
        })
    }

    fn kind(&self) -> Option<ElementKind> {
        ElementKind::from_descr(&self.descr)
    }
}

/// Decode a one-dimensional numeric member into a vector
fn read_vec<A: ReadableElement>(bytes: &[u8]) -> Result<Vec<A>, String> {
    Array1::<A>::read_npy(bytes)
        .map(|array| array.into_raw_vec())
        .map_err(|e| e.to_string())
}

fn widen<A, B: From<A>>(values: Vec<A>) -> Vec<B> {
    values.into_iter().map(B::from).collect()
}

/// Open archive plus the path it came from, for error reporting
struct NpzArchive<R> {
    path: PathBuf,
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> NpzArchive<R> {
    fn array_error(&self, member: &str, reason: impl Into<String>) -> LoadError {
        LoadError::Array {
            path: self.path.clone(),
            member: member.to_string(),
            reason: reason.into(),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> LoadError {
        LoadError::Malformed {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    /// Raw bytes of `<name>.npy`, or `None` when the member is absent
    fn member(&mut self, name: &str) -> Result<Option<Vec<u8>>, LoadError> {
        let member = format!("{}.npy", name);
        match self.archive.by_name(&member) {
            Ok(mut file) => {
                let mut bytes = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut bytes).map_err(|source| LoadError::Io {
                    path: self.path.clone(),
                    source,
                })?;
                Ok(Some(bytes))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(source) => Err(LoadError::Archive {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn require(&mut self, name: &str) -> Result<Vec<u8>, LoadError> {
        self.member(name)?.ok_or_else(|| LoadError::MissingMember {
            path: self.path.clone(),
            member: format!("{}.npy", name),
        })
    }

    fn header(&self, name: &str, bytes: &[u8]) -> Result<NpyHeader, LoadError> {
        let header = NpyHeader::parse(bytes).map_err(|reason| self.array_error(name, reason))?;
        if header.kind().is_none() {
            return Err(self.array_error(name, format!("unsupported dtype {}", header.descr)));
        }
        Ok(header)
    }

    /// Storage layout named by `format.npy`
    fn format(&mut self) -> Result<String, LoadError> {
        let bytes = match self.member("format")? {
            Some(bytes) => bytes,
            // Older writers omit the format member; coordinates imply coo
            None if self.archive.file_names().any(|name| name == "row.npy") => {
                return Ok("coo".to_string())
            }
            None => return Err(self.malformed("no format member and no coordinate arrays")),
        };

        let header = self.header("format", &bytes)?;
        if header.shape.iter().product::<usize>() != 1 {
            return Err(self.array_error("format", "expected a single string"));
        }
        let payload = &bytes[header.data_offset..];
        let text = match header.kind() {
            Some(ElementKind::Unicode(len)) => {
                if payload.len() < len * 4 {
                    return Err(self.array_error("format", "truncated string payload"));
                }
                let big_endian = header.descr.starts_with('>');
                payload[..len * 4]
                    .chunks_exact(4)
                    .map(|unit| {
                        let unit = [unit[0], unit[1], unit[2], unit[3]];
                        if big_endian {
                            u32::from_be_bytes(unit)
                        } else {
                            u32::from_le_bytes(unit)
                        }
                    })
                    .take_while(|&code| code != 0)
                    .filter_map(char::from_u32)
                    .collect::<String>()
            }
            Some(ElementKind::Bytes(len)) => {
                if payload.len() < len {
                    return Err(self.array_error("format", "truncated string payload"));
                }
                String::from_utf8_lossy(&payload[..len])
                    .trim_end_matches('\0')
                    .to_string()
            }
            _ => {
                return Err(self.array_error(
                    "format",
                    format!("expected a string array, found dtype {}", header.descr),
                ))
            }
        };
        Ok(text)
    }

    /// Integer member widened to `i64`, whatever width numpy stored
    fn integers(&mut self, name: &str) -> Result<Vec<i64>, LoadError> {
        let bytes = self.require(name)?;
        let header = self.header(name, &bytes)?;
        let decoded: Result<Vec<i64>, String> = match header.kind() {
            Some(ElementKind::Signed(1)) => read_vec::<i8>(&bytes).map(widen),
            Some(ElementKind::Signed(2)) => read_vec::<i16>(&bytes).map(widen),
            Some(ElementKind::Signed(4)) => read_vec::<i32>(&bytes).map(widen),
            Some(ElementKind::Signed(8)) => read_vec::<i64>(&bytes),
            Some(ElementKind::Unsigned(1)) => read_vec::<u8>(&bytes).map(widen),
            Some(ElementKind::Unsigned(2)) => read_vec::<u16>(&bytes).map(widen),
            Some(ElementKind::Unsigned(4)) => read_vec::<u32>(&bytes).map(widen),
            Some(ElementKind::Unsigned(8)) => read_vec::<u64>(&bytes).and_then(|values| {
                values
                    .into_iter()
                    .map(|v| i64::try_from(v).map_err(|_| format!("index {} overflows i64", v)))
                    .collect()
            }),
            _ => Err(format!("expected an integer array, found dtype {}", header.descr)),
        };
        decoded.map_err(|reason| self.array_error(name, reason))
    }

    /// Weight member converted to `f64`
    fn weights(&mut self, name: &str) -> Result<Vec<f64>, LoadError> {
        let bytes = self.require(name)?;
        let header = self.header(name, &bytes)?;
        let decoded: Result<Vec<f64>, String> = match header.kind() {
            Some(ElementKind::Float(4)) => read_vec::<f32>(&bytes).map(widen),
            Some(ElementKind::Float(8)) => read_vec::<f64>(&bytes),
            Some(ElementKind::Signed(1)) => read_vec::<i8>(&bytes).map(widen),
            Some(ElementKind::Signed(2)) => read_vec::<i16>(&bytes).map(widen),
            Some(ElementKind::Signed(4)) => read_vec::<i32>(&bytes).map(widen),
            Some(ElementKind::Signed(8)) => {
                read_vec::<i64>(&bytes).map(|v| v.into_iter().map(|x| x as f64).collect())
            }
            Some(ElementKind::Unsigned(1)) => read_vec::<u8>(&bytes).map(widen),
            Some(ElementKind::Unsigned(2)) => read_vec::<u16>(&bytes).map(widen),
            Some(ElementKind::Unsigned(4)) => read_vec::<u32>(&bytes).map(widen),
            Some(ElementKind::Unsigned(8)) => {
                read_vec::<u64>(&bytes).map(|v| v.into_iter().map(|x| x as f64).collect())
            }
            Some(ElementKind::Bool) => read_vec::<bool>(&bytes)
                .map(|v| v.into_iter().map(|x| if x { 1.0 } else { 0.0 }).collect()),
            _ => Err(format!("expected a numeric array, found dtype {}", header.descr)),
        };
        decoded.map_err(|reason| self.array_error(name, reason))
    }

    /// `shape.npy` as two dimensions, each addressable with `u32` indices
    fn shape(&mut self) -> Result<(usize, usize), LoadError> {
        let dims = self.integers("shape")?;
        if dims.len() != 2 {
            return Err(self.malformed(format!("shape has {} dimensions, expected 2", dims.len())));
        }
        let mut shape = [0usize; 2];
        for (slot, &dim) in shape.iter_mut().zip(&dims) {
            if dim < 0 || dim > u32::MAX as i64 {
                return Err(self.malformed(format!("dimension {} out of range", dim)));
            }
            *slot = dim as usize;
        }
        Ok((shape[0], shape[1]))
    }

    fn checked_index(&self, what: &str, value: i64, bound: usize) -> Result<u32, LoadError> {
        if value < 0 || value as u64 >= bound as u64 {
            return Err(self.malformed(format!("{} index {} outside 0..{}", what, value, bound)));
        }
        Ok(value as u32)
    }

    /// csr / csc: `indptr` over the major axis, `indices` along the minor one
    fn compressed(&mut self, shape: (usize, usize), major: Major) -> Result<SparseMatrix, LoadError> {
        let data = self.weights("data")?;
        let indices = self.integers("indices")?;
        let indptr = self.integers("indptr")?;

        let (n_major, n_minor) = match major {
            Major::Row => (shape.0, shape.1),
            Major::Column => (shape.1, shape.0),
        };

        if indices.len() != data.len() {
            return Err(self.malformed(format!(
                "{} indices for {} values",
                indices.len(),
                data.len()
            )));
        }
        if indptr.len() != n_major + 1 {
            return Err(self.malformed(format!(
                "indptr has {} entries, expected {}",
                indptr.len(),
                n_major + 1
            )));
        }
        if indptr[0] != 0 || indptr.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(self.malformed("indptr is not a non-decreasing sequence from 0"));
        }
        if indptr[n_major] as usize != data.len() {
            return Err(self.malformed(format!(
                "indptr ends at {} but {} values are stored",
                indptr[n_major],
                data.len()
            )));
        }

        let mut matrix = SparseMatrix::with_capacity(shape, data.len());
        for outer in 0..n_major {
            let start = indptr[outer] as usize;
            let end = indptr[outer + 1] as usize;
            for k in start..end {
                let inner = self.checked_index("minor", indices[k], n_minor)?;
                let outer = outer as u32;
                match major {
                    Major::Row => matrix.push(outer, inner, data[k]),
                    Major::Column => matrix.push(inner, outer, data[k]),
                }
            }
        }
        Ok(matrix)
    }

    /// coo: explicit `row` / `col` arrays
    fn coordinate(&mut self, shape: (usize, usize)) -> Result<SparseMatrix, LoadError> {
        let data = self.weights("data")?;
        let rows = self.integers("row")?;
        let cols = self.integers("col")?;

        if rows.len() != data.len() || cols.len() != data.len() {
            return Err(self.malformed(format!(
                "{} rows and {} cols for {} values",
                rows.len(),
                cols.len(),
                data.len()
            )));
        }

        let mut matrix = SparseMatrix::with_capacity(shape, data.len());
        for k in 0..data.len() {
            let row = self.checked_index("row", rows[k], shape.0)?;
            let col = self.checked_index("column", cols[k], shape.1)?;
            matrix.push(row, col, data[k]);
        }
        Ok(matrix)
    }
}

/// Load a sparse matrix written by scipy's `save_npz`
pub fn load_npz<P: AsRef<Path>>(path: P) -> Result<SparseMatrix, LoadError> {
    let path = path.as_ref();
    log::info!("Reading sparse matrix: {}", path.display());

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| LoadError::Archive {
        path: path.to_path_buf(),
        source,
    })?;
    let mut npz = NpzArchive {
        path: path.to_path_buf(),
        archive,
    };

    let format = npz.format()?;
    let shape = npz.shape()?;
    log::debug!("Matrix format {} with shape {}x{}", format, shape.0, shape.1);

    let matrix = match format.as_str() {
        "csr" => npz.compressed(shape, Major::Row)?,
        "csc" => npz.compressed(shape, Major::Column)?,
        "coo" => npz.coordinate(shape)?,
        other => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: other.to_string(),
            })
        }
    };

    log::info!(
        "Loaded {}x{} matrix with {} non-zero entries",
        matrix.shape.0,
        matrix.shape.1,
        matrix.nnz()
    );

    Ok(matrix)
}

/// Serialize a 0-d unicode string the way numpy stores `np.array("csr")`
fn text_scalar_npy(text: &str) -> Vec<u8> {
    let descr = format!("<U{}", text.chars().count());
    let mut header = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': (), }}",
        descr
    );

    // Magic, version and length field plus header and newline align to 64
    let unpadded = NPY_MAGIC.len() + 2 + 2 + header.len() + 1;
    header.extend(std::iter::repeat(' ').take((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut bytes = Vec::with_capacity(NPY_MAGIC.len() + 4 + header.len() + text.len() * 4);
    bytes.extend_from_slice(NPY_MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for c in text.chars() {
        bytes.extend_from_slice(&(c as u32).to_le_bytes());
    }
    bytes
}

fn numeric_npy<A>(values: Vec<A>, path: &Path) -> Result<Vec<u8>, WriteError>
where
    A: ndarray_npy::WritableElement,
{
    let mut bytes = Vec::new();
    Array1::from(values)
        .write_npy(&mut bytes)
        .map_err(|e| WriteError::Npz {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(bytes)
}

/// Write named `.npy` members into a deflate-compressed archive
fn write_members(path: &Path, members: &[(&str, Vec<u8>)]) -> Result<(), WriteError> {
    let npz_error = |e: ZipError| WriteError::Npz {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let io_error = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in members {
        zip.start_file(format!("{}.npy", name), options)
            .map_err(npz_error)?;
        zip.write_all(bytes).map_err(io_error)?;
    }

    let mut writer = zip.finish().map_err(npz_error)?;
    writer.flush().map_err(io_error)?;
    Ok(())
}

/// Save a matrix in scipy's compressed CSR `.npz` layout
pub fn save_npz<P: AsRef<Path>>(matrix: &SparseMatrix, path: P) -> Result<(), WriteError> {
    let path = path.as_ref();
    log::info!("Saving {} entries to {}", matrix.nnz(), path.display());

    let nnz = matrix.nnz();
    if matrix.rows.len() != nnz || matrix.cols.len() != nnz {
        return Err(WriteError::Npz {
            path: path.to_path_buf(),
            reason: format!(
                "{} rows and {} cols for {} values",
                matrix.rows.len(),
                matrix.cols.len(),
                nnz
            ),
        });
    }
    if let Some((row, col, _)) = matrix
        .entries()
        .find(|&(row, col, _)| row as usize >= matrix.shape.0 || col as usize >= matrix.shape.1)
    {
        return Err(WriteError::Npz {
            path: path.to_path_buf(),
            reason: format!(
                "entry ({}, {}) outside a {}x{} matrix",
                row, col, matrix.shape.0, matrix.shape.1
            ),
        });
    }

    // Stable sort keeps the relative order of duplicate coordinates
    let mut order: Vec<usize> = (0..matrix.nnz()).collect();
    order.sort_by_key(|&k| (matrix.rows[k], matrix.cols[k]));

    let mut indptr = vec![0i64; matrix.shape.0 + 1];
    for &row in &matrix.rows {
        indptr[row as usize + 1] += 1;
    }
    for row in 0..matrix.shape.0 {
        indptr[row + 1] += indptr[row];
    }

    let indices: Vec<i64> = order.iter().map(|&k| matrix.cols[k] as i64).collect();
    let data: Vec<f64> = order.iter().map(|&k| matrix.values[k]).collect();
    let shape = vec![matrix.shape.0 as i64, matrix.shape.1 as i64];

    let members = [
        ("indices", numeric_npy(indices, path)?),
        ("indptr", numeric_npy(indptr, path)?),
        ("format", text_scalar_npy("csr")),
        ("shape", numeric_npy(shape, path)?),
        ("data", numeric_npy(data, path)?),
    ];
    write_members(path, &members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// `np.array(b"coo")`: a 0-d byte-string member
    fn bytes_scalar_npy(text: &str) -> Vec<u8> {
        let mut bytes = text_scalar_npy(text);
        let header = NpyHeader::parse(&bytes).unwrap();
        let descr = format!("<U{}", text.len());
        let descr_at = bytes
            .windows(descr.len())
            .position(|w| w == descr.as_bytes())
            .unwrap();
        bytes[descr_at] = b'|';
        bytes[descr_at + 1] = b'S';
        bytes.truncate(header.data_offset);
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    /// Re-encode a v1 `.npy` member with the 4-byte length field of v2
    fn as_version_2(bytes: &[u8]) -> Vec<u8> {
        let header = NpyHeader::parse(bytes).unwrap();
        let text = &bytes[10..header.data_offset];
        let mut out = Vec::with_capacity(bytes.len() + 2);
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[2, 0]);
        out.extend_from_slice(&(text.len() as u32).to_le_bytes());
        out.extend_from_slice(text);
        out.extend_from_slice(&bytes[header.data_offset..]);
        out
    }

    /// `np.array("csr", dtype=">U3")`: big-endian UTF-32 payload
    fn big_endian_text_npy(text: &str) -> Vec<u8> {
        let mut bytes = text_scalar_npy(text);
        let header = NpyHeader::parse(&bytes).unwrap();
        let descr_at = bytes.windows(2).position(|w| w == b"<U").unwrap();
        bytes[descr_at] = b'>';
        bytes.truncate(header.data_offset);
        for c in text.chars() {
            bytes.extend_from_slice(&(c as u32).to_be_bytes());
        }
        bytes
    }

    fn npy<A: ndarray_npy::WritableElement>(values: Vec<A>) -> Vec<u8> {
        numeric_npy(values, Path::new("test.npz")).unwrap()
    }

    #[test]
    fn header_of_text_scalar_is_aligned_and_parsed() {
        let bytes = text_scalar_npy("csr");
        let header = NpyHeader::parse(&bytes).unwrap();
        assert_eq!(header.descr, "<U3");
        assert!(header.shape.is_empty());
        assert_eq!(header.data_offset % 64, 0);
        assert_eq!(bytes.len(), header.data_offset + 12);
    }

    #[test]
    fn element_kinds_from_descr() {
        assert_eq!(ElementKind::from_descr("<i4"), Some(ElementKind::Signed(4)));
        assert_eq!(ElementKind::from_descr("<f8"), Some(ElementKind::Float(8)));
        assert_eq!(ElementKind::from_descr("|u1"), Some(ElementKind::Unsigned(1)));
        assert_eq!(ElementKind::from_descr("|b1"), Some(ElementKind::Bool));
        assert_eq!(ElementKind::from_descr("|S3"), Some(ElementKind::Bytes(3)));
        assert_eq!(ElementKind::from_descr("<c16"), None);
    }

    #[test]
    fn save_then_load_keeps_entries_in_row_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("matrix.npz");
        let matrix = SparseMatrix::from_triplets(
            (4, 4),
            vec![(2, 1, 9.0), (0, 1, 8.0), (1, 2, 9.0), (1, 0, 8.0), (3, 3, 1.5)],
        );

        save_npz(&matrix, &path).unwrap();
        let loaded = load_npz(&path).unwrap();

        assert_eq!(loaded.shape, (4, 4));
        assert_eq!(loaded.rows, vec![0, 1, 1, 2, 3]);
        assert_eq!(loaded.cols, vec![1, 0, 2, 1, 3]);
        assert_eq!(loaded.values, vec![8.0, 8.0, 9.0, 9.0, 1.5]);
    }

    #[test]
    fn loads_csr_with_int32_indices_and_explicit_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("int32.npz");
        write_members(
            &path,
            &[
                ("format", text_scalar_npy("csr")),
                ("shape", npy(vec![3i64, 3])),
                ("indptr", npy(vec![0i32, 2, 2, 3])),
                ("indices", npy(vec![1i32, 2, 0])),
                ("data", npy(vec![4i64, 0, 6])),
            ],
        )
        .unwrap();

        let loaded = load_npz(&path).unwrap();
        assert_eq!(loaded.rows, vec![0, 2]);
        assert_eq!(loaded.cols, vec![1, 0]);
        assert_eq!(loaded.values, vec![4.0, 6.0]);
    }

    #[test]
    fn loads_csc_as_column_major_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("csc.npz");
        write_members(
            &path,
            &[
                ("format", text_scalar_npy("csc")),
                ("shape", npy(vec![2i64, 3])),
                ("indptr", npy(vec![0i32, 1, 1, 3])),
                ("indices", npy(vec![1i32, 0, 1])),
                ("data", npy(vec![1.0f32, 2.0, 3.0])),
            ],
        )
        .unwrap();

        let loaded = load_npz(&path).unwrap();
        assert_eq!(loaded.shape, (2, 3));
        assert_eq!(loaded.rows, vec![1, 0, 1]);
        assert_eq!(loaded.cols, vec![0, 2, 2]);
        assert_eq!(loaded.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn loads_coo_with_byte_string_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("coo.npz");
        write_members(
            &path,
            &[
                ("format", bytes_scalar_npy("coo")),
                ("shape", npy(vec![3i64, 3])),
                ("row", npy(vec![2i32, 0])),
                ("col", npy(vec![0i32, 2])),
                ("data", npy(vec![5.0f64, 5.0])),
            ],
        )
        .unwrap();

        let loaded = load_npz(&path).unwrap();
        assert_eq!(loaded.rows, vec![2, 0]);
        assert_eq!(loaded.cols, vec![0, 2]);
    }

    #[test]
    fn loads_version_2_headers() {
        let bytes = as_version_2(&text_scalar_npy("csr"));
        let header = NpyHeader::parse(&bytes).unwrap();
        assert_eq!(header.descr, "<U3");
        assert_eq!(header.data_offset, bytes.len() - 12);

        let dir = tempdir().unwrap();
        let path = dir.path().join("v2.npz");
        write_members(
            &path,
            &[
                ("format", bytes),
                ("shape", npy(vec![2i64, 2])),
                ("indptr", npy(vec![0i32, 1, 1])),
                ("indices", npy(vec![1i32])),
                ("data", npy(vec![3.0f64])),
            ],
        )
        .unwrap();

        let loaded = load_npz(&path).unwrap();
        assert_eq!(loaded.shape, (2, 2));
        assert_eq!(loaded.rows, vec![0]);
        assert_eq!(loaded.cols, vec![1]);
        assert_eq!(loaded.values, vec![3.0]);
    }

    #[test]
    fn loads_big_endian_format_string() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big_endian.npz");
        write_members(
            &path,
            &[
                ("format", big_endian_text_npy("csc")),
                ("shape", npy(vec![2i64, 2])),
                ("indptr", npy(vec![0i32, 1, 1])),
                ("indices", npy(vec![1i32])),
                ("data", npy(vec![4.0f64])),
            ],
        )
        .unwrap();

        let loaded = load_npz(&path).unwrap();
        assert_eq!(loaded.rows, vec![1]);
        assert_eq!(loaded.cols, vec![0]);
    }

    #[test]
    fn save_rejects_entries_outside_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.npz");
        let matrix = SparseMatrix {
            shape: (2, 2),
            rows: vec![0, 5],
            cols: vec![1, 0],
            values: vec![1.0, 2.0],
        };

        let err = save_npz(&matrix, &path).unwrap_err();
        assert!(matches!(err, WriteError::Npz { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_npz(dir.path().join("absent.npz")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn non_archive_is_archive_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.npz");
        std::fs::write(&path, b"definitely not a zip file").unwrap();
        let err = load_npz(&path).unwrap_err();
        assert!(matches!(err, LoadError::Archive { .. }));
    }

    #[test]
    fn missing_member_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.npz");
        write_members(
            &path,
            &[
                ("format", text_scalar_npy("csr")),
                ("shape", npy(vec![2i64, 2])),
                ("data", npy(vec![1.0f64])),
            ],
        )
        .unwrap();

        let err = load_npz(&path).unwrap_err();
        assert!(matches!(err, LoadError::MissingMember { ref member, .. } if member == "indices.npy"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bsr.npz");
        write_members(
            &path,
            &[
                ("format", text_scalar_npy("bsr")),
                ("shape", npy(vec![2i64, 2])),
            ],
        )
        .unwrap();

        let err = load_npz(&path).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { ref format, .. } if format == "bsr"));
    }

    #[test]
    fn out_of_bounds_index_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("oob.npz");
        write_members(
            &path,
            &[
                ("format", text_scalar_npy("csr")),
                ("shape", npy(vec![2i64, 2])),
                ("indptr", npy(vec![0i32, 1, 1])),
                ("indices", npy(vec![5i32])),
                ("data", npy(vec![1.0f64])),
            ],
        )
        .unwrap();

        let err = load_npz(&path).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn decreasing_indptr_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indptr.npz");
        write_members(
            &path,
            &[
                ("format", text_scalar_npy("csr")),
                ("shape", npy(vec![2i64, 2])),
                ("indptr", npy(vec![0i32, 2, 1])),
                ("indices", npy(vec![0i32])),
                ("data", npy(vec![1.0f64])),
            ],
        )
        .unwrap();

        let err = load_npz(&path).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }
}

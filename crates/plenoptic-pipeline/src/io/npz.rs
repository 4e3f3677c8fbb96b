//! Minimal `.npy` / `.npz` support for 2-D little-endian `f64` arrays.
//!
//! Arrays are written as NPY format 1.0 inside an uncompressed zip archive,
//! which is what `numpy.savez` produces and `numpy.load` reads.

use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::json::write_atomic;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGN: usize = 64;

/// Row-major 2-D `f64` array.
#[derive(Debug, Clone, PartialEq)]
pub struct Array2 {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Array2 {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        ensure!(
            data.len() == rows * cols,
            "array data has {} values, expected {rows}x{cols}",
            data.len()
        );
        Ok(Self { rows, cols, data })
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
}

fn npy_header(rows: usize, cols: usize) -> Vec<u8> {
    let dict = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    // magic(6) + version(2) + header_len(2) + dict + padding + '\n'
    let unpadded = NPY_MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    let mut header = dict.into_bytes();
    header.extend(std::iter::repeat_n(b' ', padding));
    header.push(b'\n');
    header
}

/// Encode an array as NPY 1.0 bytes.
pub fn encode_npy(array: &Array2) -> Result<Vec<u8>> {
    let header = npy_header(array.rows, array.cols);
    let header_len = u16::try_from(header.len()).context("npy header too long")?;

    let mut out = Vec::with_capacity(NPY_MAGIC.len() + 4 + header.len() + array.data.len() * 8);
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.write_u16::<LittleEndian>(header_len)?;
    out.extend_from_slice(&header);
    for &v in &array.data {
        out.write_f64::<LittleEndian>(v)?;
    }
    Ok(out)
}

/// Decode NPY 1.0 bytes holding a C-ordered 2-D `<f8` array.
pub fn decode_npy(bytes: &[u8]) -> Result<Array2> {
    let mut cursor = Cursor::new(bytes);
    let mut magic = [0u8; 6];
    cursor.read_exact(&mut magic).context("truncated npy magic")?;
    ensure!(magic == NPY_MAGIC, "not an npy file");
    let major = cursor.read_u8()?;
    let _minor = cursor.read_u8()?;
    ensure!(major == 1, "unsupported npy version {major}");
    let header_len = cursor.read_u16::<LittleEndian>()? as usize;
    let mut header = vec![0u8; header_len];
    cursor.read_exact(&mut header).context("truncated npy header")?;
    let header = String::from_utf8(header).context("npy header is not UTF-8")?;

    ensure!(header.contains("'descr': '<f8'"), "unsupported dtype in {header}");
    ensure!(
        header.contains("'fortran_order': False"),
        "fortran-ordered arrays are not supported"
    );
    let (rows, cols) = parse_shape(&header)?;

    let mut data = Vec::with_capacity(rows * cols);
    for _ in 0..rows * cols {
        data.push(
            cursor
                .read_f64::<LittleEndian>()
                .context("truncated npy data")?,
        );
    }
    Array2::new(rows, cols, data)
}

fn parse_shape(header: &str) -> Result<(usize, usize)> {
    let start = header
        .find("'shape': (")
        .context("npy header has no shape")?
        + "'shape': (".len();
    let end = header[start..]
        .find(')')
        .context("unterminated npy shape")?
        + start;
    let dims = header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().with_context(|| format!("bad npy dim '{s}'")))
        .collect::<Result<Vec<_>>>()?;
    match dims.as_slice() {
        [rows, cols] => Ok((*rows, *cols)),
        _ => bail!("expected a 2-D array, found shape {dims:?}"),
    }
}

/// Write named arrays into an uncompressed `.npz` archive (atomically).
pub fn write_npz(path: &Path, arrays: &[(&str, &Array2)]) -> Result<()> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, array) in arrays {
        zip.start_file(format!("{name}.npy"), options)
            .with_context(|| format!("failed to add {name}.npy to archive"))?;
        zip.write_all(&encode_npy(array)?)?;
    }
    let bytes = zip.finish().context("failed to finish npz archive")?.into_inner();
    write_atomic(path, &bytes)
}

/// Read one named array from an `.npz` archive.
pub fn read_npz_array(path: &Path, name: &str) -> Result<Array2> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("failed to read {}", path.display()))?;
    let mut entry = archive
        .by_name(&format!("{name}.npy"))
        .with_context(|| format!("array '{name}' not found in {}", path.display()))?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    decode_npy(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_aligned_and_newline_terminated() {
        for (rows, cols) in [(0, 7), (3, 7), (150_000, 7), (1, 1)] {
            let header = npy_header(rows, cols);
            assert_eq!((10 + header.len()) % NPY_ALIGN, 0);
            assert_eq!(header.last(), Some(&b'\n'));
        }
    }

    #[test]
    fn npy_bytes_match_numpy_layout() -> Result<()> {
        let a = Array2::new(1, 2, vec![1.0, -0.5])?;
        let bytes = encode_npy(&a)?;
        assert_eq!(&bytes[..8], b"\x93NUMPY\x01\x00");
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        let text = std::str::from_utf8(&bytes[10..10 + header_len])?;
        assert!(text.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (1, 2), }"));
        assert_eq!(&bytes[10 + header_len..], &[1.0f64.to_le_bytes(), (-0.5f64).to_le_bytes()].concat()[..]);
        assert_eq!(decode_npy(&bytes)?, a);
        Ok(())
    }

    #[test]
    fn npz_archive_holds_named_array() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("init_pt_cld.npz");
        let a = Array2::new(2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])?;
        write_npz(&path, &[("data", &a)])?;

        let back = read_npz_array(&path, "data")?;
        assert_eq!(back, a);
        assert_eq!(back.row(1), &[3.0, 4.0, 5.0]);
        assert!(read_npz_array(&path, "missing").is_err());
        Ok(())
    }

    #[test]
    fn rejects_mismatched_data_length() {
        assert!(Array2::new(2, 2, vec![0.0; 3]).is_err());
    }
}

//! RAW (headerless brick-of-data) volume import.
//!
//! A RAW file is nothing but `nx * ny * nz` native-endian samples, X
//! fastest. The sample type and dimensions come from the caller.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use voxbrick_math::IVec3;

use crate::grid::{voxel_count, DenseGrid, GridError};

/// Samples decoded per read call.
const CHUNK_SAMPLES: usize = 1 << 20;

/// Errors that can occur during RAW loading.
#[derive(Error, Debug)]
pub enum RawError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Read incomplete data: expected {expected} bytes, file holds {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Unsupported voxel type: {0}")]
    UnsupportedType(String),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
}

pub type RawResult<T> = Result<T, RawError>;

/// Sample type of a RAW file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelType {
    UChar,
    UShort,
    Float,
    Double,
}

impl VoxelType {
    pub fn size_in_bytes(self) -> usize {
        match self {
            VoxelType::UChar => 1,
            VoxelType::UShort => 2,
            VoxelType::Float => 4,
            VoxelType::Double => 8,
        }
    }

    /// Decode packed samples of this type, appending them to `out` as `f32`.
    fn decode_into(self, bytes: &[u8], out: &mut Vec<f32>) {
        match self {
            VoxelType::UChar => out.extend(bytes.iter().map(|&b| b as f32)),
            VoxelType::UShort => out.extend(
                bytes
                    .chunks_exact(2)
                    .map(|c| bytemuck::pod_read_unaligned::<u16>(c) as f32),
            ),
            VoxelType::Float => out.extend(
                bytes
                    .chunks_exact(4)
                    .map(bytemuck::pod_read_unaligned::<f32>),
            ),
            VoxelType::Double => out.extend(
                bytes
                    .chunks_exact(8)
                    .map(|c| bytemuck::pod_read_unaligned::<f64>(c) as f32),
            ),
        }
    }
}

impl FromStr for VoxelType {
    type Err = RawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "byte" | "uchar" | "uint8" => Ok(VoxelType::UChar),
            "ushort" | "uint16" => Ok(VoxelType::UShort),
            "float" | "float32" => Ok(VoxelType::Float),
            "double" | "float64" => Ok(VoxelType::Double),
            other => Err(RawError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for VoxelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoxelType::UChar => "uchar",
            VoxelType::UShort => "ushort",
            VoxelType::Float => "float",
            VoxelType::Double => "double",
        };
        write!(f, "{}", name)
    }
}

/// Load a RAW volume of `dims` samples of `voxel_type`, converted to `f32`.
///
/// The file is read in fixed-size chunks. Extra bytes past the last
/// sample are ignored with a warning; a short file is an error.
pub fn load_raw<P: AsRef<Path>>(path: P, voxel_type: VoxelType, dims: IVec3) -> RawResult<DenseGrid> {
    let path = path.as_ref();
    if dims.min_element() <= 0 {
        return Err(GridError::InvalidDims(dims).into());
    }

    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let num = voxel_count(dims);
    let sample_size = voxel_type.size_in_bytes();
    let expected = (num * sample_size) as u64;

    if file_len < expected {
        return Err(RawError::SizeMismatch {
            expected,
            actual: file_len,
        });
    }
    if file_len > expected {
        log::warn!(
            "{}: ignoring {} trailing bytes",
            path.display(),
            file_len - expected
        );
    }

    let mut reader = BufReader::new(file);
    let mut voxels = Vec::with_capacity(num);
    let mut buf = vec![0u8; CHUNK_SAMPLES.min(num) * sample_size];
    let mut remaining = num;

    while remaining > 0 {
        let count = remaining.min(CHUNK_SAMPLES);
        let chunk = &mut buf[..count * sample_size];
        reader.read_exact(chunk)?;
        voxel_type.decode_into(chunk, &mut voxels);
        remaining -= count;
    }

    log::info!(
        "Loaded RAW volume {} ({} {}, {:.1} MB)",
        path.display(),
        dims,
        voxel_type,
        expected as f64 / (1024.0 * 1024.0)
    );

    Ok(DenseGrid::new(dims, voxels)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_voxel_type_parsing() {
        assert_eq!("float".parse::<VoxelType>().unwrap(), VoxelType::Float);
        assert_eq!("float64".parse::<VoxelType>().unwrap(), VoxelType::Double);
        assert_eq!("uint8".parse::<VoxelType>().unwrap(), VoxelType::UChar);
        assert_eq!("byte".parse::<VoxelType>().unwrap(), VoxelType::UChar);
        assert_eq!("USHORT".parse::<VoxelType>().unwrap(), VoxelType::UShort);
        assert!(matches!(
            "int128".parse::<VoxelType>(),
            Err(RawError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_load_float_raw() {
        let values: Vec<f32> = (0..8).map(|i| i as f32 * 0.5).collect();
        let file = write_file(bytemuck::cast_slice(&values));

        let grid = load_raw(file.path(), VoxelType::Float, IVec3::splat(2)).unwrap();
        assert_eq!(grid.dims(), IVec3::splat(2));
        assert_eq!(grid.voxels(), values.as_slice());
        assert_eq!(grid.get(IVec3::new(1, 1, 1)), 3.5);
    }

    #[test]
    fn test_load_converts_to_float() {
        let file = write_file(&[0, 1, 2, 255]);
        let grid = load_raw(file.path(), VoxelType::UChar, IVec3::new(4, 1, 1)).unwrap();
        assert_eq!(grid.voxels(), &[0.0, 1.0, 2.0, 255.0]);

        let doubles = [1.5f64, -2.0];
        let file = write_file(bytemuck::cast_slice(&doubles));
        let grid = load_raw(file.path(), VoxelType::Double, IVec3::new(1, 2, 1)).unwrap();
        assert_eq!(grid.voxels(), &[1.5, -2.0]);

        let shorts = [7u16, 65535];
        let file = write_file(bytemuck::cast_slice(&shorts));
        let grid = load_raw(file.path(), VoxelType::UShort, IVec3::new(2, 1, 1)).unwrap();
        assert_eq!(grid.voxels(), &[7.0, 65535.0]);
    }

    #[test]
    fn test_load_short_file_fails() {
        let file = write_file(&[0u8; 12]);
        let err = load_raw(file.path(), VoxelType::Float, IVec3::splat(2)).unwrap_err();
        assert!(matches!(
            err,
            RawError::SizeMismatch {
                expected: 32,
                actual: 12
            }
        ));
    }

    #[test]
    fn test_load_ignores_trailing_bytes() {
        let file = write_file(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let grid = load_raw(file.path(), VoxelType::UChar, IVec3::splat(2)).unwrap();
        assert_eq!(grid.len(), 8);
        assert_eq!(grid.get(IVec3::new(1, 1, 1)), 8.0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_raw("/nonexistent/volume.raw", VoxelType::Float, IVec3::ONE).unwrap_err();
        assert!(matches!(err, RawError::Io(_)));
    }
}

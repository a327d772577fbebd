//! Binary export of brick hierarchies.
//!
//! A hierarchy is written as three files sharing one base name:
//!
//! - `<base>.info`: brick metadata. A `u64` brick count followed by that
//!   many [`Box3i`] records, a `u64` count of `i32` refinement levels,
//!   then a `u64` count of `f32` cell widths.
//! - `<base>.data`: every brick's payload, concatenated as `f32` in the
//!   same order as the `.info` records.
//! - `<base>.osp`: a small XML sidecar naming the files and brick size.
//!
//! All numbers are native-endian. There is no magic number or version.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use voxbrick_math::Box3i;

use crate::amr::AmrVolume;

/// Value range written to the `.osp` sidecar.
const CLAMP_RANGE: (u32, u32) = (0, 100_000);

/// Errors that can occur while writing or reading AMR files.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is truncated: needed {expected} bytes, found {actual}")]
    Truncated {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("Inconsistent AMR files: {0}")]
    Inconsistent(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// `<base><ext>`, keeping any dots already in the base name.
fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(ext);
    PathBuf::from(name)
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.to_path_buf();
    move |source| ExportError::Io { path, source }
}

/// Write `volume` as `<base>.info`, `<base>.data` and `<base>.osp`.
pub fn write_amr<P: AsRef<Path>>(base: P, volume: &AmrVolume) -> ExportResult<()> {
    let base = base.as_ref();
    if volume.refinement_levels.len() != volume.len() || volume.brick_data.len() != volume.len() {
        return Err(ExportError::Inconsistent(format!(
            "{} bounds, {} levels, {} payloads",
            volume.len(),
            volume.refinement_levels.len(),
            volume.brick_data.len()
        )));
    }

    let info_path = with_suffix(base, ".info");
    let data_path = with_suffix(base, ".data");
    let osp_path = with_suffix(base, ".osp");

    let info_file = File::create(&info_path).map_err(io_err(&info_path))?;
    let data_file = File::create(&data_path).map_err(io_err(&data_path))?;

    write_info(BufWriter::new(info_file), volume).map_err(io_err(&info_path))?;

    let mut data = BufWriter::new(data_file);
    for brick in &volume.brick_data {
        data.write_all(bytemuck::cast_slice(brick))
            .map_err(io_err(&data_path))?;
    }
    data.flush().map_err(io_err(&data_path))?;

    let file_name = base
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    std::fs::write(&osp_path, osp_sidecar(&file_name, volume.block_size))
        .map_err(io_err(&osp_path))?;

    log::info!(
        "Wrote {} bricks ({} levels) to {}.{{info,data,osp}}",
        volume.len(),
        volume.num_levels(),
        base.display()
    );

    Ok(())
}

fn write_info<W: Write>(mut out: W, volume: &AmrVolume) -> std::io::Result<()> {
    out.write_all(bytemuck::bytes_of(&(volume.block_bounds.len() as u64)))?;
    out.write_all(bytemuck::cast_slice(&volume.block_bounds))?;
    out.write_all(bytemuck::bytes_of(&(volume.refinement_levels.len() as u64)))?;
    out.write_all(bytemuck::cast_slice(&volume.refinement_levels))?;
    out.write_all(bytemuck::bytes_of(&(volume.cell_widths.len() as u64)))?;
    out.write_all(bytemuck::cast_slice(&volume.cell_widths))?;
    out.flush()
}

fn osp_sidecar(file_name: &str, block_size: u32) -> String {
    format!(
        "<?xml?>\n<AMRVolume>\n  <fileName>{}</fileName>\n  <brickSize>{}</brickSize>\n  <clamp>{} {}</clamp>\n</AMRVolume>\n",
        file_name, block_size, CLAMP_RANGE.0, CLAMP_RANGE.1
    )
}

/// Read `<brickSize>` back out of a sidecar.
fn parse_osp_brick_size(text: &str) -> Option<u32> {
    let start = text.find("<brickSize>")? + "<brickSize>".len();
    let end = start + text[start..].find("</brickSize>")?;
    text[start..end].trim().parse().ok()
}

/// Cursor over the `.info` byte stream.
struct InfoReader<'a> {
    path: &'a Path,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> InfoReader<'a> {
    fn take(&mut self, len: usize) -> ExportResult<&'a [u8]> {
        let end = match self.pos.checked_add(len) {
            Some(end) if end <= self.bytes.len() => end,
            end => {
                return Err(ExportError::Truncated {
                    path: self.path.to_path_buf(),
                    expected: end.unwrap_or(usize::MAX),
                    actual: self.bytes.len(),
                })
            }
        };
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_count(&mut self) -> ExportResult<usize> {
        let raw = self.take(std::mem::size_of::<u64>())?;
        Ok(bytemuck::pod_read_unaligned::<u64>(raw) as usize)
    }

    fn read_array<T: bytemuck::Pod>(&mut self) -> ExportResult<Vec<T>> {
        let count = self.read_count()?;
        let size = std::mem::size_of::<T>();
        let raw = self.take(count.saturating_mul(size))?;
        Ok(raw.chunks_exact(size).map(bytemuck::pod_read_unaligned).collect())
    }
}

/// Read a hierarchy written by [`write_amr`].
///
/// The brick size is recovered from the `.data` length and cross-checked
/// against the `.osp` sidecar when one is present.
pub fn read_amr<P: AsRef<Path>>(base: P) -> ExportResult<AmrVolume> {
    let base = base.as_ref();
    let info_path = with_suffix(base, ".info");
    let data_path = with_suffix(base, ".data");
    let osp_path = with_suffix(base, ".osp");

    let info_bytes = std::fs::read(&info_path).map_err(io_err(&info_path))?;
    let mut info = InfoReader {
        path: &info_path,
        bytes: &info_bytes,
        pos: 0,
    };
    let block_bounds: Vec<Box3i> = info.read_array()?;
    let refinement_levels: Vec<i32> = info.read_array()?;
    let cell_widths: Vec<f32> = info.read_array()?;

    let num_bricks = block_bounds.len();
    if refinement_levels.len() != num_bricks {
        return Err(ExportError::Inconsistent(format!(
            "{} bricks but {} refinement levels",
            num_bricks,
            refinement_levels.len()
        )));
    }
    if let Some(&bad) = refinement_levels
        .iter()
        .find(|&&l| l < 0 || l as usize >= cell_widths.len())
    {
        return Err(ExportError::Inconsistent(format!(
            "refinement level {} has no cell width ({} levels)",
            bad,
            cell_widths.len()
        )));
    }

    let data_bytes = std::fs::read(&data_path).map_err(io_err(&data_path))?;
    let num_floats = data_bytes.len() / std::mem::size_of::<f32>();
    let osp_brick_size = std::fs::read_to_string(&osp_path)
        .ok()
        .and_then(|text| parse_osp_brick_size(&text));

    let block_size = if num_bricks == 0 {
        osp_brick_size.unwrap_or(0)
    } else {
        let per_brick = num_floats / num_bricks;
        let edge = (per_brick as f64).cbrt().round() as usize;
        if per_brick * num_bricks * 4 != data_bytes.len() || edge.pow(3) != per_brick {
            return Err(ExportError::Inconsistent(format!(
                "{} holds {} bytes, not a whole number of cubic bricks for {} bricks",
                data_path.display(),
                data_bytes.len(),
                num_bricks
            )));
        }
        edge as u32
    };
    if let Some(osp) = osp_brick_size {
        if osp != block_size {
            return Err(ExportError::Inconsistent(format!(
                "sidecar brick size {} but data implies {}",
                osp, block_size
            )));
        }
    }

    let per_brick = (block_size as usize).pow(3);
    let brick_data = if per_brick == 0 {
        Vec::new()
    } else {
        data_bytes
            .chunks_exact(per_brick * 4)
            .map(|brick| {
                brick
                    .chunks_exact(4)
                    .map(bytemuck::pod_read_unaligned::<f32>)
                    .collect()
            })
            .collect()
    };

    log::debug!(
        "Read {} bricks of size {} from {}",
        num_bricks,
        block_size,
        base.display()
    );

    Ok(AmrVolume {
        block_bounds,
        refinement_levels,
        cell_widths,
        brick_data,
        block_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amr::make_amr;
    use crate::config::AmrConfig;
    use crate::grid::DenseGrid;
    use voxbrick_math::IVec3;

    fn spike_volume() -> AmrVolume {
        let mut grid = DenseGrid::filled(IVec3::splat(32), 0.0).unwrap();
        grid.set(IVec3::splat(16), 100.0);
        make_amr(&grid, &AmrConfig::new(2, 8, 2, 1.0)).unwrap()
    }

    #[test]
    fn test_info_layout() {
        let mut volume = AmrVolume::new(2, vec![1.0, 0.5]);
        volume.push(
            Box3i::new(IVec3::new(2, 0, 0), IVec3::new(3, 1, 1)),
            1,
            vec![0.0; 8],
        );

        let mut bytes = Vec::new();
        write_info(&mut bytes, &volume).unwrap();

        // count + box + count + level + count + 2 widths
        assert_eq!(bytes.len(), 8 + 24 + 8 + 4 + 8 + 8);
        assert_eq!(bytemuck::pod_read_unaligned::<u64>(&bytes[0..8]), 1);
        assert_eq!(bytemuck::pod_read_unaligned::<i32>(&bytes[8..12]), 2);
        assert_eq!(bytemuck::pod_read_unaligned::<i32>(&bytes[20..24]), 3);
        assert_eq!(bytemuck::pod_read_unaligned::<u64>(&bytes[32..40]), 1);
        assert_eq!(bytemuck::pod_read_unaligned::<i32>(&bytes[40..44]), 1);
        assert_eq!(bytemuck::pod_read_unaligned::<u64>(&bytes[44..52]), 2);
        assert_eq!(bytemuck::pod_read_unaligned::<f32>(&bytes[56..60]), 0.5);
    }

    #[test]
    fn test_write_creates_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("spike.v1");
        let volume = spike_volume();

        write_amr(&base, &volume).unwrap();

        let data_len = std::fs::metadata(dir.path().join("spike.v1.data")).unwrap().len();
        assert_eq!(data_len as usize, volume.len() * 512 * 4);
        assert!(dir.path().join("spike.v1.info").exists());

        let osp = std::fs::read_to_string(dir.path().join("spike.v1.osp")).unwrap();
        assert!(osp.contains("<fileName>spike.v1</fileName>"));
        assert!(osp.contains("<brickSize>8</brickSize>"));
        assert!(osp.contains("<clamp>0 100000</clamp>"));
    }

    #[test]
    fn test_read_back_written_volume() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("spike");
        let volume = spike_volume();

        write_amr(&base, &volume).unwrap();
        let loaded = read_amr(&base).unwrap();

        assert_eq!(loaded, volume);
    }

    #[test]
    fn test_read_rejects_truncated_info() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("broken");
        write_amr(&base, &spike_volume()).unwrap();

        let info_path = dir.path().join("broken.info");
        let bytes = std::fs::read(&info_path).unwrap();
        std::fs::write(&info_path, &bytes[..bytes.len() - 3]).unwrap();

        assert!(matches!(
            read_amr(&base),
            Err(ExportError::Truncated { .. })
        ));
    }

    #[test]
    fn test_read_rejects_corrupt_brick_count() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("corrupt");
        write_amr(&base, &spike_volume()).unwrap();

        std::fs::write(dir.path().join("corrupt.info"), bytemuck::bytes_of(&u64::MAX)).unwrap();

        assert!(matches!(
            read_amr(&base),
            Err(ExportError::Truncated { .. })
        ));
    }

    #[test]
    fn test_read_rejects_mismatched_data() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("broken");
        write_amr(&base, &spike_volume()).unwrap();

        let data_path = dir.path().join("broken.data");
        let bytes = std::fs::read(&data_path).unwrap();
        std::fs::write(&data_path, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(
            read_amr(&base),
            Err(ExportError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let err = write_amr("/nonexistent/dir/out", &spike_volume()).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_parse_osp_brick_size() {
        assert_eq!(parse_osp_brick_size(&osp_sidecar("a", 16)), Some(16));
        assert_eq!(parse_osp_brick_size("<AMRVolume/>"), None);
    }
}

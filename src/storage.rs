// SPDX-License-Identifier: MPL-2.0

//! Snapshot naming and PNG export

use crate::constants::snapshot;
use crate::errors::SnapshotError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Hands out `Image1.png`, `Image2.png`, ... inside one directory.
///
/// A name is reserved while its file is being written. The counter only moves
/// on once the write is confirmed, so a failed save reuses the name.
#[derive(Debug, Clone)]
pub struct SnapshotNamer {
    directory: PathBuf,
    next: u32,
    pending: bool,
}

impl SnapshotNamer {
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            next: snapshot::FIRST_INDEX,
            pending: false,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Later snapshots go to `directory`. The counter is kept.
    pub fn set_directory(&mut self, directory: PathBuf) {
        self.directory = directory;
    }

    /// File name the next snapshot will get
    pub fn next_file_name(&self) -> String {
        format!(
            "{}{}.{}",
            snapshot::FILE_PREFIX,
            self.next,
            snapshot::FILE_EXTENSION
        )
    }

    /// Whether a reserved snapshot has not been finished yet
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Reserve the path for the next snapshot.
    ///
    /// Returns `None` while an earlier snapshot is still pending.
    pub fn reserve(&mut self) -> Option<PathBuf> {
        if self.pending {
            return None;
        }
        self.pending = true;
        Some(self.directory.join(self.next_file_name()))
    }

    /// Release the reservation, advancing the counter if the file was written.
    pub fn finish(&mut self, written: bool) {
        if self.pending && written {
            self.next += 1;
        }
        self.pending = false;
    }
}

/// Drop the per-row padding of a buffer laid out with `row_pitch` bytes per row.
pub fn unpad_rows(
    data: &[u8],
    width: u32,
    height: u32,
    row_pitch: u32,
) -> Result<Vec<u8>, SnapshotError> {
    let row_bytes = width as usize * 4;
    let row_pitch = row_pitch as usize;
    let needed = row_pitch * (height as usize).saturating_sub(1) + row_bytes;
    if height > 0 && data.len() < needed {
        return Err(SnapshotError::ShortRead {
            expected: needed,
            actual: data.len(),
        });
    }
    if row_pitch == row_bytes {
        return Ok(data[..row_bytes * height as usize].to_vec());
    }

    let mut packed = Vec::with_capacity(row_bytes * height as usize);
    for row in data.chunks(row_pitch).take(height as usize) {
        packed.extend_from_slice(&row[..row_bytes]);
    }
    Ok(packed)
}

/// Write a tightly packed RGBA frame as PNG.
pub fn save_png(path: &Path, rgba: &[u8], width: u32, height: u32) -> Result<(), SnapshotError> {
    image::save_buffer_with_format(
        path,
        rgba,
        width,
        height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| SnapshotError::SaveFailed(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), width, height, "Snapshot saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_increment_after_write() {
        let mut namer = SnapshotNamer::new(PathBuf::from("."));
        assert_eq!(namer.next_file_name(), "Image1.png");
        assert_eq!(namer.reserve(), Some(PathBuf::from("./Image1.png")));
        assert_eq!(namer.next_file_name(), "Image1.png");
        namer.finish(true);
        assert_eq!(namer.next_file_name(), "Image2.png");
        assert_eq!(namer.reserve(), Some(PathBuf::from("./Image2.png")));
    }

    #[test]
    fn test_failed_write_reuses_name() {
        let mut namer = SnapshotNamer::new(PathBuf::from("shots"));
        assert!(namer.reserve().is_some());
        namer.finish(false);
        assert!(!namer.is_pending());
        assert_eq!(namer.reserve(), Some(PathBuf::from("shots/Image1.png")));
    }

    #[test]
    fn test_reserve_refuses_while_pending() {
        let mut namer = SnapshotNamer::new(PathBuf::from("."));
        assert!(namer.reserve().is_some());
        assert_eq!(namer.reserve(), None);
        namer.finish(true);
        assert_eq!(namer.reserve(), Some(PathBuf::from("./Image2.png")));
    }

    #[test]
    fn test_finish_without_reservation_keeps_counter() {
        let mut namer = SnapshotNamer::new(PathBuf::from("."));
        namer.finish(true);
        assert_eq!(namer.next_file_name(), "Image1.png");
    }

    #[test]
    fn test_directory_change_keeps_counter() {
        let mut namer = SnapshotNamer::new(PathBuf::from("old"));
        namer.reserve();
        namer.finish(true);
        namer.set_directory(PathBuf::from("new"));
        assert_eq!(namer.directory(), Path::new("new"));
        assert_eq!(namer.reserve(), Some(PathBuf::from("new/Image2.png")));
    }

    #[test]
    fn test_unpad_rows_removes_padding() {
        // 1x2 RGBA frame, rows padded to 8 bytes
        let data = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0];
        let packed = unpad_rows(&data, 1, 2, 8).expect("enough data");
        assert_eq!(packed, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_unpad_rows_short_buffer() {
        let err = unpad_rows(&[0; 10], 2, 2, 8).expect_err("too short");
        assert!(matches!(
            err,
            SnapshotError::ShortRead {
                expected: 16,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_save_png_round_trip_dimensions() {
        let dir = std::env::temp_dir().join(format!("friedcamera-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("Image1.png");
        let rgba = vec![255u8; 4 * 3 * 2];
        save_png(&path, &rgba, 3, 2).expect("png written");
        let decoded = image::open(&path).expect("png readable");
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        let _ = std::fs::remove_dir_all(&dir);
    }
}

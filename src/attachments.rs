//! File selections for file inputs and their selection-time limits

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Selection rejected at pick time
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("You can only upload up to {max} files.")]
    TooManyFiles { max: usize },

    #[error("The total size of your attachments exceeds the {}MB limit. Please upload smaller files.", .max_bytes / (1024 * 1024))]
    TooLarge { max_bytes: u64 },

    #[error("Cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file the applicant picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    /// File name sent to the services
    pub name: String,
    /// Size in bytes at selection time
    pub size: u64,
}

impl Attachment {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self { path, name, size }
    }

    /// Stat a file on disk
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let metadata = std::fs::metadata(path).map_err(|source| AttachmentError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(AttachmentError::Unreadable {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }
        Ok(Self::new(path, metadata.len()))
    }

    /// Stat every path of a comma or semicolon separated list
    pub fn from_path_list(list: &str) -> Result<Vec<Self>, AttachmentError> {
        list.split([',', ';'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| Self::from_path(Path::new(p)))
            .collect()
    }
}

/// Count and combined size ceilings for one file input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentLimits {
    pub max_files: usize,
    /// `None` checks the file count only
    pub max_total_bytes: Option<u64>,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_files: 10,
            max_total_bytes: Some(10 * 1024 * 1024),
        }
    }
}

impl AttachmentLimits {
    pub fn check(&self, files: &[Attachment]) -> Result<(), AttachmentError> {
        if files.len() > self.max_files {
            return Err(AttachmentError::TooManyFiles {
                max: self.max_files,
            });
        }
        if let Some(max_bytes) = self.max_total_bytes {
            let total: u64 = files.iter().map(|f| f.size).sum();
            if total > max_bytes {
                return Err(AttachmentError::TooLarge { max_bytes });
            }
        }
        Ok(())
    }
}

/// Currently selected files of one file input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentSet {
    files: Vec<Attachment>,
}

impl AttachmentSet {
    /// Replace the selection. A selection breaking `limits` leaves the set empty.
    pub fn select(
        &mut self,
        files: Vec<Attachment>,
        limits: &AttachmentLimits,
    ) -> Result<(), AttachmentError> {
        self.files.clear();
        if let Err(err) = limits.check(&files) {
            tracing::warn!(count = files.len(), error = %err, "Attachment selection rejected");
            return Err(err);
        }
        self.files = files;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[Attachment] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn files(count: usize, size: u64) -> Vec<Attachment> {
        (0..count)
            .map(|i| Attachment::new(format!("/tmp/doc-{}.pdf", i), size))
            .collect()
    }

    #[test]
    fn test_eleven_files_rejected_and_cleared() {
        let mut set = AttachmentSet::default();
        set.select(files(2, 10), &AttachmentLimits::default())
            .unwrap();
        assert_eq!(set.len(), 2);

        let err = set
            .select(files(11, 10), &AttachmentLimits::default())
            .unwrap_err();
        assert!(matches!(err, AttachmentError::TooManyFiles { max: 10 }));
        assert!(set.is_empty());
    }

    #[test]
    fn test_ten_files_accepted() {
        let mut set = AttachmentSet::default();
        set.select(files(10, 1024), &AttachmentLimits::default())
            .unwrap();
        assert_eq!(set.len(), 10);
        assert_eq!(set.total_bytes(), 10 * 1024);
    }

    #[test]
    fn test_oversized_selection_cleared() {
        let mut set = AttachmentSet::default();
        let err = set
            .select(files(3, 4 * 1024 * 1024), &AttachmentLimits::default())
            .unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { .. }));
        assert!(set.is_empty());
        assert_eq!(
            err.to_string(),
            "The total size of your attachments exceeds the 10MB limit. Please upload smaller files."
        );
    }

    #[test]
    fn test_count_only_limits_ignore_size() {
        let limits = AttachmentLimits {
            max_files: 10,
            max_total_bytes: None,
        };
        let mut set = AttachmentSet::default();
        set.select(files(3, 50 * 1024 * 1024), &limits).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_exactly_at_size_limit_is_accepted() {
        let mut set = AttachmentSet::default();
        set.select(files(2, 5 * 1024 * 1024), &AttachmentLimits::default())
            .unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_too_many_message() {
        let err = AttachmentError::TooManyFiles { max: 10 };
        assert_eq!(err.to_string(), "You can only upload up to 10 files.");
    }

    #[test]
    fn test_from_path_list_stats_files() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("resume.pdf");
        let b = temp_dir.path().join("cover.txt");
        std::fs::write(&a, b"12345").unwrap();
        std::fs::write(&b, b"abc").unwrap();

        let list = format!("{}, {}", a.display(), b.display());
        let picked = Attachment::from_path_list(&list).unwrap();
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].name, "resume.pdf");
        assert_eq!(picked[0].size, 5);
        assert_eq!(picked[1].size, 3);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Attachment::from_path(Path::new("/nonexistent/resume.pdf")).unwrap_err();
        assert!(matches!(err, AttachmentError::Unreadable { .. }));
    }
}

use bytes::Bytes;

/// Only files whose name ends in this extension (ASCII case-insensitive) are staged.
pub const ACCEPTED_EXTENSION: &str = ".md";

pub fn has_accepted_extension(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(ACCEPTED_EXTENSION)
}

/// A file the user picked but has not submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub size: u64,
    pub content: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
        }
    }

    pub fn is_accepted(&self) -> bool {
        has_accepted_extension(&self.name)
    }
}

/// Outcome of the most recent intake call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntakeStats {
    pub added: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

/// Ordered candidate files, unique by name. Later duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct CandidateSet {
    files: Vec<CandidateFile>,
}

impl CandidateSet {
    /// Appends every file whose name is not staged yet. Extension filtering
    /// happens before this point.
    pub(crate) fn extend(&mut self, accepted: Vec<CandidateFile>) -> (usize, usize) {
        let mut added = 0;
        let mut duplicates = 0;
        for file in accepted {
            if self.files.iter().any(|existing| existing.name == file.name) {
                duplicates += 1;
            } else {
                self.files.push(file);
                added += 1;
            }
        }
        (added, duplicates)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<CandidateFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub(crate) fn clear(&mut self) {
        self.files.clear();
    }

    pub(crate) fn as_slice(&self) -> &[CandidateFile] {
        &self.files
    }
}

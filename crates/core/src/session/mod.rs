//! Conversion sessions.
//!
//! A [`ConversionSession`] holds the selected file, the chosen target format
//! and the workflow status. Transitions follow
//! `Idle -> Uploading -> Processing -> Complete | Error`, and `reset` or a new
//! file selection returns to `Idle` from anywhere.

mod error;
mod machine;
mod registry;
mod types;

pub use error::{SelectionError, SessionError};
pub use machine::ConversionSession;
pub use registry::{ExpiredSession, SessionRegistry, SharedSession};
pub use types::{
    source_format, ConversionRun, FileSelection, RunToken, SelectedFile, SessionSnapshot,
    SessionStatus,
};

/// Narrows a picker or drop event to its single file.
///
/// An empty event and an event carrying more than one file are both rejected.
pub fn single_file(mut files: Vec<FileSelection>) -> Result<FileSelection, SelectionError> {
    match files.len() {
        0 => Err(SelectionError::NoFile),
        1 => Ok(files.remove(0)),
        count => Err(SelectionError::MultipleFiles { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file() {
        let one = vec![FileSelection::new("a.txt", "text/plain", vec![1])];
        assert_eq!(single_file(one).unwrap().name, "a.txt");

        assert_eq!(single_file(Vec::new()).unwrap_err(), SelectionError::NoFile);

        let two = vec![
            FileSelection::new("a.txt", "text/plain", vec![1]),
            FileSelection::new("b.txt", "text/plain", vec![2]),
        ];
        assert_eq!(
            single_file(two).unwrap_err(),
            SelectionError::MultipleFiles { count: 2 }
        );
    }
}

use std::io;
use std::path::PathBuf;

use flv::FlvError;
use thiserror::Error;

/// Errors that abort the extraction of one file.
///
/// Problems confined to single tags or a single output stream are reported as
/// warnings instead and never show up here.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Flv(FlvError),
    #[error("cannot prepare output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<FlvError> for ExtractError {
    fn from(err: FlvError) -> Self {
        match err {
            FlvError::Io(err) => ExtractError::Io(err),
            other => ExtractError::Flv(other),
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_flv_io_errors_become_io() {
        let err = ExtractError::from(FlvError::Io(io::Error::from(io::ErrorKind::NotFound)));
        assert!(matches!(err, ExtractError::Io(_)));

        let err = ExtractError::from(FlvError::UnsupportedFormat("not an FLV file".into()));
        assert_eq!(err.to_string(), "Unsupported format: not an FLV file");
    }

    #[test]
    fn test_output_error_display() {
        let err = ExtractError::Output {
            path: PathBuf::from("/out"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "cannot prepare output /out: denied");
    }
}

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::demux::StreamKind;

/// What to extract from each file and where to put it.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub extract_audio: bool,
    pub extract_video: bool,
    pub extract_timecodes: bool,

    /// Directory for the outputs; `None` writes next to each input
    pub output_dir: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            extract_audio: true,
            extract_video: true,
            extract_timecodes: true,
            output_dir: None,
        }
    }
}

impl Display for ExtractConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds = self
            .kinds()
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>();
        let kinds_display = if kinds.is_empty() {
            "none".to_string()
        } else {
            kinds.join(", ")
        };

        let output_display = match &self.output_dir {
            Some(dir) => dir.display().to_string(),
            None => "next to input".to_string(),
        };

        write!(
            f,
            "ExtractConfig {{ streams: {}, output_dir: {} }}",
            kinds_display, output_display
        )
    }
}

impl ExtractConfig {
    /// Starts from a configuration that extracts nothing.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::default()
    }

    /// Requested stream kinds, in output order.
    pub fn kinds(&self) -> Vec<StreamKind> {
        [
            (self.extract_audio, StreamKind::Audio),
            (self.extract_video, StreamKind::Video),
            (self.extract_timecodes, StreamKind::Timecodes),
        ]
        .into_iter()
        .filter_map(|(enabled, kind)| enabled.then_some(kind))
        .collect()
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl Default for ExtractConfigBuilder {
    fn default() -> Self {
        Self {
            config: ExtractConfig {
                extract_audio: false,
                extract_video: false,
                extract_timecodes: false,
                output_dir: None,
            },
        }
    }
}

impl ExtractConfigBuilder {
    pub fn audio(mut self, enabled: bool) -> Self {
        self.config.extract_audio = enabled;
        self
    }

    pub fn video(mut self, enabled: bool) -> Self {
        self.config.extract_video = enabled;
        self
    }

    pub fn timecodes(mut self, enabled: bool) -> Self {
        self.config.extract_timecodes = enabled;
        self
    }

    /// Enables every stream kind.
    pub fn all_streams(self) -> Self {
        self.audio(true).video(true).timecodes(true)
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> ExtractConfig {
        self.config
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ExtractConfig::builder()
            .video(true)
            .timecodes(true)
            .output_dir("/tmp/out")
            .build();

        assert_eq!(config.kinds(), vec![StreamKind::Video, StreamKind::Timecodes]);
        assert_eq!(config.output_dir(), Some(Path::new("/tmp/out")));
        assert_eq!(
            config.to_string(),
            "ExtractConfig { streams: video, timecodes, output_dir: /tmp/out }"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ExtractConfig::default();
        assert_eq!(config.kinds().len(), 3);
        assert_eq!(
            config.to_string(),
            "ExtractConfig { streams: audio, video, timecodes, output_dir: next to input }"
        );

        let empty = ExtractConfig::builder().build();
        assert!(empty.kinds().is_empty());
        assert_eq!(
            ExtractConfig::builder().all_streams().build().kinds(),
            config.kinds()
        );
    }
}

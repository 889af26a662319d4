//! # FLV Tag Parser
//!
//! Walks the tag stream of an FLV input and builds a [`TagIndex`].
//!
//! Damaged inputs are the norm rather than the exception for recorded
//! streams, so the parser only fails on a bad file header. Everything past it
//! is best effort: every tag that has to be dropped produces exactly one
//! warning and parsing carries on whenever the stream can be followed again.
//!
//! A tag whose declared size runs past the end of the input is followed by a
//! resynchronization attempt: the parser looks for the next position where a
//! plausible tag type byte is preceded by a `PreviousTagSize` pointing back to
//! the broken tag, and resumes there.

use std::io::{Read, Seek};

use tracing::{debug, warn};

use crate::audio::AudioTagHeader;
use crate::error::FlvError;
use crate::header::FlvHeader;
use crate::reader::FlvReader;
use crate::script::MetadataHints;
use crate::tag::{FlvTag, FlvTagHeader, FlvTagType, TagIndex};
use crate::video::VideoTagHeader;
use crate::{FLV_PREVIOUS_TAG_SIZE, FLV_TAG_HEADER_SIZE};

/// Video tag headers never take more than this many payload bytes.
const VIDEO_HEADER_PEEK: usize = 8;
/// Audio tag headers never take more than this many payload bytes.
const AUDIO_HEADER_PEEK: usize = 2;
/// `onMetaData` payloads larger than this are not decoded.
const MAX_SCRIPT_SIZE: u32 = 1 << 20;
const RESYNC_CHUNK: u64 = 64 * 1024;

/// Result of parsing one input.
#[derive(Debug, Clone)]
pub struct ParsedFlv {
    pub header: FlvHeader,
    pub tags: TagIndex,
    /// Hints from the first `onMetaData` tag, if one could be decoded
    pub metadata: Option<MetadataHints>,
    pub warnings: Vec<String>,
}

pub struct FlvParser;

impl FlvParser {
    /// Parses the header and indexes every tag from the start of `reader`.
    ///
    /// Only header problems are errors. Corrupt, truncated, empty and unknown
    /// tags end up in [`ParsedFlv::warnings`], one entry per tag.
    pub fn parse_tags<R: Read + Seek>(reader: &mut FlvReader<R>) -> Result<ParsedFlv, FlvError> {
        reader.seek(0)?;
        let header = FlvHeader::parse(reader)?;

        let mut warnings = Vec::new();
        if header.version != 1 {
            push_warning(
                &mut warnings,
                format!("unexpected FLV version {}, parsing as version 1", header.version),
            );
        }

        reader.seek(header.data_offset as u64)?;
        if reader.remaining() >= FLV_PREVIOUS_TAG_SIZE as u64 {
            let first_size = reader.read_u32_be()?;
            if first_size != 0 {
                debug!(first_size, "PreviousTagSize0 is not zero");
            }
        }

        let mut tags = Vec::new();
        let mut metadata = None;

        while reader.remaining() > 0 {
            let offset = reader.position();

            if reader.remaining() < FLV_TAG_HEADER_SIZE as u64 {
                push_warning(
                    &mut warnings,
                    format!(
                        "trailing fragment of {} bytes at offset {offset} ignored",
                        reader.remaining()
                    ),
                );
                break;
            }

            // The upper bits hold the filter flag and reserved bits
            let tag_type = FlvTagType::from(reader.read_u8()? & 0x1F);
            let data_size = reader.read_u24_be()?;
            let timestamp_low = reader.read_u24_be()?;
            let timestamp_ext = reader.read_u8()?;
            let stream_id = reader.read_u24_be()?;
            let timestamp_ms = ((timestamp_ext as u32) << 24) | timestamp_low;
            let payload_offset = reader.position();

            let available = reader.remaining();
            if data_size as u64 > available {
                let err = FlvError::CorruptTag {
                    offset,
                    declared: data_size,
                    available,
                };
                match find_resync_point(reader, offset)? {
                    Some(next) => {
                        push_warning(&mut warnings, format!("{err}; resuming at offset {next}"));
                        reader.seek(next)?;
                        continue;
                    }
                    None => {
                        push_warning(
                            &mut warnings,
                            format!(
                                "truncated tag at offset {offset} ({tag_type}, {data_size} bytes declared, {available} available), rest of file skipped"
                            ),
                        );
                        break;
                    }
                }
            }

            let header = match tag_type {
                FlvTagType::Audio | FlvTagType::Video if data_size == 0 => {
                    push_warning(
                        &mut warnings,
                        format!("empty {tag_type} tag at offset {offset} skipped"),
                    );
                    None
                }
                FlvTagType::Audio => {
                    let peek = reader.read_bytes(AUDIO_HEADER_PEEK.min(data_size as usize))?;
                    AudioTagHeader::parse(&peek).map(FlvTagHeader::Audio)
                }
                FlvTagType::Video => {
                    let peek = reader.read_bytes(VIDEO_HEADER_PEEK.min(data_size as usize))?;
                    VideoTagHeader::parse(&peek).map(FlvTagHeader::Video)
                }
                FlvTagType::ScriptData => {
                    if metadata.is_none() && data_size <= MAX_SCRIPT_SIZE {
                        let payload = reader.read_bytes(data_size as usize)?;
                        match MetadataHints::parse(&payload) {
                            Ok(Some(hints)) => {
                                debug!(?hints, offset, "found onMetaData");
                                metadata = Some(hints);
                            }
                            Ok(None) => {}
                            Err(e) => debug!(offset, error = %e, "undecodable script tag"),
                        }
                    }
                    Some(FlvTagHeader::Script)
                }
                FlvTagType::Unknown(code) => {
                    push_warning(
                        &mut warnings,
                        format!("unknown tag type {code} at offset {offset} skipped"),
                    );
                    None
                }
            };

            if let Some(header) = header {
                tags.push(FlvTag {
                    offset,
                    timestamp_ms,
                    stream_id,
                    payload_offset,
                    payload_size: data_size,
                    header,
                });
            }

            reader.seek(payload_offset + data_size as u64)?;
            if reader.remaining() >= FLV_PREVIOUS_TAG_SIZE as u64 {
                let previous_tag_size = reader.read_u32_be()?;
                let expected = FLV_TAG_HEADER_SIZE as u32 + data_size;
                if previous_tag_size != expected {
                    debug!(
                        offset,
                        previous_tag_size, expected, "PreviousTagSize mismatch"
                    );
                }
            } else {
                // The last tag may legitimately lack its back pointer
                break;
            }
        }

        debug!(
            tags = tags.len(),
            warnings = warnings.len(),
            "finished parsing FLV tags"
        );

        Ok(ParsedFlv {
            header,
            tags: TagIndex::from(tags),
            metadata,
            warnings,
        })
    }
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

/// Looks for the first offset `q` after the tag starting at `tag_start` such
/// that the byte at `q` is a known tag type, a whole tag header fits at `q`,
/// and the 4 bytes before `q` hold the distance back to `tag_start`.
fn find_resync_point<R: Read + Seek>(
    reader: &mut FlvReader<R>,
    tag_start: u64,
) -> Result<Option<u64>, FlvError> {
    let len = reader.len();
    let header_size = FLV_TAG_HEADER_SIZE as u64;
    let pointer_size = FLV_PREVIOUS_TAG_SIZE as u64;

    let mut chunk_start = tag_start + header_size;
    while chunk_start + pointer_size < len {
        let chunk_len = (len - chunk_start).min(RESYNC_CHUNK);
        let chunk = reader.read_at(chunk_start, chunk_len as usize)?;

        for i in FLV_PREVIOUS_TAG_SIZE..chunk.len() {
            let q = chunk_start + i as u64;
            if q + header_size > len {
                return Ok(None);
            }
            if !matches!(chunk[i], 8 | 9 | 18) {
                continue;
            }
            let pointer = u32::from_be_bytes([chunk[i - 4], chunk[i - 3], chunk[i - 2], chunk[i - 1]]);
            if pointer as u64 == q - pointer_size - tag_start {
                debug!(tag_start, resync = q, "resynchronized tag stream");
                return Ok(Some(q));
            }
        }

        // Overlap by the pointer width so no candidate straddles two chunks
        chunk_start += chunk_len - pointer_size;
    }

    Ok(None)
}

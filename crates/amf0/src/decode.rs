use std::borrow::Cow;
use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};

use super::{Amf0Marker, Amf0ReadError, Amf0Value};

const MAX_DEPTH: usize = 64;

/// An AMF0 decoder over a borrowed byte slice.
///
/// Decoded strings borrow from the slice, so decoding never copies text.
pub struct Amf0Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Amf0Decoder<'a> {
    /// Creates a decoder positioned at the start of `buff`.
    pub const fn new(buff: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buff),
        }
    }

    /// Whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.cursor.position() as usize >= self.cursor.get_ref().len()
    }

    /// Decodes the next value.
    pub fn decode(&mut self) -> Result<Amf0Value<'a>, Amf0ReadError> {
        self.decode_value(0)
    }

    /// Decodes values until the buffer is exhausted or a value fails.
    ///
    /// The values decoded before the failure are returned along with it.
    pub fn decode_all(&mut self) -> (Vec<Amf0Value<'a>>, Option<Amf0ReadError>) {
        let mut values = Vec::new();
        while !self.is_empty() {
            match self.decode() {
                Ok(value) => values.push(value),
                Err(err) => return (values, Some(err)),
            }
        }
        (values, None)
    }

    fn decode_value(&mut self, depth: usize) -> Result<Amf0Value<'a>, Amf0ReadError> {
        if depth > MAX_DEPTH {
            return Err(Amf0ReadError::NestingTooDeep(MAX_DEPTH));
        }

        let byte = self.cursor.read_u8()?;
        let marker = Amf0Marker::try_from(byte).map_err(Amf0ReadError::UnknownMarker)?;

        match marker {
            Amf0Marker::Number => Ok(Amf0Value::Number(self.cursor.read_f64::<BigEndian>()?)),
            Amf0Marker::Boolean => Ok(Amf0Value::Boolean(self.cursor.read_u8()? != 0)),
            Amf0Marker::String => Ok(Amf0Value::String(self.read_string()?)),
            Amf0Marker::LongString | Amf0Marker::XmlDocument => {
                Ok(Amf0Value::String(self.read_long_string()?))
            }
            Amf0Marker::Object => Ok(Amf0Value::Object(self.read_properties(depth)?)),
            Amf0Marker::TypedObject => {
                // class name is not kept
                self.read_string()?;
                Ok(Amf0Value::Object(self.read_properties(depth)?))
            }
            Amf0Marker::EcmaArray => {
                // the declared count is advisory; muxers often get it wrong
                self.cursor.read_u32::<BigEndian>()?;
                Ok(Amf0Value::Object(self.read_properties(depth)?))
            }
            Amf0Marker::StrictArray => {
                let count = self.cursor.read_u32::<BigEndian>()?;
                let mut values = Vec::new();
                for _ in 0..count {
                    values.push(self.decode_value(depth + 1)?);
                }
                Ok(Amf0Value::StrictArray(values))
            }
            Amf0Marker::Date => Ok(Amf0Value::Date {
                millis: self.cursor.read_f64::<BigEndian>()?,
                time_zone: self.cursor.read_i16::<BigEndian>()?,
            }),
            Amf0Marker::Null => Ok(Amf0Value::Null),
            Amf0Marker::Undefined | Amf0Marker::Unsupported => Ok(Amf0Value::Undefined),
            Amf0Marker::MovieClip
            | Amf0Marker::Reference
            | Amf0Marker::ObjectEnd
            | Amf0Marker::Recordset
            | Amf0Marker::AvmPlusObject => Err(Amf0ReadError::UnsupportedType(marker)),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Amf0ReadError> {
        let buff: &'a [u8] = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= buff.len())
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;
        self.cursor.set_position(end as u64);
        Ok(&buff[start..end])
    }

    fn read_string(&mut self) -> Result<Cow<'a, str>, Amf0ReadError> {
        let len = self.cursor.read_u16::<BigEndian>()? as usize;
        Ok(Cow::Borrowed(std::str::from_utf8(self.take(len)?)?))
    }

    fn read_long_string(&mut self) -> Result<Cow<'a, str>, Amf0ReadError> {
        let len = self.cursor.read_u32::<BigEndian>()? as usize;
        Ok(Cow::Borrowed(std::str::from_utf8(self.take(len)?)?))
    }

    /// Reads `key, value` pairs up to the `00 00 09` terminator or the end of
    /// the buffer, whichever comes first.
    fn read_properties(
        &mut self,
        depth: usize,
    ) -> Result<Vec<(Cow<'a, str>, Amf0Value<'a>)>, Amf0ReadError> {
        let mut properties = Vec::new();

        loop {
            if self.is_empty() {
                break;
            }
            let position = self.cursor.position();
            if self.cursor.read_u24::<BigEndian>().ok() == Some(Amf0Marker::ObjectEnd as u32) {
                break;
            }
            self.cursor.set_position(position);

            let key = self.read_string()?;
            let value = self.decode_value(depth + 1)?;
            properties.push((key, value));
        }

        Ok(properties)
    }
}

impl<'a> Iterator for Amf0Decoder<'a> {
    type Item = Result<Amf0Value<'a>, Amf0ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }
        Some(self.decode())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn string(s: &str) -> Vec<u8> {
        let mut out = vec![0x02];
        out.extend_from_slice(&(s.len() as u16).to_be_bytes());
        out.extend_from_slice(s.as_bytes());
        out
    }

    fn key(s: &str) -> Vec<u8> {
        let mut out = (s.len() as u16).to_be_bytes().to_vec();
        out.extend_from_slice(s.as_bytes());
        out
    }

    fn number(n: f64) -> Vec<u8> {
        let mut out = vec![0x00];
        out.extend_from_slice(&n.to_be_bytes());
        out
    }

    #[test]
    fn test_decodes_scalars() {
        let mut bytes = number(29.97);
        bytes.extend_from_slice(&[0x01, 0x01, 0x05, 0x06]);
        bytes.extend(string("hello"));

        let (values, error) = Amf0Decoder::new(&bytes).decode_all();
        assert!(error.is_none());
        assert_eq!(
            values,
            vec![
                Amf0Value::Number(29.97),
                Amf0Value::Boolean(true),
                Amf0Value::Null,
                Amf0Value::Undefined,
                Amf0Value::String(Cow::Borrowed("hello")),
            ]
        );
    }

    #[test]
    fn test_decodes_ecma_array_with_wrong_count_and_nested_object() {
        let mut bytes = vec![0x08, 0, 0, 0, 9];
        bytes.extend(key("duration"));
        bytes.extend(number(10.0));
        bytes.extend(key("keyframes"));
        bytes.push(0x03);
        bytes.extend(key("times"));
        bytes.extend_from_slice(&[0x0a, 0, 0, 0, 2]);
        bytes.extend(number(0.0));
        bytes.extend(number(2.0));
        bytes.extend_from_slice(&[0, 0, 0x09]);
        bytes.extend_from_slice(&[0, 0, 0x09]);

        let value = Amf0Decoder::new(&bytes).decode().unwrap();
        assert_eq!(value.get("duration").and_then(Amf0Value::as_number), Some(10.0));
        let times = value.get("keyframes").and_then(|k| k.get("times")).unwrap();
        assert_eq!(
            times,
            &Amf0Value::StrictArray(vec![Amf0Value::Number(0.0), Amf0Value::Number(2.0)])
        );
    }

    #[test]
    fn test_object_without_terminator_ends_at_buffer_end() {
        let mut bytes = vec![0x03];
        bytes.extend(key("width"));
        bytes.extend(number(640.0));

        let value = Amf0Decoder::new(&bytes).decode().unwrap();
        assert_eq!(value.get("width").and_then(Amf0Value::as_number), Some(640.0));
    }

    #[test]
    fn test_decodes_date() {
        let mut bytes = vec![0x0b];
        bytes.extend_from_slice(&1000.0f64.to_be_bytes());
        bytes.extend_from_slice(&[0, 0]);

        let value = Amf0Decoder::new(&bytes).decode().unwrap();
        assert_eq!(value, Amf0Value::Date { millis: 1000.0, time_zone: 0 });
        assert_eq!(value.marker(), Amf0Marker::Date);
    }

    #[test]
    fn test_truncated_string_is_an_error() {
        let bytes = [0x02, 0x00, 0x10, b'a'];
        let err = Amf0Decoder::new(&bytes).decode().unwrap_err();
        assert!(matches!(err, Amf0ReadError::Io(_)));
    }

    #[test]
    fn test_unknown_and_unsupported_markers() {
        let err = Amf0Decoder::new(&[0x42]).decode().unwrap_err();
        assert!(matches!(err, Amf0ReadError::UnknownMarker(0x42)));

        let err = Amf0Decoder::new(&[0x07, 0, 1]).decode().unwrap_err();
        assert!(matches!(err, Amf0ReadError::UnsupportedType(Amf0Marker::Reference)));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let bytes = [0x0a, 0, 0, 0, 1].repeat(MAX_DEPTH + 2);
        let err = Amf0Decoder::new(&bytes).decode().unwrap_err();
        assert!(matches!(err, Amf0ReadError::NestingTooDeep(_)));
    }

    #[test]
    fn test_partial_results_are_kept() {
        let mut bytes = string("onMetaData");
        bytes.push(0x42);

        let (values, error) = Amf0Decoder::new(&bytes).decode_all();
        assert_eq!(values.len(), 1);
        assert!(matches!(error, Some(Amf0ReadError::UnknownMarker(0x42))));
    }

    #[test]
    fn test_iterates_values() {
        let mut bytes = number(1.0);
        bytes.extend(number(2.0));
        let values: Result<Vec<_>, _> = Amf0Decoder::new(&bytes).collect();
        assert_eq!(values.unwrap().len(), 2);
    }
}

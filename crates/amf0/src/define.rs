use std::borrow::Cow;

/// AMF0 type markers (amf0_spec_121207.pdf section 2.1).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum Amf0Marker {
    /// number-marker
    Number = 0x00,
    /// boolean-marker
    Boolean = 0x01,
    /// string-marker
    String = 0x02,
    /// object-marker
    Object = 0x03,
    /// movieclip-marker, reserved
    MovieClip = 0x04,
    /// null-marker
    Null = 0x05,
    /// undefined-marker
    Undefined = 0x06,
    /// reference-marker
    Reference = 0x07,
    /// ecma-array-marker
    EcmaArray = 0x08,
    /// object-end-marker
    ObjectEnd = 0x09,
    /// strict-array-marker
    StrictArray = 0x0a,
    /// date-marker
    Date = 0x0b,
    /// long-string-marker
    LongString = 0x0c,
    /// unsupported-marker
    Unsupported = 0x0d,
    /// recordset-marker, reserved
    Recordset = 0x0e,
    /// xml-document-marker
    XmlDocument = 0x0f,
    /// typed-object-marker
    TypedObject = 0x10,
    /// avmplus-object-marker (switch to AMF3)
    AvmPlusObject = 0x11,
}

impl TryFrom<u8> for Amf0Marker {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::Number,
            0x01 => Self::Boolean,
            0x02 => Self::String,
            0x03 => Self::Object,
            0x04 => Self::MovieClip,
            0x05 => Self::Null,
            0x06 => Self::Undefined,
            0x07 => Self::Reference,
            0x08 => Self::EcmaArray,
            0x09 => Self::ObjectEnd,
            0x0a => Self::StrictArray,
            0x0b => Self::Date,
            0x0c => Self::LongString,
            0x0d => Self::Unsupported,
            0x0e => Self::Recordset,
            0x0f => Self::XmlDocument,
            0x10 => Self::TypedObject,
            0x11 => Self::AvmPlusObject,
            other => return Err(other),
        })
    }
}

/// A decoded AMF0 value. Strings borrow from the decoded buffer.
///
/// Objects, ECMA arrays and typed objects all decode to [`Amf0Value::Object`];
/// long strings and XML documents decode to [`Amf0Value::String`].
#[derive(PartialEq, Clone, Debug)]
pub enum Amf0Value<'a> {
    /// IEEE-754 double
    Number(f64),
    /// boolean
    Boolean(bool),
    /// UTF-8 string of any length
    String(Cow<'a, str>),
    /// Ordered key/value pairs
    Object(Vec<(Cow<'a, str>, Amf0Value<'a>)>),
    /// Dense array
    StrictArray(Vec<Amf0Value<'a>>),
    /// Milliseconds since the Unix epoch plus the (unused) time zone field
    Date {
        /// milliseconds since 1970-01-01 UTC
        millis: f64,
        /// reserved time zone offset, should be 0
        time_zone: i16,
    },
    /// null
    Null,
    /// undefined
    Undefined,
}

impl<'a> Amf0Value<'a> {
    /// Looks up `key` when the value is an object. The first match wins.
    pub fn get(&self, key: &str) -> Option<&Amf0Value<'a>> {
        match self {
            Self::Object(properties) => properties
                .iter()
                .find(|(name, _)| name.as_ref() == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// The marker this value would be written with.
    pub fn marker(&self) -> Amf0Marker {
        match self {
            Self::Number(_) => Amf0Marker::Number,
            Self::Boolean(_) => Amf0Marker::Boolean,
            Self::String(s) if s.len() > u16::MAX as usize => Amf0Marker::LongString,
            Self::String(_) => Amf0Marker::String,
            Self::Object(_) => Amf0Marker::Object,
            Self::StrictArray(_) => Amf0Marker::StrictArray,
            Self::Date { .. } => Amf0Marker::Date,
            Self::Null => Amf0Marker::Null,
            Self::Undefined => Amf0Marker::Undefined,
        }
    }
}

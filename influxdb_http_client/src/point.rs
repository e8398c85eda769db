//! Data points and their line protocol representation

use std::{cmp, collections::BTreeMap, fmt, marker::PhantomData};

/// Errors building a [`DataPoint`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataPointError {
    /// A point without fields cannot be written
    #[error("point for measurement '{measurement}' needs at least one field")]
    AtLeastOneFieldRequired { measurement: String },

    /// Line protocol has no representation for NaN or infinity
    #[error("field '{field}' of measurement '{measurement}' is not a finite number")]
    NonFiniteField { measurement: String, field: String },

    #[error("tag '{tag}' of measurement '{measurement}' has an empty value")]
    EmptyTagValue { measurement: String, tag: String },
}

/// Anything that can be rendered as a single line of line protocol
pub trait LineProtocol {
    /// Write the line, without a trailing newline
    fn write_line_to(&self, w: &mut dyn fmt::Write) -> fmt::Result;

    /// Render the line into a new `String`
    fn to_line_protocol(&self) -> String {
        let mut line = String::new();
        // writing to a String cannot fail
        let _ = self.write_line_to(&mut line);
        line
    }
}

impl LineProtocol for str {
    fn write_line_to(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        w.write_str(self.trim_end_matches('\n'))
    }
}

impl LineProtocol for String {
    fn write_line_to(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        self.as_str().write_line_to(w)
    }
}

impl<T: LineProtocol + ?Sized> LineProtocol for &T {
    fn write_line_to(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        (**self).write_line_to(w)
    }
}

/// Incrementally constructs a `DataPoint`.
///
/// Create this via `DataPoint::builder`.
#[derive(Debug)]
pub struct DataPointBuilder {
    measurement: EscapedMeasurement,
    // Keeping the tags sorted improves performance on the server side
    tags: BTreeMap<EscapedTagKey, EscapedTagValue>,
    fields: BTreeMap<EscapedFieldKey, FieldValue>,
    timestamp: Option<i64>,
}

impl DataPointBuilder {
    fn new(measurement: impl Into<EscapedMeasurement>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Default::default(),
            fields: Default::default(),
            timestamp: Default::default(),
        }
    }

    /// Sets a tag, replacing any existing tag of the same name.
    pub fn tag(
        mut self,
        name: impl Into<EscapedTagKey>,
        value: impl Into<EscapedTagValue>,
    ) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    /// Sets a field, replacing any existing field of the same name.
    pub fn field(mut self, name: impl Into<EscapedFieldKey>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets the timestamp, replacing any existing timestamp.
    ///
    /// The unit is given by the `precision` of the write, nanoseconds by default.
    pub fn timestamp(mut self, value: i64) -> Self {
        self.timestamp = Some(value);
        self
    }

    /// Constructs the data point
    pub fn build(self) -> Result<DataPoint, DataPointError> {
        let Self {
            measurement,
            tags,
            fields,
            timestamp,
        } = self;
        if fields.is_empty() {
            return Err(DataPointError::AtLeastOneFieldRequired {
                measurement: measurement.0,
            });
        }
        if let Some((tag, _)) = tags.iter().find(|(_, v)| v.0.is_empty()) {
            return Err(DataPointError::EmptyTagValue {
                measurement: measurement.0,
                tag: tag.0.clone(),
            });
        }
        if let Some((field, _)) = fields
            .iter()
            .find(|(_, v)| matches!(v, FieldValue::F64(f) if !f.is_finite()))
        {
            return Err(DataPointError::NonFiniteField {
                measurement: measurement.0,
                field: field.0.clone(),
            });
        }
        Ok(DataPoint {
            measurement,
            tags,
            fields,
            timestamp,
        })
    }
}

/// A single point of information to send to InfluxDB.
#[derive(Debug, Clone)]
pub struct DataPoint {
    measurement: EscapedMeasurement,
    tags: BTreeMap<EscapedTagKey, EscapedTagValue>,
    fields: BTreeMap<EscapedFieldKey, FieldValue>,
    timestamp: Option<i64>,
}

impl DataPoint {
    /// Create a builder to incrementally construct a `DataPoint`.
    pub fn builder(measurement: impl Into<EscapedMeasurement>) -> DataPointBuilder {
        DataPointBuilder::new(measurement)
    }
}

impl LineProtocol for DataPoint {
    fn write_line_to(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        write!(w, "{}", self.measurement)?;

        for (k, v) in &self.tags {
            write!(w, ",{k}={v}")?;
        }

        for (i, (k, v)) in self.fields.iter().enumerate() {
            let d = if i == 0 { " " } else { "," };
            write!(w, "{d}{k}={v}")?;
        }

        if let Some(ts) = self.timestamp {
            write!(w, " {ts}")?;
        }

        Ok(())
    }
}

/// A string that will be escaped according to the rules of measurements
pub type EscapedMeasurement = Escaped<Measurement>;
/// A string that will be escaped according to the rules of tag keys
pub type EscapedTagKey = Escaped<TagKey>;
/// A string that will be escaped according to the rules of tag values
pub type EscapedTagValue = Escaped<TagKey>;
/// A string that will be escaped according to the rules of field keys
pub type EscapedFieldKey = Escaped<TagKey>;
/// A string that will be escaped according to the rules of field value strings
pub type EscapedFieldValueString = Escaped<FieldValueString>;

/// Ensures that a string value is appropriately escaped when it is sent to InfluxDB.
#[derive(Debug, Clone)]
pub struct Escaped<K>(String, PhantomData<K>);

impl<K> PartialEq for Escaped<K> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl<K> Eq for Escaped<K> {}

impl<K> PartialOrd for Escaped<K> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Escaped<K> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<K> From<&str> for Escaped<K>
where
    K: EscapingSpecification,
{
    fn from(other: &str) -> Self {
        Self(other.into(), PhantomData)
    }
}

impl<K> From<String> for Escaped<K>
where
    K: EscapingSpecification,
{
    fn from(other: String) -> Self {
        Self(other, PhantomData)
    }
}

impl<K> fmt::Display for Escaped<K>
where
    K: EscapingSpecification,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut last = 0;

        for (idx, delim) in self.0.match_indices(K::DELIMITERS) {
            let s = &self.0[last..idx];
            write!(f, r#"{s}\{delim}"#)?;
            last = idx + delim.len();
        }

        self.0[last..].fmt(f)
    }
}

/// Specifies how to escape a particular piece of InfluxDB information.
pub trait EscapingSpecification {
    /// The delimiters that need to be escaped
    const DELIMITERS: &'static [char];
}

/// Rules to escape a measurement name
#[derive(Debug, Copy, Clone)]
pub struct Measurement(());

/// Rules to escape a tag key, tag value, or field key string
#[derive(Debug, Copy, Clone)]
pub struct TagKey(());

/// Rules to escape a field value string
#[derive(Debug, Copy, Clone)]
pub struct FieldValueString(());

impl EscapingSpecification for Measurement {
    const DELIMITERS: &'static [char] = &[',', ' '];
}

impl EscapingSpecification for TagKey {
    const DELIMITERS: &'static [char] = &[',', '=', ' '];
}

impl EscapingSpecification for FieldValueString {
    const DELIMITERS: &'static [char] = &['"', '\\'];
}

/// Possible value types
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A true or false value
    Bool(bool),
    /// A 64-bit floating point number
    F64(f64),
    /// A 64-bit signed integer number
    I64(i64),
    /// A string value
    String(EscapedFieldValueString),
}

impl From<bool> for FieldValue {
    fn from(other: bool) -> Self {
        Self::Bool(other)
    }
}

impl From<f64> for FieldValue {
    fn from(other: f64) -> Self {
        Self::F64(other)
    }
}

impl From<i64> for FieldValue {
    fn from(other: i64) -> Self {
        Self::I64(other)
    }
}

impl From<&str> for FieldValue {
    fn from(other: &str) -> Self {
        Self::String(other.into())
    }
}

impl From<String> for FieldValue {
    fn from(other: String) -> Self {
        Self::String(other.into())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", if *v { "t" } else { "f" }),
            Self::F64(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}i"),
            Self::String(v) => write!(f, r#""{v}""#),
        }
    }
}

//! Named typed values owned by the driver and mirrored to the MCU.
//!
//! A `Property` is the unit the surrounding observer system (network, MQTT)
//! subscribes to: a name, a current value, and for enumerated properties an
//! ordered table of valid strings addressable by index. The MCU reports enum
//! values by their table position, so the table order must match the wire
//! encoding exactly.

/// Where a property is exposed by the surrounding reporting layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    Mqtt,
    None,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Unset,
    Bool(bool),
    Number(f32),
    Text(String),
}

/// A named value with boolean, numeric or enumerated-string semantics
#[derive(Debug, Clone)]
pub struct Property {
    name: &'static str,
    value: Value,
    enum_strings: Vec<&'static str>,
    visibility: Visibility,
    read_only: bool,
}

impl Property {
    /// Create a boolean property
    pub fn boolean(name: &'static str) -> Self {
        Self::new(name)
    }

    /// Create a numeric property
    pub fn number(name: &'static str) -> Self {
        Self::new(name)
    }

    /// Create a string property constrained to an enum table
    pub fn enumerated(name: &'static str) -> Self {
        Self::new(name)
    }

    fn new(name: &'static str) -> Self {
        Self {
            name,
            value: Value::Unset,
            enum_strings: Vec::new(),
            visibility: Visibility::All,
            read_only: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append a valid value to the enum table; its index is the wire encoding
    pub fn add_enum_string(&mut self, value: &'static str) {
        self.enum_strings.push(value);
    }

    /// Look up the enum string at a wire index
    pub fn enum_string(&self, index: u8) -> Option<&'static str> {
        self.enum_strings.get(index as usize).copied()
    }

    /// Wire index of the current value, if one is set
    pub fn enum_index(&self) -> Option<u8> {
        match &self.value {
            Value::Text(current) => self.enum_index_of(current),
            _ => None,
        }
    }

    /// Wire index of an arbitrary value within the enum table
    pub fn enum_index_of(&self, value: &str) -> Option<u8> {
        self.enum_strings
            .iter()
            .position(|s| *s == value)
            .map(|i| i as u8)
    }

    /// Set a string value, returns whether the stored value changed.
    /// Values outside a non-empty enum table are rejected unchanged.
    pub fn set_string(&mut self, value: &str) -> bool {
        if !self.enum_strings.is_empty() && self.enum_index_of(value).is_none() {
            return false;
        }
        if matches!(&self.value, Value::Text(current) if current == value) {
            return false;
        }
        self.value = Value::Text(value.to_owned());
        true
    }

    /// Set a boolean value, returns whether the stored value changed
    pub fn set_bool(&mut self, value: bool) -> bool {
        if self.value == Value::Bool(value) {
            return false;
        }
        self.value = Value::Bool(value);
        true
    }

    /// Set a numeric value, returns whether the stored value changed
    pub fn set_number(&mut self, value: f32) -> bool {
        if self.value == Value::Number(value) {
            return false;
        }
        self.value = Value::Number(value);
        true
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self.value {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Marks the property as not writable from the outside. The driver itself
    /// still updates it from MCU reports.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

//! Type descriptors and structural assignability.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::typing::value::Payload;

/// Capability provided by types that can be parsed from a text value.
pub const FROM_TEXT: &str = "FromText";
/// Capability provided by types that render to text.
pub const DISPLAY: &str = "Display";
/// Capability provided by byte-oriented types.
pub const READ: &str = "Read";
/// Capability provided by error types.
pub const ERROR: &str = "Error";
/// Capability provided by structured (JSON) types.
pub const SERIALIZE: &str = "Serialize";

/// Runtime representation of a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repr {
    Text,
    Int,
    Float,
    Bool,
    Bytes,
    Json,
    Error,
    Opaque,
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Repr::Text => "text",
            Repr::Int => "int",
            Repr::Float => "float",
            Repr::Bool => "bool",
            Repr::Bytes => "bytes",
            Repr::Json => "json",
            Repr::Error => "error",
            Repr::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
enum Kind {
    Concrete {
        repr: Repr,
        provides: BTreeSet<Cow<'static, str>>,
        zero: Option<Payload>,
    },
    Interface {
        requires: BTreeSet<Cow<'static, str>>,
    },
}

#[derive(Clone)]
struct Inner {
    name: Cow<'static, str>,
    kind: Kind,
}

/// Describes the type of an argument, return value or operator endpoint.
///
/// Cheap to clone; the descriptor is shared behind an `Arc`.
#[derive(Clone)]
pub struct TypeDesc(Arc<Inner>);

impl TypeDesc {
    /// A nullable concrete type with no capabilities.
    pub fn concrete(name: impl Into<Cow<'static, str>>, repr: Repr) -> Self {
        Self(Arc::new(Inner {
            name: name.into(),
            kind: Kind::Concrete {
                repr,
                provides: BTreeSet::new(),
                zero: None,
            },
        }))
    }

    /// An interface type satisfied by anything providing `requires`.
    pub fn interface<I, S>(name: impl Into<Cow<'static, str>>, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self(Arc::new(Inner {
            name: name.into(),
            kind: Kind::Interface {
                requires: requires.into_iter().map(Into::into).collect(),
            },
        }))
    }

    /// Adds capabilities to a concrete type. Interfaces are returned unchanged.
    pub fn providing<I, S>(self, caps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        let mut inner = (*self.0).clone();
        if let Kind::Concrete { provides, .. } = &mut inner.kind {
            provides.extend(caps.into_iter().map(Into::into));
        }
        Self(Arc::new(inner))
    }

    /// Gives a concrete type a zero value, making it non-nullable.
    pub fn with_zero(self, zero: Payload) -> Self {
        let mut inner = (*self.0).clone();
        if let Kind::Concrete { zero: z, .. } = &mut inner.kind {
            *z = Some(zero);
        }
        Self(Arc::new(inner))
    }

    pub fn string() -> Self {
        Self::concrete("string", Repr::Text)
            .providing([FROM_TEXT, DISPLAY])
            .with_zero(Payload::Text(String::new()))
    }

    pub fn int() -> Self {
        Self::concrete("int", Repr::Int)
            .providing([FROM_TEXT, DISPLAY])
            .with_zero(Payload::Int(0))
    }

    pub fn float() -> Self {
        Self::concrete("float", Repr::Float)
            .providing([FROM_TEXT, DISPLAY])
            .with_zero(Payload::Float(0.0))
    }

    pub fn bool() -> Self {
        Self::concrete("bool", Repr::Bool)
            .providing([FROM_TEXT, DISPLAY])
            .with_zero(Payload::Bool(false))
    }

    pub fn bytes() -> Self {
        Self::concrete("bytes", Repr::Bytes)
            .providing([FROM_TEXT, READ])
            .with_zero(Payload::Bytes(Bytes::new()))
    }

    /// A nullable structured type decoded from and encoded to JSON.
    pub fn json(name: impl Into<Cow<'static, str>>) -> Self {
        Self::concrete(name, Repr::Json).providing([FROM_TEXT, SERIALIZE, DISPLAY])
    }

    /// A nullable type carried as an opaque Rust object.
    pub fn opaque(name: impl Into<Cow<'static, str>>) -> Self {
        Self::concrete(name, Repr::Opaque)
    }

    /// A nullable concrete error type.
    pub fn error_type(name: impl Into<Cow<'static, str>>) -> Self {
        Self::concrete(name, Repr::Error).providing([ERROR, DISPLAY])
    }

    /// The empty interface; every type is assignable to it.
    pub fn any() -> Self {
        Self::interface("any", Vec::<&'static str>::new())
    }

    /// The interface implemented by every error type.
    pub fn error() -> Self {
        Self::interface("error", [ERROR])
    }

    /// The interface implemented by byte-oriented types.
    pub fn reader() -> Self {
        Self::interface("reader", [READ])
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.0.kind, Kind::Interface { .. })
    }

    /// Runtime representation; `None` for interfaces.
    pub fn repr(&self) -> Option<Repr> {
        match &self.0.kind {
            Kind::Concrete { repr, .. } => Some(*repr),
            Kind::Interface { .. } => None,
        }
    }

    /// Zero value used when a parameter resolves to nothing.
    pub fn zero(&self) -> Option<Payload> {
        match &self.0.kind {
            Kind::Concrete { zero, .. } => zero.clone(),
            Kind::Interface { .. } => None,
        }
    }

    /// Reports whether the type provides (or, for interfaces, requires) `cap`.
    pub fn has(&self, cap: &str) -> bool {
        match &self.0.kind {
            Kind::Concrete { provides, .. } => provides.contains(cap),
            Kind::Interface { requires } => requires.contains(cap),
        }
    }

    /// Structural assignability: values of `self` can be used where `target` is expected.
    pub fn assignable_to(&self, target: &TypeDesc) -> bool {
        if Arc::ptr_eq(&self.0, &target.0) {
            return true;
        }
        match (&self.0.kind, &target.0.kind) {
            (_, Kind::Interface { requires }) => requires.iter().all(|cap| self.has(cap)),
            (Kind::Concrete { repr: a, .. }, Kind::Concrete { repr: b, .. }) => {
                a == b && self.0.name == target.0.name
            }
            (Kind::Interface { .. }, Kind::Concrete { .. }) => false,
        }
    }

    /// Reports whether a runtime payload can stand in for a value of this type.
    pub fn admits(&self, payload: &Payload) -> bool {
        match &self.0.kind {
            Kind::Concrete { repr, .. } => payload.repr() == *repr,
            Kind::Interface { requires } => {
                !requires.contains(ERROR) || payload.repr() == Repr::Error
            }
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            Kind::Concrete { repr, provides, .. } => f
                .debug_struct("Concrete")
                .field("name", &self.0.name)
                .field("repr", repr)
                .field("provides", provides)
                .finish(),
            Kind::Interface { requires } => f
                .debug_struct("Interface")
                .field("name", &self.0.name)
                .field("requires", requires)
                .finish(),
        }
    }
}

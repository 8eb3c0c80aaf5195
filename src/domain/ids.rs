use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Returns the raw numeric value.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

numeric_id! {
    /// Identifier of a [`Degree`](crate::Degree) (grade level).
    DegreeId
}

numeric_id! {
    /// Identifier of a [`Teacher`](crate::Teacher).
    TeacherId
}

numeric_id! {
    /// Identifier of a [`Matter`](crate::Matter) (school subject).
    MatterId
}

numeric_id! {
    /// Identifier of a [`Student`](crate::Student).
    StudentId
}

numeric_id! {
    /// Identifier of a [`Relationship`](crate::Relationship).
    RelationshipId
}

numeric_id! {
    /// A student's enrollment number ("registro acadêmico").
    ///
    /// Generated enrollment numbers are six digits wide, but seed data may
    /// carry any value.
    Ra
}

/// The 1-based position of a class in the class catalog.
///
/// Classes carry no stored identifier; a class is identified by where it sits
/// in the catalog. Position `k` names `classes[k - 1]`. The only conversion to
/// a zero-based index is [`ClassPosition::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassPosition(NonZeroU32);

impl ClassPosition {
    /// The first class in the catalog.
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Creates a position from its 1-based value.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPosition`] if `position` is zero.
    pub fn new(position: u32) -> Result<Self, InvalidPosition> {
        NonZeroU32::new(position)
            .map(Self)
            .ok_or_else(|| InvalidPosition(position.to_string()))
    }

    /// Returns the 1-based value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Zero-based index into the class catalog.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Position of the class stored at a zero-based catalog index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .and_then(|index| index.checked_add(1))
            .and_then(NonZeroU32::new)
            .map(Self)
    }
}

impl fmt::Display for ClassPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClassPosition {
    type Err = InvalidPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s.trim().parse().map_err(|_| InvalidPosition(s.to_string()))?;
        Self::new(value).map_err(|_| InvalidPosition(s.to_string()))
    }
}

impl TryFrom<u32> for ClassPosition {
    type Error = InvalidPosition;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Error returned when a class position is not a positive integer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid class position '{0}': must be a positive integer")]
pub struct InvalidPosition(String);

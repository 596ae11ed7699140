//! Modifier bit flags for classes and class members.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Raw modifier bits as produced by the analyzer.
///
/// The value is stored verbatim. Member setters call [`Modifiers::normalized`]
/// so that a value without any visibility bit is stored as public; reads never
/// rewrite the stored value but still report such a value as public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const PUBLIC: u32 = 1;
    pub const PROTECTED: u32 = 2;
    pub const PRIVATE: u32 = 4;
    pub const STATIC: u32 = 8;
    pub const ABSTRACT: u32 = 16;
    pub const FINAL: u32 = 32;

    /// Bits that encode visibility.
    pub const VISIBILITY_MASK: u32 = Self::PUBLIC | Self::PROTECTED | Self::PRIVATE;

    /// Wrap raw bits without normalization.
    pub const fn from_bits(bits: u32) -> Self {
        Modifiers(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Add the public bit when no visibility bit is set.
    pub const fn normalized(self) -> Self {
        if self.0 & Self::VISIBILITY_MASK == 0 {
            Modifiers(self.0 | Self::PUBLIC)
        } else {
            self
        }
    }

    /// Set additional bits.
    pub const fn with(self, bits: u32) -> Self {
        Modifiers(self.0 | bits)
    }

    fn has(&self, bit: u32) -> bool {
        self.0 & bit == bit
    }

    /// Effective visibility. Exactly one visibility is reported: the most
    /// restrictive bit set, or public when none is.
    pub fn visibility(&self) -> Visibility {
        if self.has(Self::PRIVATE) {
            Visibility::Private
        } else if self.has(Self::PROTECTED) {
            Visibility::Protected
        } else {
            Visibility::Public
        }
    }

    pub fn is_public(&self) -> bool {
        self.visibility() == Visibility::Public
    }

    pub fn is_protected(&self) -> bool {
        self.visibility() == Visibility::Protected
    }

    pub fn is_private(&self) -> bool {
        self.visibility() == Visibility::Private
    }

    pub fn is_static(&self) -> bool {
        self.has(Self::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.has(Self::ABSTRACT)
    }

    pub fn is_final(&self) -> bool {
        self.has(Self::FINAL)
    }
}

impl From<u32> for Modifiers {
    fn from(bits: u32) -> Self {
        Modifiers(bits)
    }
}

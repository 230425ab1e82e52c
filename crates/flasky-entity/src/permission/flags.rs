//! Bit-flag permissions and masks.
//!
//! Every named permission is a distinct power of two, so any mask built by
//! OR-ing them decomposes uniquely back into its members. The same type
//! serves as a single flag and as a role's combined mask.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A set of permission bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Permission(u32);

impl Permission {
    /// No permissions.
    pub const NONE: Self = Self(0);
    /// Follow other users.
    pub const FOLLOW: Self = Self(1);
    /// Comment on posts.
    pub const COMMENT: Self = Self(1 << 1);
    /// Write posts.
    pub const WRITE: Self = Self(1 << 2);
    /// Moderate other users' comments.
    pub const MODERATE: Self = Self(1 << 3);
    /// Administer the site.
    pub const ADMIN: Self = Self(1 << 4);

    /// Every named flag, in bit order.
    pub const ALL: [Self; 5] = [
        Self::FOLLOW,
        Self::COMMENT,
        Self::WRITE,
        Self::MODERATE,
        Self::ADMIN,
    ];

    const KNOWN_BITS: u32 = 0b1_1111;

    /// The raw mask.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Builds a mask from raw bits, rejecting bits outside the named flags.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::KNOWN_BITS == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Builds a mask from raw bits, dropping unknown bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::KNOWN_BITS)
    }

    /// `(self & other) == other`: every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sets the bits of `other`. No-op for bits already set.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`. No-op for bits already clear.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Iterates the named flags present in this mask.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Self::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }

    /// Name of a single named flag.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::FOLLOW => Some("FOLLOW"),
            Self::COMMENT => Some("COMMENT"),
            Self::WRITE => Some("WRITE"),
            Self::MODERATE => Some("MODERATE"),
            Self::ADMIN => Some("ADMIN"),
            _ => None,
        }
    }
}

impl BitOr for Permission {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permission {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permission {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl FromIterator<Permission> for Permission {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, |acc, p| acc | p)
    }
}

impl TryFrom<i32> for Permission {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(Self::from_bits)
            .ok_or_else(|| format!("invalid permission mask: {value}"))
    }
}

impl From<Permission> for i32 {
    fn from(value: Permission) -> i32 {
        // KNOWN_BITS fits comfortably in i32
        value.0 as i32
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Permission(NONE)");
        }
        let names: Vec<&str> = self.iter().filter_map(Permission::name).collect();
        write!(f, "Permission({})", names.join(" | "))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().filter_map(Permission::name).collect();
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

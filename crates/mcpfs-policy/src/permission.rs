//! Permission bit-set for filesystem operations.
//!
//! ```
//! use mcpfs_policy::Permission;
//!
//! let mask = Permission::parse(&["Read", " w "]).unwrap();
//! assert_eq!(mask, Permission::READ | Permission::WRITE);
//! assert_eq!(mask.to_string(), "read|write");
//! assert_eq!(Permission::NONE.to_string(), "none");
//! ```

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::UnknownPermission;

bitflags! {
    /// Operations a rule may grant on a path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permission: u8 {
        /// Read file contents or list directories.
        const READ  = 0b001;
        /// Create, modify, or remove entries.
        const WRITE = 0b010;
        /// Execute files.
        const EXEC  = 0b100;
    }
}

impl Permission {
    /// No operation granted.
    pub const NONE: Self = Self::empty();

    /// Parse a list of permission names into a combined mask.
    ///
    /// Names are matched case-insensitively after trimming whitespace. An
    /// empty list yields [`Permission::NONE`]; callers decide what an empty
    /// grant means.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, UnknownPermission> {
        names
            .iter()
            .try_fold(Self::NONE, |mask, name| Ok(mask | name.as_ref().parse::<Self>()?))
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" | "r" => Ok(Self::READ),
            "write" | "w" => Ok(Self::WRITE),
            "exec" | "execute" | "x" => Ok(Self::EXEC),
            _ => Err(UnknownPermission(s.to_string())),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = [
            (Self::READ, "read"),
            (Self::WRITE, "write"),
            (Self::EXEC, "exec"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        f.write_str(&names.join("|"))
    }
}

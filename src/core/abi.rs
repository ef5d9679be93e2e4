//! Target ABI rules.
//!
//! A computed layout is only meaningful for one target: the width of `long`,
//! the width of pointers, the signedness of plain `char` and the in-struct
//! alignment of 8-byte scalars all vary between platforms. [`AbiRules`]
//! captures the subset of those rules that affects struct layout.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::Primitive;

/// Target triple components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetTriple {
    /// CPU architecture (x86_64, aarch64, etc.)
    pub arch: String,
    /// Vendor (unknown, apple, pc, etc.)
    pub vendor: String,
    /// Operating system (linux, darwin, windows, etc.)
    pub os: String,
    /// Environment/ABI (gnu, musl, msvc, etc.)
    pub env: Option<String>,
}

impl TargetTriple {
    /// Create a new target triple.
    pub fn new(arch: &str, vendor: &str, os: &str, env: Option<&str>) -> Self {
        TargetTriple {
            arch: arch.to_string(),
            vendor: vendor.to_string(),
            os: os.to_string(),
            env: env.map(|s| s.to_string()),
        }
    }

    /// Detect the host target triple.
    pub fn host() -> Self {
        // Use Rust's target triple as approximation
        let arch = match std::env::consts::ARCH {
            "x86" => "i686",
            other => other,
        };
        let os = std::env::consts::OS;

        let (vendor, env) = match os {
            "linux" => ("unknown", Some("gnu")),
            "macos" => ("apple", None),
            "windows" => ("pc", Some("msvc")),
            _ => ("unknown", None),
        };

        TargetTriple::new(arch, vendor, os, env)
    }

    /// Parse a target triple string.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() < 3 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        Some(TargetTriple {
            arch: parts[0].to_string(),
            vendor: parts[1].to_string(),
            os: parts[2].to_string(),
            env: parts.get(3).map(|s| s.to_string()),
        })
    }

    fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    fn is_apple(&self) -> bool {
        self.vendor == "apple" || matches!(self.os.as_str(), "macos" | "darwin" | "ios")
    }

    fn is_x86_32(&self) -> bool {
        matches!(self.arch.as_str(), "i386" | "i486" | "i586" | "i686" | "x86")
    }

    fn pointer_width(&self) -> usize {
        let arch = self.arch.as_str();
        let is_32 = self.is_x86_32()
            || arch.starts_with("arm")
            || arch.starts_with("thumb")
            || arch == "wasm32"
            || arch == "riscv32"
            || arch == "mips"
            || arch == "mipsel"
            || arch == "powerpc";
        if is_32 {
            4
        } else {
            8
        }
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.env {
            Some(env) => write!(f, "{}-{}-{}-{}", self.arch, self.vendor, self.os, env),
            None => write!(f, "{}-{}-{}", self.arch, self.vendor, self.os),
        }
    }
}

/// C data model: widths of `int`, `long` and pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataModel {
    /// 64-bit Unix: 64-bit `long` and pointers.
    Lp64,
    /// 64-bit Windows: 32-bit `long`, 64-bit pointers.
    Llp64,
    /// 32-bit targets: 32-bit `int`, `long` and pointers.
    Ilp32,
}

impl DataModel {
    /// Width of C `long` in bytes.
    pub fn long_width(&self) -> usize {
        match self {
            DataModel::Lp64 => 8,
            DataModel::Llp64 | DataModel::Ilp32 => 4,
        }
    }
}

impl fmt::Display for DataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataModel::Lp64 => write!(f, "lp64"),
            DataModel::Llp64 => write!(f, "llp64"),
            DataModel::Ilp32 => write!(f, "ilp32"),
        }
    }
}

/// Layout-relevant ABI rules for one target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbiRules {
    /// Target these rules were derived from
    pub triple: TargetTriple,
    /// C data model
    pub data_model: DataModel,
    /// Pointer width in bytes
    pub pointer_width: usize,
    /// Whether plain `char` is signed
    pub char_signed: bool,
    /// Largest alignment a scalar receives inside a struct
    pub max_scalar_align: usize,
}

impl AbiRules {
    /// Derive the rules for a target triple.
    pub fn for_target(triple: &TargetTriple) -> Self {
        let pointer_width = triple.pointer_width();
        let data_model = match (pointer_width, triple.is_windows()) {
            (8, true) => DataModel::Llp64,
            (8, false) => DataModel::Lp64,
            _ => DataModel::Ilp32,
        };

        // i386 System V (and Darwin) only align `double` and `long long` to 4
        // inside structs; MSVC keeps natural alignment.
        let msvc = triple.env.as_deref() == Some("msvc") || triple.is_windows();
        let max_scalar_align = if triple.is_x86_32() && !msvc { 4 } else { 8 };

        let arch = triple.arch.as_str();
        let unsigned_char_arch = arch.starts_with("arm")
            || arch.starts_with("aarch64")
            || arch.starts_with("powerpc")
            || arch.starts_with("riscv")
            || arch == "s390x";
        let char_signed = !(unsigned_char_arch && !triple.is_apple() && !triple.is_windows());

        AbiRules {
            triple: triple.clone(),
            data_model,
            pointer_width,
            char_signed,
            max_scalar_align,
        }
    }

    /// Rules for the host platform.
    pub fn host() -> Self {
        Self::for_target(&TargetTriple::host())
    }

    /// Parse a triple and derive its rules.
    pub fn parse(triple: &str) -> Option<Self> {
        TargetTriple::parse(triple).map(|t| Self::for_target(&t))
    }

    /// Alignment of a primitive when placed inside a struct.
    pub fn primitive_align(&self, primitive: Primitive) -> usize {
        primitive.width().min(self.max_scalar_align)
    }

    /// Canonical one-line description, used in layout fingerprints.
    pub fn describe(&self) -> String {
        format!(
            "{} {} ptr={} char={} align<={}",
            self.triple,
            self.data_model,
            self.pointer_width,
            if self.char_signed { "signed" } else { "unsigned" },
            self.max_scalar_align
        )
    }
}

impl Default for AbiRules {
    fn default() -> Self {
        Self::host()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_triple() {
        let triple = TargetTriple::host();
        assert!(!triple.arch.is_empty());
        assert!(!triple.os.is_empty());
    }

    #[test]
    fn test_target_triple_parse() {
        let triple = TargetTriple::parse("x86_64-unknown-linux-gnu").unwrap();
        assert_eq!(triple.arch, "x86_64");
        assert_eq!(triple.vendor, "unknown");
        assert_eq!(triple.os, "linux");
        assert_eq!(triple.env, Some("gnu".to_string()));
        assert_eq!(triple.to_string(), "x86_64-unknown-linux-gnu");

        assert!(TargetTriple::parse("x86_64").is_none());
        assert!(TargetTriple::parse("x86_64--linux").is_none());
    }

    #[test]
    fn test_data_models() {
        let linux = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
        assert_eq!(linux.data_model, DataModel::Lp64);
        assert_eq!(linux.data_model.long_width(), 8);
        assert_eq!(linux.pointer_width, 8);

        let windows = AbiRules::parse("x86_64-pc-windows-msvc").unwrap();
        assert_eq!(windows.data_model, DataModel::Llp64);
        assert_eq!(windows.data_model.long_width(), 4);

        let i686 = AbiRules::parse("i686-unknown-linux-gnu").unwrap();
        assert_eq!(i686.data_model, DataModel::Ilp32);
        assert_eq!(i686.pointer_width, 4);
    }

    #[test]
    fn test_i386_double_alignment() {
        let i686 = AbiRules::parse("i686-unknown-linux-gnu").unwrap();
        assert_eq!(i686.primitive_align(Primitive::F64), 4);
        assert_eq!(i686.primitive_align(Primitive::U16), 2);

        let msvc = AbiRules::parse("i686-pc-windows-msvc").unwrap();
        assert_eq!(msvc.primitive_align(Primitive::F64), 8);

        let arm = AbiRules::parse("armv7-unknown-linux-gnueabihf").unwrap();
        assert_eq!(arm.primitive_align(Primitive::I64), 8);
    }

    #[test]
    fn test_char_signedness() {
        assert!(AbiRules::parse("x86_64-unknown-linux-gnu").unwrap().char_signed);
        assert!(!AbiRules::parse("aarch64-unknown-linux-gnu").unwrap().char_signed);
        assert!(AbiRules::parse("aarch64-apple-darwin").unwrap().char_signed);
    }
}

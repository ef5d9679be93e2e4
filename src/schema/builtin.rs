//! Schemas compiled into the binary.

use anyhow::Result;

use crate::schema::Schema;
use crate::util::diagnostic::suggestions;

/// An embedded schema.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
    pub source: &'static str,
}

/// Every embedded schema, sorted by name.
pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "harfbuzz",
        description: "HarfBuzz glyph info and position records",
        source: include_str!("../../schemas/harfbuzz.toml"),
    },
    Builtin {
        name: "zimg",
        description: "zimg image format and graph builder parameters",
        source: include_str!("../../schemas/zimg.toml"),
    },
];

/// Look up a builtin schema by name.
pub fn find(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Parse a builtin schema.
pub fn load(name: &str) -> Result<Schema> {
    match find(name) {
        Some(builtin) => Schema::parse(&format!("builtin:{}", builtin.name), builtin.source),
        None => anyhow::bail!(
            "no builtin schema named `{}`\n{}",
            name,
            suggestions::UNKNOWN_BUILTIN
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::abi::AbiRules;

    #[test]
    fn test_all_builtins_build() {
        let abi = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
        for builtin in BUILTINS {
            let schema = load(builtin.name).unwrap();
            let registry = schema.build(&abi).unwrap();
            assert!(!registry.is_empty(), "{} is empty", builtin.name);
        }
    }

    #[test]
    fn test_harfbuzz_glyph_info() {
        let abi = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
        let registry = load("harfbuzz").unwrap().build(&abi).unwrap();
        let info = registry.require("hb_glyph_info_t").unwrap();

        assert_eq!(info.size(), 20);
        assert_eq!(info.align(), 4);
        assert_eq!(info.field("var1").unwrap().offset, 12);
        assert_eq!(info.field("var2").unwrap().offset, 16);
    }

    #[test]
    fn test_zimg_sizes_follow_target() {
        let x64 = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
        let registry = load("zimg").unwrap().build(&x64).unwrap();
        let format = registry.require("zimg_image_format").unwrap();
        assert_eq!(format.size(), 96);
        assert_eq!(format.field("active_region").unwrap().offset, 56);
        assert_eq!(format.field("alpha").unwrap().offset, 88);
        assert_eq!(registry.require("zimg_graph_builder_params").unwrap().size(), 72);

        let i686 = AbiRules::parse("i686-unknown-linux-gnu").unwrap();
        let registry = load("zimg").unwrap().build(&i686).unwrap();
        assert_eq!(registry.require("zimg_image_format").unwrap().size(), 92);
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(find("cairo").is_none());
        assert!(load("cairo").is_err());
    }
}

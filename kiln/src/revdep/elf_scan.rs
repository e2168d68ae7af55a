// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use elf::{abi, endian::AnyEndian, ElfBytes};

/// `DT_NEEDED` sonames from an ELF file's dynamic section.
pub fn needed_sonames(bytes: &[u8]) -> Vec<String> {
    dynamic_strings(bytes, &[abi::DT_NEEDED])
}

/// `DT_RPATH`/`DT_RUNPATH` entries, each split on `:` the way the dynamic
/// linker treats a colon-separated search path, in declaration order.
pub fn rpath_entries(bytes: &[u8]) -> Vec<String> {
    dynamic_strings(bytes, &[abi::DT_RPATH, abi::DT_RUNPATH])
        .into_iter()
        .flat_map(|entry| entry.split(':').map(ToString::to_string).collect::<Vec<_>>())
        .collect()
}

/// Resolves every dynamic-section entry matching one of `tags` against the
/// `.dynstr` table (shared with the dynamic symbol table on every ELF
/// binary this tool targets).
fn dynamic_strings(bytes: &[u8], tags: &[i64]) -> Vec<String> {
    let Ok(elf) = ElfBytes::<AnyEndian>::minimal_parse(bytes) else {
        return Vec::new();
    };

    let Ok(Some(dynamic)) = elf.dynamic() else {
        return Vec::new();
    };
    let Ok(Some((_, strtab))) = elf.dynamic_symbol_table() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for entry in dynamic.iter() {
        if tags.contains(&entry.d_tag) {
            if let Ok(name) = strtab.get(entry.d_val() as usize) {
                out.push(name.to_string());
            }
        }
    }
    out
}

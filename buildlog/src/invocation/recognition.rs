// SPDX-License-Identifier: GPL-3.0-or-later

//! Maps compiler executables to a [`CompilerFamily`].
//!
//! Explicitly configured executables are looked up first. Otherwise the
//! file name of the executable is matched against well-known driver names,
//! including cross-compilation prefixes and version suffixes.

use super::compiler::CompilerFamily;
use crate::config;
use regex_lite::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Matches gcc, g++, cc, c++ with optional target prefix and version suffix.
static GCC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^/]*-)?(?:gcc|g\+\+|cc|c\+\+)(?:-[\d.]+)?$").expect("Invalid GCC regex pattern")
});

/// Matches clang and clang++ with optional target prefix and version suffix.
static CLANG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^/]*-)?clang(?:\+\+)?(?:-[\d.]+)?$").expect("Invalid Clang regex pattern")
});

#[derive(Debug, Default)]
pub struct Recognizer {
    configured: HashMap<PathBuf, CompilerFamily>,
}

impl Recognizer {
    pub fn new(compilers: &[config::Compiler]) -> Self {
        let configured = compilers.iter().map(|compiler| (compiler.path.clone(), compiler.as_)).collect();
        Self { configured }
    }

    /// Recognizes the compiler family of an executable.
    ///
    /// Returns `None` when the executable is neither configured nor looks
    /// like a known compiler driver.
    pub fn recognize(&self, executable: &Path) -> Option<CompilerFamily> {
        if let Some(family) = self.configured.get(executable) {
            return Some(*family);
        }

        let filename = executable.file_name()?.to_str()?;
        if CLANG_PATTERN.is_match(filename) {
            Some(CompilerFamily::Clang)
        } else if GCC_PATTERN.is_match(filename) {
            Some(CompilerFamily::Gcc)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_recognize_by_name() {
        let sut = Recognizer::default();

        let cases = vec![
            ("gcc", Some(CompilerFamily::Gcc)),
            ("/usr/bin/cc", Some(CompilerFamily::Gcc)),
            ("g++-12", Some(CompilerFamily::Gcc)),
            ("arm-linux-gnueabi-gcc", Some(CompilerFamily::Gcc)),
            ("clang", Some(CompilerFamily::Clang)),
            ("/opt/llvm/bin/clang++", Some(CompilerFamily::Clang)),
            ("aarch64-linux-gnu-clang-15", Some(CompilerFamily::Clang)),
            ("make", None),
            ("ld", None),
        ];

        for (executable, expected) in cases {
            assert_eq!(expected, sut.recognize(Path::new(executable)), "recognizing {executable}");
        }
    }

    #[test]
    fn test_configured_executable_wins() {
        let sut = Recognizer::new(&[
            config::Compiler { path: PathBuf::from("/usr/bin/cc"), as_: CompilerFamily::Clang },
            config::Compiler { path: PathBuf::from("/opt/tools/xcc"), as_: CompilerFamily::Gcc },
        ]);

        assert_eq!(Some(CompilerFamily::Clang), sut.recognize(Path::new("/usr/bin/cc")));
        assert_eq!(Some(CompilerFamily::Gcc), sut.recognize(Path::new("/opt/tools/xcc")));
        assert_eq!(Some(CompilerFamily::Gcc), sut.recognize(Path::new("/usr/local/bin/cc")));
    }
}

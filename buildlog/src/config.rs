// SPDX-License-Identifier: GPL-3.0-or-later

//! This module defines the configuration of the application.
//!
//! The configuration is either loaded from a file or used with default
//! values, which are defined in the code.
//!
//! The configuration file syntax is based on the YAML format.
//! The default configuration file name is `buildlog.yml`.
//!
//! The configuration file location is searched in the following order:
//! 1. The current working directory
//! 2. The local configuration directory of the user
//! 3. The configuration directory of the user
//! 4. The local configuration directory of the application
//! 5. The configuration directory of the application
//!
//! ```yaml
//! schema: 1.0
//!
//! source_root: /opt/project/
//! object_extension: o
//!
//! compilers:
//!   - path: /usr/local/bin/cc
//!     as: clang
//!   - path: /opt/cross/bin/xcc
//!     as: gcc
//! ```

// Re-Export the types and the loader module content.
pub use loader::{ConfigError, Loader};
pub use types::*;
pub use validation::{ValidationError, Validator};

mod types {
    use crate::invocation::compiler::{CompilerFamily, DEFAULT_OBJECT_EXTENSION};
    use serde::Deserialize;
    use std::fmt;
    use std::path::PathBuf;

    /// Represents the application configuration.
    #[derive(Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    pub struct Main {
        #[serde(deserialize_with = "validate_schema_version")]
        pub schema: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub source_root: Option<PathBuf>,
        #[serde(default = "default_object_extension")]
        pub object_extension: String,
        #[serde(default)]
        pub compilers: Vec<Compiler>,
    }

    impl Default for Main {
        fn default() -> Self {
            Self {
                schema: String::from(SUPPORTED_SCHEMA_VERSION),
                source_root: None,
                object_extension: default_object_extension(),
                compilers: vec![],
            }
        }
    }

    impl fmt::Display for Main {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "Configuration:")?;
            let yaml_string = serde_yml::to_string(self).map_err(|_| fmt::Error)?;
            for line in yaml_string.lines() {
                writeln!(f, "{}", line)?;
            }
            Ok(())
        }
    }

    /// Maps a compiler executable to the family its arguments are parsed as.
    #[derive(Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    pub struct Compiler {
        pub path: PathBuf,
        #[serde(rename = "as")]
        pub as_: CompilerFamily,
    }

    const SUPPORTED_SCHEMA_VERSION: &str = "1.0";

    fn default_object_extension() -> String {
        String::from(DEFAULT_OBJECT_EXTENSION)
    }

    // Custom deserialization function to validate the schema version
    fn validate_schema_version<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let schema: String = Deserialize::deserialize(deserializer)?;
        if schema != SUPPORTED_SCHEMA_VERSION {
            use serde::de::Error;
            Err(Error::custom(format!(
                "Unsupported schema version: {schema}. Expected: {SUPPORTED_SCHEMA_VERSION}"
            )))
        } else {
            Ok(schema)
        }
    }
}

pub mod validation {
    use super::types::*;
    use thiserror::Error;

    /// Trait for validating configuration objects
    pub trait Validator<T> {
        type Error: std::error::Error;

        fn validate(config: &T) -> Result<(), Self::Error>;
    }

    /// Validation errors for configuration
    #[derive(Debug, Error, PartialEq)]
    pub enum ValidationError {
        #[error("Empty string value for field '{field}'")]
        EmptyString { field: String },
        #[error("Duplicate {field} entry at: {idx}")]
        DuplicateEntry { field: &'static str, idx: usize },
        #[error("Invalid object extension '{value}': {message}")]
        InvalidExtension { value: String, message: &'static str },
        #[error("Multiple validation errors: {errors:?}")]
        Multiple { errors: Vec<ValidationError> },
    }

    /// Combinator for collecting and handling validation errors
    #[derive(Default)]
    struct ValidationCollector {
        errors: Vec<ValidationError>,
    }

    impl ValidationCollector {
        fn add(&mut self, error: ValidationError) {
            self.errors.push(error);
        }

        fn finish(mut self) -> Result<(), ValidationError> {
            match self.errors.len() {
                0 => Ok(()),
                1 => Err(self.errors.remove(0)),
                _ => Err(ValidationError::Multiple { errors: self.errors }),
            }
        }
    }

    impl Validator<Main> for Main {
        type Error = ValidationError;

        fn validate(config: &Main) -> Result<(), Self::Error> {
            let mut collector = ValidationCollector::default();

            if let Some(root) = &config.source_root {
                if root.as_os_str().is_empty() {
                    collector.add(ValidationError::EmptyString { field: "source_root".to_string() });
                }
            }

            let extension = &config.object_extension;
            if extension.is_empty() {
                collector.add(ValidationError::EmptyString { field: "object_extension".to_string() });
            } else if extension.starts_with('.') {
                collector.add(ValidationError::InvalidExtension {
                    value: extension.clone(),
                    message: "must not start with a dot",
                });
            } else if extension.contains(['/', '\\']) {
                collector.add(ValidationError::InvalidExtension {
                    value: extension.clone(),
                    message: "must not contain a path separator",
                });
            }

            let mut seen_paths = std::collections::HashSet::new();
            for (idx, compiler) in config.compilers.iter().enumerate() {
                if compiler.path.as_os_str().is_empty() {
                    collector.add(ValidationError::EmptyString { field: format!("compilers[{}].path", idx) });
                }
                if !seen_paths.insert(&compiler.path) {
                    collector.add(ValidationError::DuplicateEntry { field: "compiler", idx });
                }
            }

            collector.finish()
        }
    }

    #[cfg(test)]
    mod test {
        use super::*;
        use crate::invocation::compiler::CompilerFamily;
        use std::path::PathBuf;

        #[test]
        fn test_default_is_valid() {
            assert_eq!(Ok(()), Main::validate(&Main::default()));
        }

        #[test]
        fn test_single_error_is_not_wrapped() {
            let config = Main { object_extension: ".o".to_string(), ..Main::default() };

            assert_eq!(
                Err(ValidationError::InvalidExtension {
                    value: ".o".to_string(),
                    message: "must not start with a dot"
                }),
                Main::validate(&config)
            );
        }

        #[test]
        fn test_errors_are_collected() {
            let config = Main {
                source_root: Some(PathBuf::new()),
                object_extension: "obj/x".to_string(),
                compilers: vec![
                    Compiler { path: PathBuf::from("/usr/bin/cc"), as_: CompilerFamily::Gcc },
                    Compiler { path: PathBuf::from(""), as_: CompilerFamily::Gcc },
                    Compiler { path: PathBuf::from("/usr/bin/cc"), as_: CompilerFamily::Clang },
                ],
                ..Main::default()
            };

            let result = Main::validate(&config);

            assert_eq!(
                Err(ValidationError::Multiple {
                    errors: vec![
                        ValidationError::EmptyString { field: "source_root".to_string() },
                        ValidationError::InvalidExtension {
                            value: "obj/x".to_string(),
                            message: "must not contain a path separator"
                        },
                        ValidationError::EmptyString { field: "compilers[1].path".to_string() },
                        ValidationError::DuplicateEntry { field: "compiler", idx: 2 },
                    ]
                }),
                result
            );
        }
    }
}

pub mod loader {
    use super::{Main, Validator};
    use directories::{BaseDirs, ProjectDirs};
    use log::{debug, info};
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    const CONFIG_FILE_NAME: &str = "buildlog.yml";

    /// Finds, reads and checks the configuration file.
    pub struct Loader;

    impl Loader {
        /// An explicitly named file must exist. Without a name, the first
        /// `buildlog.yml` found in the search directories is used, and the
        /// built-in defaults when there is none.
        pub fn load(current_directory: &Path, filename: &Option<String>) -> Result<Main, ConfigError> {
            match filename {
                Some(name) => Self::from_file(Path::new(name)),
                None => match Self::search(current_directory) {
                    Some(path) => Self::from_file(&path),
                    None => {
                        debug!("No {CONFIG_FILE_NAME} found, using the defaults");
                        Ok(Main::default())
                    }
                },
            }
        }

        fn search(current_directory: &Path) -> Option<PathBuf> {
            Self::search_directories(current_directory)
                .into_iter()
                .map(|directory| directory.join(CONFIG_FILE_NAME))
                .inspect(|candidate| debug!("Looking for configuration at {}", candidate.display()))
                .find(|candidate| candidate.is_file())
        }

        /// The working directory first, then the user's and the
        /// application's config directories. Repeats are listed once.
        fn search_directories(current_directory: &Path) -> Vec<PathBuf> {
            let user = BaseDirs::new()
                .map(|dirs| [dirs.config_local_dir().to_path_buf(), dirs.config_dir().to_path_buf()]);
            let application = ProjectDirs::from("org", "buildlog", "buildlog")
                .map(|dirs| [dirs.config_local_dir().to_path_buf(), dirs.config_dir().to_path_buf()]);

            let mut directories: Vec<PathBuf> = Vec::new();
            let candidates = std::iter::once(current_directory.to_path_buf())
                .chain(user.into_iter().flatten())
                .chain(application.into_iter().flatten());
            for directory in candidates {
                if !directories.contains(&directory) {
                    directories.push(directory);
                }
            }
            directories
        }

        /// Reads the given file and validates its content.
        pub fn from_file(path: &Path) -> Result<Main, ConfigError> {
            info!("Reading configuration from {}", path.display());

            let file = fs::File::open(path)
                .map_err(|source| ConfigError::FileAccess { path: path.to_path_buf(), source })?;
            let config = Self::parse(io::BufReader::new(file))
                .map_err(|source| ConfigError::ParseError { path: path.to_path_buf(), source })?;
            Main::validate(&config)
                .map_err(|source| ConfigError::ValidationError { path: path.to_path_buf(), source })?;

            Ok(config)
        }

        fn parse(reader: impl io::Read) -> serde_yml::Result<Main> {
            serde_yml::from_reader(reader)
        }
    }

    /// Represents all possible configuration-related errors.
    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("Can't read configuration file '{path}': {source}")]
        FileAccess {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("Invalid configuration syntax in '{path}': {source}")]
        ParseError {
            path: PathBuf,
            #[source]
            source: serde_yml::Error,
        },
        #[error("Invalid configuration values in '{path}': {source}")]
        ValidationError {
            path: PathBuf,
            #[source]
            source: super::ValidationError,
        },
    }

    #[cfg(test)]
    mod test {
        use super::super::*;
        use super::*;
        use crate::invocation::compiler::CompilerFamily;
        use std::fs;

        #[test]
        fn test_full_config() {
            let content: &[u8] = br#"
            schema: 1.0

            source_root: /opt/project/
            object_extension: obj

            compilers:
              - path: /usr/local/bin/cc
                as: clang
              - path: /opt/cross/bin/xcc
                as: gnu
            "#;

            let result = Loader::parse(content).unwrap();

            let expected = Main {
                schema: String::from("1.0"),
                source_root: Some(PathBuf::from("/opt/project/")),
                object_extension: String::from("obj"),
                compilers: vec![
                    Compiler { path: PathBuf::from("/usr/local/bin/cc"), as_: CompilerFamily::Clang },
                    Compiler { path: PathBuf::from("/opt/cross/bin/xcc"), as_: CompilerFamily::Gcc },
                ],
            };

            assert_eq!(expected, result);
        }

        #[test]
        fn test_minimal_config() {
            let content: &[u8] = br#"
            schema: 1.0
            "#;

            let result = Loader::parse(content).unwrap();

            assert_eq!(Main::default(), result);
        }

        #[test]
        fn test_invalid_schema_version() {
            let content: &[u8] = br#"
            schema: 4.0
            "#;

            let result = Loader::parse(content);

            assert!(result.is_err());
            let message = result.unwrap_err().to_string();
            assert!(message.contains("Unsupported schema version: 4.0. Expected: 1.0"), "{message}");
        }

        #[test]
        fn test_unknown_compiler_family() {
            let content: &[u8] = br#"
            schema: 1.0
            compilers:
              - path: /usr/bin/nvcc
                as: cuda
            "#;

            let result = Loader::parse(content);

            assert!(result.is_err());
        }

        #[test]
        fn test_load_explicit_file() {
            let temp_dir = tempfile::tempdir().unwrap();
            let config_file = temp_dir.path().join("custom.yml");
            fs::write(&config_file, "schema: 1.0\nsource_root: /src/\n").unwrap();

            let name = Some(config_file.to_string_lossy().to_string());
            let result = Loader::load(temp_dir.path(), &name).unwrap();

            assert_eq!(Some(PathBuf::from("/src/")), result.source_root);
        }

        #[test]
        fn test_load_from_current_directory() {
            let temp_dir = tempfile::tempdir().unwrap();
            fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "schema: 1.0\nobject_extension: obj\n").unwrap();

            let result = Loader::load(temp_dir.path(), &None).unwrap();

            assert_eq!("obj", result.object_extension);
        }

        #[test]
        fn test_validation_error_on_invalid_config() {
            let temp_dir = tempfile::tempdir().unwrap();
            let config_file = temp_dir.path().join(CONFIG_FILE_NAME);
            fs::write(&config_file, "schema: 1.0\nobject_extension: \"\"\n").unwrap();

            let result = Loader::from_file(&config_file);

            assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
        }

        #[test]
        fn test_search_starts_in_current_directory() {
            let temp_dir = tempfile::tempdir().unwrap();

            let result = Loader::search_directories(temp_dir.path());

            assert_eq!(Some(&temp_dir.path().to_path_buf()), result.first());
            for (idx, directory) in result.iter().enumerate() {
                assert!(!result[idx + 1..].contains(directory), "{} is listed twice", directory.display());
            }
        }

        #[test]
        fn test_missing_explicit_file() {
            let temp_dir = tempfile::tempdir().unwrap();
            let name = Some(temp_dir.path().join("missing.yml").to_string_lossy().to_string());

            let result = Loader::load(temp_dir.path(), &name);

            assert!(matches!(result, Err(ConfigError::FileAccess { .. })));
        }
    }
}

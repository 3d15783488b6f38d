//! Target validation and command resolution.
//!
//! Given a language identifier and a file path, [`Resolver::resolve`] either
//! produces the argument vector that invokes the target or a typed
//! [`ResolveError`]. Checks run in a fixed order (extension, existence,
//! regular-file, permission), so a wrong-extension path on a nonexistent file
//! reports [`ResolveError::BadExtension`], not [`ResolveError::NotFound`].
//!
//! Resolution never touches a shell: the resolved [`Command`] is a program
//! plus argument list handed straight to the process-spawning API, so paths
//! with spaces or shell metacharacters need no quoting.

mod language;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub use language::{LanguageClass, Permission};

use crate::config::ExchangeConfig;

// ── Command ───────────────────────────────────────────────────────────────────

/// A shell-free invocation: program plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Program to launch (interpreter binary or the target itself).
    pub program: String,
    /// Arguments passed to the program, in order.
    pub args: Vec<String>,
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ── ResolveError ──────────────────────────────────────────────────────────────

/// Validation failure preventing a target from being invoked.
///
/// No process is spawned when any of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The language identifier matches no known class.
    UnsupportedLanguage {
        /// Identifier as supplied by the caller.
        language: String,
    },
    /// The file's extension is not accepted by the language class.
    BadExtension {
        /// Target path as supplied (after separator normalization).
        file: String,
        /// Language identifier as supplied by the caller.
        language: String,
        /// Example of an accepted extension, e.g. `.py`.
        expected: &'static str,
    },
    /// The target path does not exist.
    NotFound {
        /// Target path.
        file: String,
    },
    /// The target path exists but is not a regular file.
    NotAFile {
        /// Target path.
        file: String,
    },
    /// The target file lacks read permission required by its class.
    NotReadable {
        /// Target path.
        file: String,
    },
    /// The target file lacks execute permission required by its class.
    NotExecutable {
        /// Target path.
        file: String,
    },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLanguage { language } => {
                write!(f, "Unsupported language: {language}")
            }
            Self::BadExtension {
                file,
                language,
                expected,
            } => write!(
                f,
                "Invalid file '{file}' for language '{language}'. Expected: e.g. 'file{expected}'"
            ),
            Self::NotFound { file } => write!(f, "File not found: {file}"),
            Self::NotAFile { file } => write!(f, "Path is not a file: {file}"),
            Self::NotReadable { file } => write!(f, "File is not readable: {file}"),
            Self::NotExecutable { file } => write!(f, "File is not executable: {file}"),
        }
    }
}

impl std::error::Error for ResolveError {}

// ── Resolver ──────────────────────────────────────────────────────────────────

/// Validates targets and synthesizes their invocation commands.
///
/// A `Resolver` is cheap to construct and immutable once built. Interpreter
/// programs can be overridden per language class (e.g. `python` → `python3`)
/// via [`Resolver::with_interpreter`] or an [`ExchangeConfig`]; overrides
/// change which binary launches the target, never the validation rules.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    /// Interpreter overrides keyed by canonical language name.
    interpreters: HashMap<String, String>,
}

impl Resolver {
    /// Create a resolver using the default interpreter programs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver applying the interpreter overrides from `config`.
    #[must_use]
    pub fn from_config(config: &ExchangeConfig) -> Self {
        let interpreters = config
            .interpreters
            .iter()
            .map(|(lang, program)| (lang.to_ascii_lowercase(), program.clone()))
            .collect();
        Self { interpreters }
    }

    /// Override the interpreter program for one language class.
    ///
    /// `language` accepts the same aliases as [`Resolver::resolve`]; an
    /// unknown identifier is stored verbatim and never matched.
    #[must_use]
    pub fn with_interpreter(mut self, language: &str, program: &str) -> Self {
        let key = language
            .parse::<LanguageClass>()
            .map_or_else(|_| language.to_ascii_lowercase(), |c| c.canonical_name().to_owned());
        self.interpreters.insert(key, program.to_owned());
        self
    }

    /// Validate `target` for `language` and synthesize its invocation.
    ///
    /// Check order is fixed: extension, then existence, then regular-file,
    /// then permission. The first violated check wins.
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`] variant; see the variant docs.
    pub fn resolve(&self, language: &str, target: &str) -> Result<Command, ResolveError> {
        let class: LanguageClass = language.parse()?;
        let file = normalize_separators(target);
        let extension = extension_of(&file);

        if let Some(allowed) = class.allowed_extensions() {
            if !allowed.contains(&extension.as_str()) {
                return Err(ResolveError::BadExtension {
                    file,
                    language: language.to_owned(),
                    expected: class.example_extension(),
                });
            }
        }

        let path = Path::new(&file);
        if !path.exists() {
            return Err(ResolveError::NotFound { file });
        }
        if !path.is_file() {
            return Err(ResolveError::NotAFile { file });
        }

        match class.required_permission(&extension) {
            Permission::Read => {
                if !is_readable(path) {
                    return Err(ResolveError::NotReadable { file });
                }
            }
            Permission::Execute => {
                if !is_executable(path) {
                    return Err(ResolveError::NotExecutable { file });
                }
            }
        }

        Ok(self.synthesize(class, &extension, file))
    }

    /// Build the argument vector for a validated target.
    fn synthesize(&self, class: LanguageClass, extension: &str, file: String) -> Command {
        match class {
            LanguageClass::Python | LanguageClass::JavaScript | LanguageClass::Ruby => Command {
                program: self.interpreter_for(class),
                args: vec![file],
            },
            LanguageClass::Java => {
                if extension == "jar" {
                    Command {
                        program: self.interpreter_for(class),
                        args: vec!["-jar".to_owned(), file],
                    }
                } else {
                    // A bare .class file runs as `java -cp <dir> <ClassName>`.
                    let path = Path::new(&file);
                    let dir = path
                        .parent()
                        .map(|p| p.to_string_lossy().into_owned())
                        .filter(|p| !p.is_empty())
                        .unwrap_or_else(|| ".".to_owned());
                    let class_name = path
                        .file_stem()
                        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
                    Command {
                        program: self.interpreter_for(class),
                        args: vec!["-cp".to_owned(), dir, class_name],
                    }
                }
            }
            LanguageClass::CSharp => {
                if extension == "dll" {
                    Command {
                        program: self.interpreter_for(class),
                        args: vec![file],
                    }
                } else {
                    direct(file)
                }
            }
            LanguageClass::Go => {
                if extension == "go" {
                    Command {
                        program: self.interpreter_for(class),
                        args: vec!["run".to_owned(), file],
                    }
                } else {
                    direct(file)
                }
            }
            LanguageClass::NativeBinary => direct(file),
        }
    }

    /// Interpreter program for `class`: the configured override, or the default.
    fn interpreter_for(&self, class: LanguageClass) -> String {
        if let Some(program) = self.interpreters.get(class.canonical_name()) {
            return program.clone();
        }
        class
            .default_interpreter()
            .unwrap_or(class.canonical_name())
            .to_owned()
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Normalize path separators for the host platform.
fn normalize_separators(target: &str) -> String {
    if cfg!(windows) {
        target.replace('/', "\\")
    } else {
        target.to_owned()
    }
}

/// Lowercased extension without the leading dot; empty when absent.
fn extension_of(file: &str) -> String {
    Path::new(file)
        .extension()
        .map_or_else(String::new, |ext| {
            ext.to_string_lossy().to_ascii_lowercase()
        })
}

/// Prefix a relative directly-executed path with the current-dir marker.
///
/// Spawning by argument vector does not consult the current directory for
/// bare names on Unix, so `prog` must become `./prog` to launch a binary
/// sitting next to the caller.
fn direct(file: String) -> Command {
    let path = Path::new(&file);
    let program = if path.is_absolute() || file.starts_with("./") || file.starts_with(".\\") {
        file
    } else if cfg!(windows) {
        format!(".\\{file}")
    } else {
        format!("./{file}")
    };
    Command {
        program,
        args: Vec::new(),
    }
}

#[cfg(unix)]
fn is_readable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o444 != 0)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 != 0)
}

// Permission probes are a Unix concept; elsewhere the spawn itself is the test.
#[cfg(not(unix))]
fn is_readable(_path: &Path) -> bool {
    true
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

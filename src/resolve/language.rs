//! Language classes and their invocation rules.
//!
//! A language class bundles everything the resolver needs to know about one
//! family of targets: which identifier aliases select it, which file
//! extensions it accepts, which permission the target file must carry, and
//! which interpreter (if any) launches it.
//!
//! | Class          | Aliases                                        | Extensions      | Permission          |
//! |----------------|------------------------------------------------|-----------------|---------------------|
//! | `Python`       | `python`, `py`                                 | `.py`           | read                |
//! | `JavaScript`   | `javascript`, `js`, `node`, `nodejs`           | `.js`           | read                |
//! | `Ruby`         | `ruby`, `rb`                                   | `.rb`           | read                |
//! | `Java`         | `java`, `jar`                                  | `.jar`, `.class`| read                |
//! | `CSharp`       | `cs`, `c#`, `csharp`, `dotnet`                 | any             | read (dll) / execute|
//! | `NativeBinary` | `c`, `cpp`, `c++`, `cplusplus`, `cxx`, `rust`, `rs`, `exe` | any | execute  |
//! | `Go`           | `go`, `golang`                                 | any             | execute             |

use std::str::FromStr;

use crate::resolve::ResolveError;

/// Permission class a target file must satisfy before it can be invoked.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Permission {
    /// The file is source or bytecode handed to an interpreter.
    Read,
    /// The file is launched directly by the OS.
    Execute,
}

/// One family of invokable targets.
///
/// Parsed case-insensitively from the caller-supplied language identifier;
/// unknown identifiers are a validation failure, never a silent default.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LanguageClass {
    /// CPython scripts, run via `python <file>`.
    Python,
    /// Node.js scripts, run via `node <file>`.
    JavaScript,
    /// Ruby scripts, run via `ruby <file>`.
    Ruby,
    /// JVM archives and classes, run via `java -jar` / `java -cp`.
    Java,
    /// .NET assemblies (`dotnet <file>`) or self-contained executables.
    CSharp,
    /// Natively-compiled binaries (C, C++, Rust, anything executable).
    NativeBinary,
    /// Go sources (`go run`) or compiled Go binaries.
    Go,
}

impl LanguageClass {
    /// Extensions this class accepts (without the leading dot, lowercase), or
    /// `None` when the extension is unconstrained.
    #[must_use]
    pub fn allowed_extensions(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Python => Some(&["py"]),
            Self::JavaScript => Some(&["js"]),
            Self::Ruby => Some(&["rb"]),
            Self::Java => Some(&["jar", "class"]),
            Self::CSharp | Self::NativeBinary | Self::Go => None,
        }
    }

    /// Example of an accepted extension, used in validation messages.
    #[must_use]
    pub fn example_extension(self) -> &'static str {
        match self {
            Self::Python => ".py",
            Self::JavaScript => ".js",
            Self::Ruby => ".rb",
            Self::Java => ".jar",
            Self::CSharp => ".dll",
            Self::NativeBinary | Self::Go => "",
        }
    }

    /// Permission the target file must carry, given its extension.
    #[must_use]
    pub fn required_permission(self, extension: &str) -> Permission {
        match self {
            Self::Python | Self::JavaScript | Self::Ruby | Self::Java => Permission::Read,
            // A .NET assembly is read by the dotnet host; a self-contained
            // publish output is executed directly.
            Self::CSharp => {
                if extension == "dll" {
                    Permission::Read
                } else {
                    Permission::Execute
                }
            }
            Self::NativeBinary | Self::Go => Permission::Execute,
        }
    }

    /// Default interpreter program, or `None` for directly-executed targets.
    #[must_use]
    pub fn default_interpreter(self) -> Option<&'static str> {
        match self {
            Self::Python => Some("python"),
            Self::JavaScript => Some("node"),
            Self::Ruby => Some("ruby"),
            Self::Java => Some("java"),
            Self::CSharp => Some("dotnet"),
            Self::Go => Some("go"),
            Self::NativeBinary => None,
        }
    }

    /// Canonical identifier, used as the key for interpreter overrides.
    #[must_use]
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::Ruby => "ruby",
            Self::Java => "java",
            Self::CSharp => "csharp",
            Self::NativeBinary => "native",
            Self::Go => "go",
        }
    }
}

impl FromStr for LanguageClass {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "javascript" | "js" | "node" | "nodejs" => Ok(Self::JavaScript),
            "ruby" | "rb" => Ok(Self::Ruby),
            "java" | "jar" => Ok(Self::Java),
            "cs" | "c#" | "csharp" | "dotnet" => Ok(Self::CSharp),
            "c" | "cpp" | "c++" | "cplusplus" | "cxx" | "rust" | "rs" | "exe" => {
                Ok(Self::NativeBinary)
            }
            "go" | "golang" => Ok(Self::Go),
            _ => Err(ResolveError::UnsupportedLanguage {
                language: s.to_owned(),
            }),
        }
    }
}

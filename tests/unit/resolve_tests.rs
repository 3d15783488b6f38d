//! Unit tests for target validation and command resolution.
//!
//! Covers the documented check order (extension → existence → regular-file →
//! permission), the per-class command templates, and interpreter overrides.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crosscall::{ExchangeConfig, ResolveError, Resolver};

/// Create a file with the given permission mode inside `dir`.
fn make_file(dir: &TempDir, name: &str, mode: u32) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"#!/bin/sh\n").expect("fixture file must be writable");
    set_mode(&path, mode);
    path
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .expect("fixture permissions must be settable");
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

// ── Check ordering ────────────────────────────────────────────────────────────

/// An unknown language identifier fails before any filesystem access.
#[test]
fn unsupported_language_is_rejected() {
    let result = Resolver::new().resolve("cobol", "program.cbl");
    match result {
        Err(ResolveError::UnsupportedLanguage { language }) => assert_eq!(language, "cobol"),
        other => panic!("expected UnsupportedLanguage, got: {other:?}"),
    }
}

/// A wrong extension on a nonexistent file reports the extension, not the
/// missing file: the extension check precedes the existence check.
#[test]
fn extension_check_precedes_existence() {
    let result = Resolver::new().resolve("python", "missing_dir/script.txt");
    match result {
        Err(ResolveError::BadExtension { file, language, .. }) => {
            assert!(file.ends_with("script.txt"));
            assert_eq!(language, "python");
        }
        other => panic!("expected BadExtension, got: {other:?}"),
    }
}

/// The BadExtension message names the file, the language, and an example of
/// an accepted extension.
#[test]
fn bad_extension_message_names_file_language_and_example() {
    let err = Resolver::new()
        .resolve("python", "script.txt")
        .err()
        .expect("wrong extension must fail");
    let msg = err.to_string();
    assert!(msg.contains("Invalid file 'script.txt'"), "got: {msg}");
    assert!(msg.contains("language 'python'"), "got: {msg}");
    assert!(msg.contains(".py"), "got: {msg}");
}

/// A well-formed path to a file that does not exist reports NotFound.
#[test]
fn missing_file_with_right_extension_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("no_such.py");
    let result = Resolver::new().resolve("python", &path.to_string_lossy());
    assert!(
        matches!(result, Err(ResolveError::NotFound { .. })),
        "expected NotFound, got: {result:?}"
    );
}

/// A directory that happens to carry a valid extension is not a target.
#[test]
fn directory_target_is_not_a_file() {
    let dir = TempDir::new().expect("tempdir");
    let nested = dir.path().join("package.py");
    fs::create_dir(&nested).expect("fixture dir");
    let result = Resolver::new().resolve("python", &nested.to_string_lossy());
    assert!(
        matches!(result, Err(ResolveError::NotAFile { .. })),
        "expected NotAFile, got: {result:?}"
    );
}

/// Script targets need read permission; a mode-0 file fails the last check.
#[cfg(unix)]
#[test]
fn unreadable_script_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = make_file(&dir, "locked.py", 0o000);
    let result = Resolver::new().resolve("python", &path.to_string_lossy());
    assert!(
        matches!(result, Err(ResolveError::NotReadable { .. })),
        "expected NotReadable, got: {result:?}"
    );
}

/// Native binaries need execute permission; a plain 0644 file fails.
#[cfg(unix)]
#[test]
fn non_executable_binary_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = make_file(&dir, "tool", 0o644);
    let result = Resolver::new().resolve("rust", &path.to_string_lossy());
    assert!(
        matches!(result, Err(ResolveError::NotExecutable { .. })),
        "expected NotExecutable, got: {result:?}"
    );
}

// ── Command templates ─────────────────────────────────────────────────────────

/// Script classes run through their interpreter with the file as the only
/// argument, and aliases resolve case-insensitively.
#[test]
fn script_classes_use_their_interpreters() {
    let dir = TempDir::new().expect("tempdir");
    let resolver = Resolver::new();

    let py = make_file(&dir, "job.py", 0o644);
    let command = resolver
        .resolve("PyThOn", &py.to_string_lossy())
        .expect("python target must resolve");
    assert_eq!(command.program, "python");
    assert_eq!(command.args, vec![py.to_string_lossy().into_owned()]);

    let js = make_file(&dir, "job.js", 0o644);
    let command = resolver
        .resolve("nodejs", &js.to_string_lossy())
        .expect("node target must resolve");
    assert_eq!(command.program, "node");

    let rb = make_file(&dir, "job.rb", 0o644);
    let command = resolver
        .resolve("RB", &rb.to_string_lossy())
        .expect("ruby target must resolve");
    assert_eq!(command.program, "ruby");
}

/// A .jar archive runs as `java -jar <file>`.
#[test]
fn jar_runs_via_dash_jar() {
    let dir = TempDir::new().expect("tempdir");
    let jar = make_file(&dir, "app.jar", 0o644);
    let command = Resolver::new()
        .resolve("java", &jar.to_string_lossy())
        .expect("jar target must resolve");
    assert_eq!(command.program, "java");
    assert_eq!(
        command.args,
        vec!["-jar".to_owned(), jar.to_string_lossy().into_owned()]
    );
}

/// A bare .class file runs as `java -cp <dir> <ClassName>`.
#[test]
fn class_file_splits_into_classpath_and_name() {
    let dir = TempDir::new().expect("tempdir");
    let class = make_file(&dir, "Main.class", 0o644);
    let command = Resolver::new()
        .resolve("java", &class.to_string_lossy())
        .expect("class target must resolve");
    assert_eq!(command.program, "java");
    assert_eq!(
        command.args,
        vec![
            "-cp".to_owned(),
            dir.path().to_string_lossy().into_owned(),
            "Main".to_owned(),
        ]
    );
}

/// A .NET assembly runs via the dotnet host and only needs read permission.
#[test]
fn dll_runs_via_dotnet_with_read_permission() {
    let dir = TempDir::new().expect("tempdir");
    let dll = make_file(&dir, "service.dll", 0o644);
    let command = Resolver::new()
        .resolve("csharp", &dll.to_string_lossy())
        .expect("dll target must resolve");
    assert_eq!(command.program, "dotnet");
    assert_eq!(command.args, vec![dll.to_string_lossy().into_owned()]);
}

/// A self-contained .NET executable is launched directly and must be
/// executable.
#[cfg(unix)]
#[test]
fn csharp_exe_runs_directly() {
    let dir = TempDir::new().expect("tempdir");
    let exe = make_file(&dir, "service.exe", 0o755);
    let command = Resolver::new()
        .resolve("c#", &exe.to_string_lossy())
        .expect("exe target must resolve");
    assert_eq!(command.program, exe.to_string_lossy());
    assert!(command.args.is_empty());
}

/// Go sources run through the toolchain; compiled Go binaries run directly.
#[cfg(unix)]
#[test]
fn go_source_uses_toolchain_and_binary_runs_directly() {
    let dir = TempDir::new().expect("tempdir");
    let resolver = Resolver::new();

    let source = make_file(&dir, "main.go", 0o755);
    let command = resolver
        .resolve("go", &source.to_string_lossy())
        .expect("go source must resolve");
    assert_eq!(command.program, "go");
    assert_eq!(
        command.args,
        vec!["run".to_owned(), source.to_string_lossy().into_owned()]
    );

    let binary = make_file(&dir, "gotool", 0o755);
    let command = resolver
        .resolve("golang", &binary.to_string_lossy())
        .expect("go binary must resolve");
    assert_eq!(command.program, binary.to_string_lossy());
    assert!(command.args.is_empty());
}

/// Native binaries have no extension constraint.
#[cfg(unix)]
#[test]
fn native_binary_accepts_any_extension() {
    let dir = TempDir::new().expect("tempdir");
    let odd = make_file(&dir, "tool.weird", 0o755);
    let result = Resolver::new().resolve("c++", &odd.to_string_lossy());
    assert!(result.is_ok(), "expected success, got: {result:?}");
}

/// A relative directly-executed target gains the current-directory prefix so
/// the argv spawn does not fall back to a PATH lookup.
#[cfg(unix)]
#[test]
#[serial_test::serial]
fn relative_native_binary_gets_current_dir_prefix() {
    let dir = TempDir::new().expect("tempdir");
    make_file(&dir, "tool", 0o755);

    let original = std::env::current_dir().expect("cwd");
    std::env::set_current_dir(dir.path()).expect("chdir into tempdir");
    let result = Resolver::new().resolve("rust", "tool");
    std::env::set_current_dir(original).expect("chdir back");

    let command = result.expect("relative target must resolve");
    assert_eq!(command.program, "./tool");
}

// ── Interpreter overrides ─────────────────────────────────────────────────────

/// An override swaps the interpreter program without touching validation.
#[test]
fn interpreter_override_changes_program_only() {
    let dir = TempDir::new().expect("tempdir");
    let py = make_file(&dir, "job.py", 0o644);

    let resolver = Resolver::new().with_interpreter("py", "python3");
    let command = resolver
        .resolve("python", &py.to_string_lossy())
        .expect("python target must resolve");
    assert_eq!(command.program, "python3");

    // Validation rules are untouched: wrong extension still fails first.
    let result = resolver.resolve("python", "nope.txt");
    assert!(matches!(result, Err(ResolveError::BadExtension { .. })));
}

/// Overrides load from configuration under the language's canonical name.
#[test]
fn interpreter_override_loads_from_config() {
    let dir = TempDir::new().expect("tempdir");
    let js = make_file(&dir, "job.js", 0o644);

    let config = ExchangeConfig::from_toml_str(
        r#"
        [interpreters]
        javascript = "deno"
        "#,
    )
    .expect("config must parse");
    let resolver = Resolver::from_config(&config);

    let command = resolver
        .resolve("node", &js.to_string_lossy())
        .expect("js target must resolve");
    assert_eq!(command.program, "deno");
}

#![allow(clippy::disallowed_methods)]

use std::{fs, path::Path, process::Command};

use tempfile::TempDir;

fn write_module(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

fn run_deopt(args: &[&str], cwd: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_deopt"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run deopt")
}

#[test]
fn test_cli_writes_fragments() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_module(root, "lib/util.js", "exports.answer = 42");
    write_module(root, "node_modules/foo-impl/index.js", "module.exports = 'foo'");
    write_module(root, "main.js", "console.log(require('foo'))");

    let output = run_deopt(
        &[
            "lib/util.js",
            "node_modules/foo-impl/index.js",
            "--entry",
            "main.js",
            "--alias",
            "foo=foo-impl",
            "--out-dir",
            "out",
            "--manifest",
        ],
        root,
    );
    assert!(
        output.status.success(),
        "deopt failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let out = root.join("out");
    for fragment in [
        "browserify-prelude.js",
        "browserify-aliases.js",
        "browserify-entry.js",
        "lib/util.js",
        "main.js",
        "node_modules/foo-impl/index.js",
        "deopt-manifest.json",
    ] {
        assert!(out.join(fragment).is_file(), "missing {fragment}");
    }

    let entry = fs::read_to_string(out.join("browserify-entry.js")).unwrap();
    assert_eq!(entry, "require(\"/main.js\");\n");
}

#[test]
fn test_cli_reads_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_module(root, "web/a.js", "module.exports = 1");
    fs::write(
        root.join("deopt.toml"),
        "base_dir = \"web\"\nout_dir = \"dist\"\nfiles = [\"a.js\"]\n",
    )
    .unwrap();

    let output = run_deopt(&[], root);
    assert!(
        output.status.success(),
        "deopt failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let fragment = fs::read_to_string(root.join("web/dist/a.js")).unwrap();
    assert!(fragment.starts_with("require.define(\"/a.js\", "));
    assert!(!root.join("web/dist/browserify-entry.js").exists());
}

#[test]
fn test_cli_reports_missing_module() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_deopt(&["missing.js"], temp_dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read module"), "stderr: {stderr}");
}

//! CLI integration tests for cmake-bridge.
//!
//! The offline `translate` command is driven with a code model written into
//! a temporary directory, so no CMake installation is needed.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Get the cmake-bridge binary command.
fn cmake_bridge() -> Command {
    Command::cargo_bin("cmake-bridge").unwrap()
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// A code model with an executable linking a static library.
fn demo_code_model(source: &Path, build_root: &Path) -> Value {
    let cmake_build = build_root.join("sub").join("__CMake_build");

    json!({
        "configurations": [{
            "name": "Debug",
            "projects": [{
                "name": "demo",
                "sourceDirectory": path_str(source),
                "buildDirectory": path_str(&cmake_build),
                "targets": [
                    {
                        "name": "app",
                        "fullName": "app",
                        "type": "EXECUTABLE",
                        "sourceDirectory": path_str(source),
                        "buildDirectory": path_str(&cmake_build),
                        "artifacts": [path_str(&cmake_build.join("app"))],
                        "hasInstallRule": true,
                        "installPaths": ["/usr/local/bin"],
                        "linkLibraries": "libcore.a -lm",
                        "fileGroups": [{
                            "language": "C",
                            "compileFlags": "-O2 -fPIE",
                            "includePath": [{"path": path_str(&source.join("include"))}],
                            "sources": ["main.c"],
                            "isGenerated": false
                        }]
                    },
                    {
                        "name": "core",
                        "fullName": "libcore.a",
                        "type": "STATIC_LIBRARY",
                        "sourceDirectory": path_str(source),
                        "buildDirectory": path_str(&cmake_build),
                        "artifacts": [path_str(&cmake_build.join("libcore.a"))],
                        "fileGroups": [{
                            "language": "C",
                            "compileFlags": "-std=c99 -fPIC",
                            "defines": ["CORE_BUILD"],
                            "sources": ["core.c", "util.c"],
                            "isGenerated": false
                        }]
                    },
                    {
                        "name": "docs",
                        "fullName": "docs",
                        "type": "UTILITY",
                        "sourceDirectory": path_str(source)
                    }
                ]
            }]
        }]
    })
}

/// Write the demo code model and return `(tmp, codemodel path)`.
fn setup_translate() -> (TempDir, std::path::PathBuf) {
    let tmp = temp_dir();
    let source = tmp.path().join("sub");
    let build_root = tmp.path().join("build");
    fs::create_dir_all(&source).unwrap();

    let model_path = tmp.path().join("codemodel.json");
    let model = demo_code_model(&source, &build_root);
    fs::write(&model_path, serde_json::to_string_pretty(&model).unwrap()).unwrap();

    (tmp, model_path)
}

fn translate_args(tmp: &TempDir, model_path: &Path) -> Vec<String> {
    vec![
        "translate".to_string(),
        path_str(model_path),
        "--source-dir".to_string(),
        path_str(&tmp.path().join("sub")),
        "--build-root".to_string(),
        path_str(&tmp.path().join("build")),
        "--subdir".to_string(),
        "sub".to_string(),
    ]
}

// ============================================================================
// cmake-bridge translate
// ============================================================================

#[test]
fn test_translate_prints_statements() {
    let (tmp, model_path) = setup_translate();

    let output = cmake_bridge()
        .args(translate_args(&tmp, &model_path))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("project('demo', 'c')\n"))
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("core = static_library("));
    assert!(text.contains("app = executable("));
    assert!(text.contains("link_with : [core]"));
    assert!(text.contains("'c_std=c99'"));
    assert!(text.contains("install_dir : 'bin'"));
    assert!(!text.contains("docs"));

    // Dependencies are emitted before their dependents
    assert!(text.find("core = static_library(").unwrap() < text.find("app = executable(").unwrap());
    assert!(text.find("core_dep =").unwrap() < text.find("app_inc =").unwrap());
}

#[test]
fn test_translate_json_format() {
    let (tmp, model_path) = setup_translate();

    let output = cmake_bridge()
        .args(translate_args(&tmp, &model_path))
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["name"], "demo");
    assert_eq!(report["languages"], json!(["c"]));

    let targets = report["targets"].as_array().unwrap();
    assert_eq!(targets.len(), 2);

    let app = targets.iter().find(|t| t["name"] == "app").unwrap();
    assert_eq!(app["function"], "executable");
    assert_eq!(app["link_with"], json!(["libcore.a"]));
    assert_eq!(app["link_libraries"], json!(["-lm"]));
    assert_eq!(app["position_independent"], true);

    let core = targets.iter().find(|t| t["name"] == "core").unwrap();
    assert_eq!(core["function"], "static_library");
    assert_eq!(core["override_options"], json!(["c_std=c99"]));
}

#[test]
fn test_translate_writes_output_file() {
    let (tmp, model_path) = setup_translate();
    let out = tmp.path().join("out").join("meson.build");

    cmake_bridge()
        .args(translate_args(&tmp, &model_path))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("project('demo', 'c')\n"));
}

#[test]
fn test_translate_accepts_full_reply() {
    let (tmp, model_path) = setup_translate();

    let mut reply: Value = serde_json::from_str(&fs::read_to_string(&model_path).unwrap()).unwrap();
    reply["type"] = json!("reply");
    reply["inReplyTo"] = json!("codemodel");
    reply["cookie"] = json!("bridge_5");
    fs::write(&model_path, serde_json::to_string(&reply).unwrap()).unwrap();

    cmake_bridge()
        .args(translate_args(&tmp, &model_path))
        .assert()
        .success()
        .stdout(predicate::str::contains("core = static_library("));
}

#[test]
fn test_translate_reports_cycles() {
    let tmp = temp_dir();
    let source = tmp.path().join("sub");
    let target = |name: &str, other: &str| {
        json!({
            "name": name,
            "fullName": format!("lib{}.a", name),
            "type": "STATIC_LIBRARY",
            "sourceDirectory": path_str(&source),
            "linkLibraries": format!("lib{}.a", other),
            "fileGroups": [{"language": "C", "sources": [format!("{}.c", name)]}]
        })
    };
    let model = json!({
        "configurations": [{
            "projects": [{"name": "loop", "targets": [target("a", "b"), target("b", "a")]}]
        }]
    });
    let model_path = tmp.path().join("codemodel.json");
    fs::write(&model_path, model.to_string()).unwrap();

    cmake_bridge()
        .args(translate_args(&tmp, &model_path))
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency cycle"))
        .stderr(predicate::str::contains("liba.a, libb.a"));
}

#[test]
fn test_translate_missing_file() {
    let tmp = temp_dir();
    let model_path = tmp.path().join("missing.json");

    cmake_bridge()
        .args(translate_args(&tmp, &model_path))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read file"));
}

#[test]
fn test_translate_invalid_json() {
    let tmp = temp_dir();
    let model_path = tmp.path().join("codemodel.json");
    fs::write(&model_path, "{ not json").unwrap();

    cmake_bridge()
        .args(translate_args(&tmp, &model_path))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse code model"));
}

// ============================================================================
// cmake-bridge convert
// ============================================================================

#[test]
fn test_convert_requires_cmakelists() {
    let tmp = temp_dir();

    cmake_bridge()
        .arg("convert")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no CMakeLists.txt found"));
}

#[test]
fn test_convert_unsupported_backend() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("CMakeLists.txt"), "project(demo C)\n").unwrap();

    cmake_bridge()
        .arg("convert")
        .arg(tmp.path())
        .args(["--backend", "make"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no CMake generator for backend `make`"));

    assert!(!tmp.path().join("build").exists());
}

// ============================================================================
// cmake-bridge completions
// ============================================================================

#[test]
fn test_completions_bash() {
    cmake_bridge()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cmake-bridge"));
}

#[test]
fn test_help_lists_commands() {
    cmake_bridge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("translate"))
        .stdout(predicate::str::contains("codemodel"));
}

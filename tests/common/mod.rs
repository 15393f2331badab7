//! Fake inference binaries for end-to-end tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Echoes its backend and prompt back as an answer, framed by log lines and a
/// benchmark block the way the real binary prints them.
pub const ECHO_SCRIPT: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --backend=*) BACKEND="${arg#--backend=}" ;;
    --input_prompt=*) PROMPT="${arg#--input_prompt=}" ;;
  esac
done
echo "I0000 00:00:00.000 engine.cc:42] Loading model"
echo "WARNING: All log messages before absl::InitializeLog() is called are written to STDERR" >&2
echo "Response: [$BACKEND] $PROMPT"
echo "BenchmarkInfo:"
echo "  Prefill: 118.4 tokens/sec"
echo "  Decode: 21.7 tokens/sec"
echo "  Peak memory: 912.5 MB"
"#;

pub const FATAL_SCRIPT: &str = r#"#!/bin/sh
echo "I0000 00:00:00.000 engine.cc:42] Loading model"
echo "F0000 00:00:00.100 model.cc:7] Check failure: model load" >&2
exit 1
"#;

pub const NON_FATAL_SCRIPT: &str = r#"#!/bin/sh
echo "E0000 00:00:00.000 main.cc:3] unsupported backend" >&2
exit 3
"#;

pub const SILENT_SCRIPT: &str = r#"#!/bin/sh
echo "I0000 00:00:00.000 engine.cc:42] Loading model"
echo "I0000 00:00:00.500 engine.cc:90] Done"
"#;

pub const STDERR_ANSWER_SCRIPT: &str = r#"#!/bin/sh
echo "I0000 00:00:00.000 engine.cc:42] Loading model"
echo "Response: Written to the other channel." >&2
"#;

pub const SLOW_SCRIPT: &str = r#"#!/bin/sh
sleep 10
echo "Response: too late"
"#;

/// Write an executable script into `dir`
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// An empty stand-in for a model file
pub fn write_model(dir: &Path) -> PathBuf {
    let path = dir.join("gemma3-1b-it.litertlm");
    std::fs::write(&path, b"").unwrap();
    path
}

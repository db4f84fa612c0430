#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct Sidecar {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
}

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

/// Spawn the sidecar with a pinned clock (`YYYY-MM-DDTHH:MM`).
pub fn spawn_sidecar(now: Option<&str>) -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_portald");
    let mut cmd = Command::new(exe);
    cmd.env_remove("PORTALD_WORKSPACE")
        .env_remove("PORTALD_LATE_CUTOFF")
        .env("RUST_LOG", "off");
    match now {
        Some(t) => cmd.env("PORTALD_NOW", t),
        None => cmd.env_remove("PORTALD_NOW"),
    };
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn portald");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin,
        reader: BufReader::new(stdout),
    }
}

impl Sidecar {
    pub fn request(&mut self, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        writeln!(self.stdin, "{}", payload).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
        value
    }

    pub fn request_ok(&mut self, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.request(id, method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or(serde_json::Value::Null)
    }

    /// Returns the error code.
    pub fn request_err(&mut self, id: &str, method: &str, params: serde_json::Value) -> String {
        let value = self.request(id, method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string()
    }

    pub fn open(&mut self, workspace: &std::path::Path) -> serde_json::Value {
        self.request_ok(
            "ws",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        )
    }

    pub fn login(&mut self, email: &str, password: &str) -> serde_json::Value {
        let result = self.request_ok(
            "login",
            "session.login",
            json!({ "email": email, "password": password }),
        );
        assert!(result["user"].is_object(), "login failed for {}", email);
        result["user"].clone()
    }

    pub fn shutdown(self) {
        let Sidecar { mut child, stdin, .. } = self;
        drop(stdin);
        let _ = child.wait();
    }
}

pub const STUDENT_SARI: (&str, &str) = ("sari@siswa.sman1mayong.sch.id", "siswa123");
pub const STUDENT_FADHILA: (&str, &str) = ("fadhila@siswa.sman1mayong.sch.id", "siswa123");
pub const STUDENT_RIZKI: (&str, &str) = ("rizki@siswa.sman1mayong.sch.id", "siswa123");
pub const TEACHER: (&str, &str) = ("sari.wulandari@guru.sman1mayong.sch.id", "guru123");

//! Process-level tests for the kut binary. The docker daemon is stood in
//! for by a canned HTTP responder on a temporary unix socket, selected via
//! DOCKER_HOST.

use std::fs;
use std::io::{Read, Write};
use std::os::unix::net::UnixListener;
use std::path::Path;
use std::thread::{self, JoinHandle};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
preferences: {}
current-context: kind-kind3
clusters:
- name: kind-kind2
  cluster:
    certificate-authority-data: LS0tLS1CRUdJTg==
    server: https://127.0.0.1:39873
- name: kind-kind3
  cluster:
    certificate-authority-data: LS0tLS1CRUdJTg==
    server: https://127.0.0.1:40721
contexts:
- name: kind-kind2
  context:
    cluster: kind-kind2
    user: kind-kind2
- name: kind-kind3
  context:
    cluster: kind-kind3
    user: kind-kind3
users:
- name: kind-kind2
  user:
    client-certificate-data: Q0VSVA==
    client-key-data: S0VZ
- name: kind-kind3
  user:
    client-certificate-data: Q0VSVA==
    client-key-data: S0VZ
"#;

const CONTAINERS_JSON: &str = r#"[{"Id":"8dfafdbc3a40","Names":["/kind2-control-plane"],"State":"running","NetworkSettings":{"Networks":{"kind":{"IPAddress":"172.18.0.2"}}}}]"#;

/// Accept one connection, answer `body` as JSON, hand back the request.
fn one_shot_daemon(socket: &Path, body: &'static str) -> JoinHandle<String> {
    let listener = UnixListener::bind(socket).unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             \r\n\
             {}",
            body.len(),
            body,
        );
        stream.write_all(response.as_bytes()).unwrap();

        String::from_utf8_lossy(&request).into_owned()
    })
}

fn kut() -> Command {
    let mut cmd = Command::cargo_bin("kut").unwrap();
    cmd.env_remove("KUBECONFIG")
        .env_remove("DOCKER_HOST")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn cuts_a_kind_context_end_to_end() {
    let dir = TempDir::new().unwrap();
    let kubeconfig = dir.path().join("config");
    fs::write(&kubeconfig, KUBECONFIG).unwrap();

    let socket = dir.path().join("docker.sock");
    let daemon = one_shot_daemon(&socket, CONTAINERS_JSON);

    let assert = kut()
        .args(["--context", "kind-kind2", "--kubeconfig"])
        .arg(&kubeconfig)
        .env("DOCKER_HOST", format!("unix://{}", socket.display()))
        .assert()
        .success();

    let request = daemon.join().unwrap();
    assert!(request.starts_with("GET /containers/json?filters="));
    // The derived container name rides in the (urlencoded) filters value.
    assert!(request.contains("kind2%2Dcontrol%2Dplane"));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let output: serde_yaml::Value = serde_yaml::from_str(&stdout).unwrap();

    assert_eq!(
        output["clusters"][0]["cluster"]["server"],
        serde_yaml::Value::String("https://172.18.0.2:6443".to_owned())
    );
    assert_eq!(
        output["current-context"],
        serde_yaml::Value::String("kind-kind2".to_owned())
    );
    assert!(output["clusters"][1].is_null());
    assert!(output["contexts"][1].is_null());
    assert!(output["users"][1].is_null());
}

#[test]
fn unknown_context_fails_without_touching_stdout() {
    let dir = TempDir::new().unwrap();
    let kubeconfig = dir.path().join("config");
    fs::write(&kubeconfig, KUBECONFIG).unwrap();

    kut()
        .args(["-c", "kind-kind9", "-k"])
        .arg(&kubeconfig)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no such context in kubeconfig"));
}

#[test]
fn env_var_supplies_the_kubeconfig_path() {
    let dir = TempDir::new().unwrap();
    let kubeconfig = dir.path().join("config");
    fs::write(&kubeconfig, KUBECONFIG).unwrap();

    // Still fails on the missing context, which proves the env path was
    // read; a bad path would fail on loading instead.
    kut()
        .args(["-c", "kind-kind9"])
        .env("KUBECONFIG", &kubeconfig)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such context in kubeconfig"));
}

#[test]
fn unreadable_kubeconfig_is_a_load_error() {
    kut()
        .args(["-c", "kind-kind2", "-k", "/nonexistent/kubeconfig"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to load the kubeconfig"));
}

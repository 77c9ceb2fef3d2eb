use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskgate-{nanos}-{file_name}"))
}

fn session_command(args: &[&str]) -> Command {
    let exe = env!("CARGO_BIN_EXE_taskgate");
    let mut command = Command::new(exe);
    command
        .args(args)
        .env("TASKGATE_CONFIG_PATH", temp_path("cli-access-config.json"))
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}

fn run_session(args: &[&str], input: &str) -> Output {
    let mut child = session_command(args)
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child
        .wait_with_output()
        .expect("failed to read interactive output")
}

#[test]
fn regular_user_cannot_show_by_id() {
    let output = run_session(&[], "add mine\nshow task-anything\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: permission_denied"));
    assert!(stderr.contains("regular"));
}

#[test]
fn admin_show_reports_missing_task() {
    let output = run_session(&["--role", "admin"], "show task-missing\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("Task not found: task-missing"));
    assert!(stderr.is_empty());
}

#[test]
fn admin_show_returns_created_task() {
    let mut child = session_command(&["--role", "admin", "--json"])
        .spawn()
        .expect("failed to spawn interactive session");
    let mut stdin = child.stdin.take().expect("stdin");
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout"));

    writeln!(stdin, "add \"look me up\" --priority high").unwrap();
    stdin.flush().unwrap();
    let mut added_line = String::new();
    stdout.read_line(&mut added_line).unwrap();
    let added: serde_json::Value = serde_json::from_str(added_line.trim()).unwrap();
    let id = added["id"].as_str().expect("task id").to_string();

    writeln!(stdin, "logout").unwrap();
    writeln!(stdin, "show {id}").unwrap();
    writeln!(stdin, "exit").unwrap();
    drop(stdin);

    let mut rest = String::new();
    for line in stdout.lines() {
        rest.push_str(&line.unwrap());
        rest.push('\n');
    }
    let status = child.wait().unwrap();
    assert!(status.success());

    let shown_line = rest.lines().last().expect("show output");
    let shown: serde_json::Value = serde_json::from_str(shown_line).unwrap();
    assert_eq!(shown, added);
}

#[test]
fn unknown_startup_role_is_fatal() {
    let output = run_session(&["--role", "bogus"], "exit\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_role"));
}

#[test]
fn unknown_role_for_new_user_keeps_session() {
    let output = run_session(&[], "user add bogus X\nuser list\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stderr.contains("ERROR: invalid_role"));
    assert!(stdout.contains("* user (regular, logged in)"));
    assert!(!stdout.contains("X ("));
}

#[test]
fn switching_to_admin_unlocks_show() {
    let output = run_session(
        &[],
        "user add admin ada\nshow task-missing\nuser switch user\nshow task-missing\nexit\n",
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.contains("Created user: ada (admin, logged in)"));
    assert!(stdout.contains("Task not found: task-missing"));
    assert!(stdout.contains("Switched to: user (regular, logged in)"));
    assert!(stderr.contains("ERROR: permission_denied"));
}

#[test]
fn duplicate_user_names_are_rejected() {
    let output = run_session(&[], "user add admin user\nexit\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - user 'user' already exists"));
}

#[test]
fn sessions_are_tracked_per_user() {
    let output = run_session(
        &[],
        "user add regular bob\nlogout\nuser switch user\nadd still-allowed\nuser list\nexit\n",
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stderr.is_empty());
    assert!(stdout.contains("Added task: still-allowed"));
    assert!(stdout.contains("* user (regular, logged in)"));
    assert!(stdout.contains("  bob (regular, logged out)"));
}

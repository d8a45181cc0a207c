use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn policyctl_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("policyctl");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("leave.md"),
        "# Annual Leave\n\nEmployees receive twenty days of annual leave.\n\nUnused leave may be carried over.",
    )
    .unwrap();
    fs::write(
        files_dir.join("remote.txt"),
        "Remote work is allowed two days per week with manager approval.",
    )
    .unwrap();
    fs::write(files_dir.join("budget.xlsx"), "not a spreadsheet").unwrap();
    fs::write(
        files_dir.join("conduct.docx"),
        docx_bytes(&["Code of Conduct", "Harassment of any kind is not tolerated."]),
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/policy.sqlite"

[storage]
documents_dir = "{root}/data/documents"

[retrieval]
top_k = 3

[embedding]
provider = "disabled"

[logging]
level = "warn"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("policy.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn run_policyctl(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = policyctl_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run policyctl binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn file_arg(config_path: &Path, name: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("files")
        .join(name)
        .display()
        .to_string()
}

/// Ingest a file and return the new document id.
fn ingest(config_path: &Path, name: &str, extra: &[&str]) -> String {
    let file = file_arg(config_path, name);
    let mut args = vec!["ingest", file.as_str()];
    args.extend_from_slice(extra);
    let (stdout, stderr, success) = run_policyctl(config_path, &args);
    assert!(success, "ingest {} failed: {}{}", name, stdout, stderr);
    stdout
        .lines()
        .find_map(|l| l.trim().strip_prefix("document: ").map(str::to_string))
        .unwrap_or_else(|| panic!("no document id in output: {}", stdout))
}

#[test]
fn test_init_creates_database() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_policyctl(&config, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized"));
    assert!(tmp.path().join("data").join("policy.sqlite").exists());

    // Idempotent.
    let (_, _, success) = run_policyctl(&config, &["init"]);
    assert!(success);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_policyctl(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_ingest_and_keyword_search() {
    let (_tmp, config) = setup_test_env();
    let id = ingest(&config, "leave.md", &["--doc-version", "2024"]);
    assert_eq!(id.len(), 8);
    ingest(&config, "remote.txt", &[]);

    let (stdout, _, success) = run_policyctl(&config, &["search", "annual leave", "--latest"]);
    assert!(success);
    assert!(stdout.contains("leave.md v2024"), "stdout: {}", stdout);
    assert!(!stdout.contains("remote.txt"));

    let (stdout, _, success) = run_policyctl(&config, &["search", "zebra giraffe"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_ingest_reports_chunks_without_embedding() {
    let (_tmp, config) = setup_test_env();
    let file = file_arg(&config, "remote.txt");
    let (stdout, _, success) = run_policyctl(&config, &["ingest", &file]);
    assert!(success);
    assert!(stdout.contains("version: 1.0"));
    assert!(stdout.contains("chunks written: 1"));
    assert!(stdout.contains("chunks without embedding: 1"));
    assert!(stdout.trim_end().ends_with("ok"));
}

#[test]
fn test_duplicate_version_rejected() {
    let (_tmp, config) = setup_test_env();
    let id = ingest(&config, "leave.md", &[]);

    let file = file_arg(&config, "leave.md");
    let (stdout, _, success) = run_policyctl(&config, &["ingest", &file]);
    assert!(!success);
    assert!(stdout.contains("already exists"));
    assert!(stdout.contains(&id));

    let (stdout, _, success) = run_policyctl(&config, &["duplicates"]);
    assert!(success);
    assert!(stdout.contains("No duplicate documents."));
}

#[test]
fn test_unsupported_file_type_fails() {
    let (_tmp, config) = setup_test_env();
    let file = file_arg(&config, "budget.xlsx");
    let (_, stderr, success) = run_policyctl(&config, &["ingest", &file]);
    assert!(!success);
    assert!(stderr.contains("unsupported file type"));
}

#[test]
fn test_docx_ingest_and_get() {
    let (_tmp, config) = setup_test_env();
    let id = ingest(&config, "conduct.docx", &["--description", "HR handbook"]);

    let (stdout, _, success) = run_policyctl(&config, &["documents", "get", &id]);
    assert!(success);
    assert!(stdout.contains("--- Document ---"));
    assert!(stdout.contains("type:        docx"));
    assert!(stdout.contains("description: HR handbook"));
    assert!(stdout.contains("Harassment of any kind is not tolerated."));

    let (_, stderr, success) = run_policyctl(&config, &["documents", "get", "deadbeef"]);
    assert!(!success);
    assert!(stderr.contains("Document not found"));
}

#[test]
fn test_search_json_output() {
    let (_tmp, config) = setup_test_env();
    ingest(&config, "remote.txt", &["--doc-version", "3"]);

    let (stdout, _, success) = run_policyctl(
        &config,
        &["search", "remote work approval", "--latest", "--json", "--top-k", "1"],
    );
    assert!(success);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["file_name"], "remote.txt");
    assert_eq!(results[0]["version"], "3");
    assert_eq!(results[0]["vector_score"], 0.0);
    assert!(value["year"].is_null());
}

#[test]
fn test_historical_question_prints_clarification() {
    let (_tmp, config) = setup_test_env();
    ingest(&config, "leave.md", &[]);

    let (stdout, _, success) =
        run_policyctl(&config, &["search", "What was the previous leave policy?"]);
    assert!(success);
    assert!(stdout.contains("Which year or version are you asking about?"));

    // An explicit selection bypasses the analyzer.
    let (stdout, _, success) = run_policyctl(
        &config,
        &["search", "What was the previous leave policy?", "--latest"],
    );
    assert!(success);
    assert!(stdout.contains("leave.md"));
}

#[test]
fn test_year_and_latest_conflict() {
    let (_tmp, config) = setup_test_env();
    let (_, _, success) = run_policyctl(&config, &["search", "leave", "--year", "2022", "--latest"]);
    assert!(!success);
}

#[test]
fn test_list_and_delete() {
    let (_tmp, config) = setup_test_env();
    let leave = ingest(&config, "leave.md", &[]);
    let remote = ingest(&config, "remote.txt", &[]);

    let (stdout, _, success) = run_policyctl(&config, &["documents", "list"]);
    assert!(success);
    assert!(stdout.contains(&leave));
    assert!(stdout.contains(&remote));
    assert!(stdout.contains("indexed"));

    let (stdout, _, success) = run_policyctl(&config, &["documents", "delete", &leave]);
    assert!(success);
    assert!(stdout.contains("chunks removed"));

    let (stdout, _, _) = run_policyctl(&config, &["documents", "list", "--json"]);
    let docs: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ids: Vec<&str> = docs
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["document_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![remote.as_str()]);

    let (stdout, _, _) = run_policyctl(&config, &["search", "annual leave", "--latest"]);
    assert!(stdout.contains("No results."));

    let (_, _, success) = run_policyctl(&config, &["documents", "delete", &leave]);
    assert!(success, "deleting an inactive document is still a known id");
    let (_, _, success) = run_policyctl(&config, &["documents", "delete", "deadbeef"]);
    assert!(!success);
}

#[test]
fn test_deactivate_keeps_chunks() {
    let (_tmp, config) = setup_test_env();
    let id = ingest(&config, "leave.md", &["--doc-version", "2023"]);

    let (stdout, _, success) = run_policyctl(&config, &["documents", "deactivate", &id]);
    assert!(success);
    assert!(stdout.contains(&format!("deactivated {}", id)));

    let (stdout, _, _) = run_policyctl(&config, &["documents", "list"]);
    assert!(!stdout.contains(&id));
    let (stdout, _, _) = run_policyctl(&config, &["search", "annual leave", "--latest"]);
    assert!(stdout.contains("No results."));

    let (stdout, _, success) = run_policyctl(&config, &["documents", "get", &id]);
    assert!(success);
    assert!(stdout.contains("--- Chunks (1) ---"));
    assert!(stdout.contains("twenty days of annual leave"));

    let (_, stderr, success) = run_policyctl(&config, &["documents", "deactivate", "deadbeef"]);
    assert!(!success);
    assert!(stderr.contains("Document not found"));
}

#[test]
fn test_cleanup_commands() {
    let (_tmp, config) = setup_test_env();
    let id = ingest(&config, "leave.md", &[]);

    let (stdout, _, success) = run_policyctl(&config, &["cleanup", "chunks", &id]);
    assert!(success);
    assert!(stdout.contains("duplicate chunks removed: 0"));
    assert!(stdout.contains("invalid chunks removed: 0"));
    assert!(stdout.contains("chunks: 1"));

    let (stdout, _, success) = run_policyctl(&config, &["cleanup", "documents"]);
    assert!(success);
    assert!(stdout.contains("duplicate groups: 0"));

    let (_, stderr, success) = run_policyctl(&config, &["cleanup", "chunks", "deadbeef"]);
    assert!(!success);
    assert!(stderr.contains("Document not found"));
}

#[test]
fn test_stats() {
    let (_tmp, config) = setup_test_env();
    ingest(&config, "leave.md", &[]);
    ingest(&config, "remote.txt", &[]);

    let (stdout, _, success) = run_policyctl(&config, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Documents:   2"));
    assert!(stdout.contains("Embedded:    0 / 2 (0%)"));
    assert!(stdout.contains("leave.md"));
}

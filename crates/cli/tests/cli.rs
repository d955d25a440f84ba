use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn libris(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("libris-cli").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("LIBRIS_ENV")
        .env("LIBRIS_CONFIG_DIR", data_dir.path())
        .arg("--data-dir")
        .arg(data_dir.path());
    cmd
}

fn run_json(data_dir: &TempDir, args: &[&str]) -> Value {
    let output = libris(data_dir).args(args).assert().success().get_output().clone();
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn manages_the_catalog_end_to_end() {
    let data_dir = TempDir::new().unwrap();

    let added = run_json(
        &data_dir,
        &[
            "add",
            "--title",
            "Dune",
            "--author",
            "Frank Herbert",
            "--genre",
            "science fiction",
        ],
    );
    let id = added["id"].as_str().unwrap().to_string();
    assert_eq!(added["genre"], "Science Fiction");
    assert_eq!(added["status"], "Available");

    run_json(&data_dir, &["add", "--title", "Emma", "--author", "Jane Austen"]);

    let listed = run_json(&data_dir, &["list", "--search", "herbert"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let toggled = run_json(&data_dir, &["toggle", &id]);
    assert_eq!(toggled["status"], "Checked Out");

    let checked_out = run_json(&data_dir, &["list", "--status", "checked out"]);
    assert_eq!(checked_out.as_array().unwrap().len(), 1);

    let edited = run_json(&data_dir, &["edit", &id, "--title", "Dune (1965)"]);
    assert_eq!(edited["id"], id.as_str());
    assert_eq!(edited["title"], "Dune (1965)");
    assert_eq!(edited["status"], "Checked Out");

    let genres = run_json(&data_dir, &["genres"]);
    assert_eq!(genres, serde_json::json!(["All", "Science Fiction", "Fiction"]));

    run_json(&data_dir, &["delete", &id]);
    let remaining = run_json(&data_dir, &["list"]);
    assert_eq!(remaining.as_array().unwrap().len(), 1);
    assert_eq!(remaining[0]["title"], "Emma");
}

#[test]
fn rejects_blank_title_and_unknown_genre() {
    let data_dir = TempDir::new().unwrap();

    libris(&data_dir)
        .args(["add", "--title", " ", "--author", "Someone"])
        .assert()
        .failure();

    libris(&data_dir)
        .args(["add", "--title", "X", "--author", "Y", "--genre", "Thriller"])
        .assert()
        .failure();

    let listed = run_json(&data_dir, &["list"]);
    assert_eq!(listed, serde_json::json!([]));
}

#[test]
fn unknown_id_fails() {
    let data_dir = TempDir::new().unwrap();
    libris(&data_dir).args(["toggle", "missing"]).assert().failure();
    libris(&data_dir).args(["delete", "missing"]).assert().failure();
}

#[test]
fn malformed_slot_starts_fresh() {
    let data_dir = TempDir::new().unwrap();
    std::fs::write(data_dir.path().join("books.json"), "{not json").unwrap();

    let listed = run_json(&data_dir, &["list"]);
    assert_eq!(listed, serde_json::json!([]));
}

#[test]
fn recommend_without_credential_fails() {
    let data_dir = TempDir::new().unwrap();
    libris(&data_dir)
        .env_remove("API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("LIBRIS_RECOMMENDATION__API_KEY")
        .args(["recommend", "space opera"])
        .assert()
        .failure();
}

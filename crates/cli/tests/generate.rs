use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn sample_project(root: &Path) {
    write(
        root,
        "app/main.py",
        "from utils.parser import Parser\n\nclass App:\n    def run(self):\n        return Parser()\n",
    );
    write(
        root,
        "utils/parser.py",
        "\"\"\"Parsing helpers.\"\"\"\n\nclass Parser:\n    def parse(self, text):\n        return text\n",
    );
}

#[test]
fn generate_writes_documentation_site() {
    let temp = tempdir().unwrap();
    sample_project(temp.path());
    let output = temp.path().join("docs");

    Command::cargo_bin("depmap")
        .unwrap()
        .current_dir(temp.path())
        .args(["generate", "--root", ".", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Documentation generated"));

    assert!(output.join("index.html").exists());
    assert!(output.join("files_graph.html").exists());
    assert!(output.join("app_main.html").exists());
    assert!(output.join("class_utils_parser_Parser.html").exists());
}

#[test]
fn export_writes_graph_json() {
    let temp = tempdir().unwrap();
    sample_project(temp.path());
    let output = temp.path().join("graph.json");

    Command::cargo_bin("depmap")
        .unwrap()
        .current_dir(temp.path())
        .args(["export", "--root", ".", "--output"])
        .arg(&output)
        .assert()
        .success();

    let json = fs::read_to_string(&output).unwrap();
    assert!(json.contains("\"nodes\""));
    assert!(json.contains("app/main.py"));
}

#[test]
fn missing_root_is_a_fatal_configuration_error() {
    let temp = tempdir().unwrap();

    Command::cargo_bin("depmap")
        .unwrap()
        .current_dir(temp.path())
        .args(["generate", "--root", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Root directory not found"));
}

#[test]
fn broken_file_still_produces_site() {
    let temp = tempdir().unwrap();
    sample_project(temp.path());
    write(temp.path(), "broken.py", "def broken(:\n");
    let output = temp.path().join("docs");

    Command::cargo_bin("depmap")
        .unwrap()
        .current_dir(temp.path())
        .args(["generate", "--root", ".", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("parse-error"));

    let index = fs::read_to_string(output.join("index.html")).unwrap();
    assert!(index.contains("broken.py"));
    assert!(index.contains("parse-error"));
}

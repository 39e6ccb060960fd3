use std::fs;

use predicates::prelude::*;

const ARTICLE: &str = "Walking With New Believers\n\
\n\
A new believer does not need a curriculum first. They need a companion who\n\
will answer questions honestly and model an ordinary faithful week. The\n\
church that pairs every convert with a mentor keeps far more of them than\n\
the church that hands out a reading plan and hopes.";

#[test]
fn text_command_writes_post_json() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let input_path = temp.path().join("article.txt");
    fs::write(&input_path, ARTICLE)?;
    let out_dir = temp.path().join("posts");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("forge-import");
    cmd.env_remove("OPENAI_API_KEY")
        .args([
            "text",
            "--input",
            input_path.to_str().unwrap(),
            "--out",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("walking-with-new-believers.json"));

    let post_path = out_dir.join("walking-with-new-believers.json");
    let raw = fs::read_to_string(&post_path)?;
    let post: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(
        post.get("title").and_then(|v| v.as_str()),
        Some("Walking With New Believers")
    );
    assert_eq!(post.get("status").and_then(|v| v.as_str()), Some("draft"));
    assert!(
        post.get("content")
            .and_then(|v| v.as_array())
            .is_some_and(|blocks| !blocks.is_empty())
    );
    Ok(())
}

#[test]
fn explicit_title_overrides_derived_one() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let input_path = temp.path().join("article.txt");
    fs::write(&input_path, ARTICLE)?;
    let out_dir = temp.path().join("posts");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("forge-import");
    cmd.env_remove("OPENAI_API_KEY")
        .args([
            "text",
            "--input",
            input_path.to_str().unwrap(),
            "--title",
            "Mentoring New Believers",
            "--out",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("mentoring-new-believers.json"));
    Ok(())
}

#[test]
fn short_text_fails_with_validation_message() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let input_path = temp.path().join("short.txt");
    fs::write(&input_path, "Too short to import.")?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("forge-import");
    cmd.env_remove("OPENAI_API_KEY")
        .args([
            "text",
            "--input",
            input_path.to_str().unwrap(),
            "--out",
            temp.path().join("posts").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside allowed range"));
    Ok(())
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let input_path = temp.path().join("article.txt");
    fs::write(&input_path, ARTICLE)?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("forge-import");
    cmd.env_remove("OPENAI_API_KEY")
        .env("RUST_LOG", "debug")
        .args([
            "text",
            "--input",
            input_path.to_str().unwrap(),
            "--out",
            temp.path().join("posts").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
    Ok(())
}

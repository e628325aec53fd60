use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("board-locate").expect("binary built")
}

#[test]
fn blank_image_is_reported_as_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("blank.png");
    GrayImage::from_pixel(160, 120, Luma([200]))
        .save(&path)
        .expect("write png");

    cli()
        .arg("contour")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"not_found\""))
        .stdout(predicate::str::contains("insufficient-grid-lines"));
}

#[test]
fn generated_config_is_accepted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = dir.path().join("locate.json");
    let img = dir.path().join("blank.png");
    GrayImage::from_pixel(64, 64, Luma([90]))
        .save(&img)
        .expect("write png");

    cli().arg("init-config").arg(&cfg).assert().success();
    assert!(cfg.exists());

    cli()
        .arg("contour")
        .arg(&img)
        .arg("--config")
        .arg(&cfg)
        .arg("--min-area")
        .arg("100")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"strategy\": \"contour\""));
}

#[test]
fn missing_image_fails() {
    cli()
        .args(["contour", "does/not/exist.png"])
        .assert()
        .failure();
}

#[test]
fn template_subcommand_requires_a_template() {
    let dir = tempfile::tempdir().expect("tempdir");
    let img = dir.path().join("frame.png");
    GrayImage::from_pixel(32, 32, Luma([0]))
        .save(&img)
        .expect("write png");

    cli().arg("template").arg(&img).assert().failure();
}

#[test]
fn unknown_log_level_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let img = dir.path().join("frame.png");
    GrayImage::from_pixel(32, 32, Luma([0]))
        .save(&img)
        .expect("write png");

    cli()
        .args(["--log-level", "loud", "contour"])
        .arg(&img)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown log level"));
}

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

const NOW: &str = "2024-06-01T12:00:00Z";

/// Points `--config` at a path inside the temp dir so the user's real config
/// never leaks into a test run.
fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("cli.toml");
    (dir, config)
}

fn run_json(config: &Path, args: &[&str]) -> Value {
    let output = cargo_bin_cmd!("cli")
        .env_remove("RELJOIN_DATA")
        .arg("--config")
        .arg(config)
        .args(["--now", NOW, "--format", "json"])
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn query_outputs_json_rows() {
    let (_dir, config) = workspace();
    let rows = run_json(&config, &["query", "products-with-reviews"]);
    let rows = rows.as_array().expect("array of rows");
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["productName"], "Laptop");
    assert_eq!(rows[0]["reviewId"], 1);
}

#[test]
fn list_names_every_query() {
    let (_dir, config) = workspace();
    let listing = run_json(&config, &["list"]);
    let names: Vec<&str> = listing
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|entry| entry["name"].as_str())
        .collect();
    assert!(names.contains(&"products-best-review"));
    assert!(names.contains(&"reviews-with-products"));
    assert_eq!(names.len(), 10);
}

#[test]
fn unknown_query_fails() {
    let (_dir, config) = workspace();
    let output = cargo_bin_cmd!("cli")
        .arg("--config")
        .arg(&config)
        .args(["query", "products-sideways-join"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("unknown query 'products-sideways-join'"), "{stderr}");
}

#[test]
fn product_reviews_not_found_exits_three() {
    let (_dir, config) = workspace();
    let output = cargo_bin_cmd!("cli")
        .env_remove("RELJOIN_DATA")
        .arg("--config")
        .arg(&config)
        .args(["--now", NOW, "product-reviews", "5"])
        .assert()
        .failure()
        .code(3)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("No reviews found for product 5"), "{stderr}");

    let reviews = run_json(&config, &["product-reviews", "3"]);
    assert_eq!(reviews.as_array().map(Vec::len), Some(3));
}

#[test]
fn data_file_replaces_the_seed() {
    let (dir, config) = workspace();
    let data = dir.path().join("snapshot.json");
    fs::write(
        &data,
        r#"{
            "products": [
                {"id": 1, "name": "Kettle", "price": 150.0, "createdDate": "2024-05-01T00:00:00Z"},
                {"id": 2, "name": "Toaster", "price": 80.0, "createdDate": "2024-05-01T00:00:00Z"}
            ],
            "reviews": [
                {"id": 1, "title": "Boils fast", "rating": 5, "reviewerName": "Ann",
                 "reviewDate": "2024-05-30T00:00:00Z", "productId": 1}
            ]
        }"#,
    )
    .expect("write snapshot");
    let rows = run_json(
        &config,
        &["--data", data.to_str().expect("utf-8 path"), "query", "products-high-rating-left-join"],
    );
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["productName"], "Kettle");
    assert_eq!(rows[0]["productPrice"], 150.0);
}

#[test]
fn config_file_overrides_query_options() {
    let (_dir, config) = workspace();
    fs::write(&config, "[query]\nmin_price = 900.0\nmin_rating = 5\n").expect("write config");
    let rows = run_json(&config, &["query", "products-high-rating-left-join"]);
    let names: Vec<&str> = rows
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|row| row["productName"].as_str())
        .collect();
    assert_eq!(names, vec!["Laptop"]);
}

#[test]
fn invalid_config_value_is_reported() {
    let (_dir, config) = workspace();
    fs::write(&config, "[query]\nmin_rating = 9\n").expect("write config");
    let output = cargo_bin_cmd!("cli")
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("query.min_rating"), "{stderr}");
}

#[test]
fn config_init_writes_defaults() {
    let (_dir, config) = workspace();
    cargo_bin_cmd!("cli")
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    let written = fs::read_to_string(&config).expect("config written");
    assert!(written.contains("min_rating = 4"), "{written}");
    assert!(written.contains("recent_window_days = 7"), "{written}");

    cargo_bin_cmd!("cli")
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .failure();
}

#[test]
fn seed_round_trips_through_data_flag() {
    let (dir, config) = workspace();
    let data = dir.path().join("seed.json");
    cargo_bin_cmd!("cli")
        .arg("--config")
        .arg(&config)
        .args(["--now", NOW, "--theme", "plain", "seed", "--output"])
        .arg(&data)
        .assert()
        .success();
    let rows = run_json(
        &config,
        &["--data", data.to_str().expect("utf-8 path"), "query", "reviews-with-products"],
    );
    assert_eq!(rows.as_array().map(Vec::len), Some(9));
    assert_eq!(rows[8]["productName"], "Product Not Found");
}

#[test]
fn text_output_renders_a_table() {
    let (_dir, config) = workspace();
    let output = cargo_bin_cmd!("cli")
        .env_remove("RELJOIN_DATA")
        .arg("--config")
        .arg(&config)
        .args(["--now", NOW, "--theme", "plain", "query", "products-best-review"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&output);
    assert!(stdout.contains("products-best-review (4 rows)"), "{stdout}");
    assert!(stdout.contains("Best headphones ever"), "{stdout}");
    assert!(stdout.contains("PRODUCT"), "{stdout}");
}

#[test]
fn huge_recent_window_returns_every_review() {
    let (_dir, config) = workspace();
    fs::write(&config, "[query]\nrecent_window_days = 10000000\n").expect("write config");
    let rows = run_json(&config, &["query", "products-recent-review-left-join"]);
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|row| row["hasRecentReview"] == true));
}

#[test]
fn overflowing_recent_window_is_rejected() {
    let (_dir, config) = workspace();
    fs::write(&config, format!("[query]\nrecent_window_days = {}\n", i64::MAX))
        .expect("write config");
    let output = cargo_bin_cmd!("cli")
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("query.recent_window_days"), "{stderr}");
}

#[test]
fn config_show_honours_json_format() {
    let (_dir, config) = workspace();
    fs::write(&config, "[query]\nmin_rating = 5\nrecent_window_days = 3\n").expect("write config");
    let shown = run_json(&config, &["config", "show"]);
    assert_eq!(shown["minRating"], 5);
    assert_eq!(shown["recentWindowDays"], 3);
    assert_eq!(shown["minPrice"], 100.0);
    assert_eq!(shown["path"], config.to_str().expect("utf-8 path"));
    assert!(shown["data"].is_null());
}

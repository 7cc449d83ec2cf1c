//! Integration tests for Lunchbox

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Binary with an isolated config file that keeps the disk cache in
    /// the temp dir
    fn lunchbox(temp: &TempDir) -> Command {
        let config = temp.path().join("config.toml");
        let cache_dir = temp.path().join("DiskCache");
        std::fs::write(
            &config,
            format!("[cache]\ndisk_dir = {:?}\n", cache_dir.display().to_string()),
        )
        .unwrap();

        let mut cmd = cargo_bin_cmd!("lunchbox");
        cmd.env("LUNCHBOX_CONFIG", &config);
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cached image loading"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("lunchbox"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("disk_keying = \"fixed\""));
    }

    #[test]
    fn invalid_config_reports_path() {
        let temp = TempDir::new().unwrap();
        let mut cmd = lunchbox(&temp);
        std::fs::write(temp.path().join("config.toml"), "[cache\n").unwrap();
        cmd.args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn fetch_empty_identifier_fails() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .args(["fetch", ""])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid resource identifier"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn fetch_unopenable_scheme_fails() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .args(["fetch", "ftp://example.com/lunch.png"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot open 'ftp' URLs"));
    }

    #[test]
    fn fetch_corrupt_local_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lunch.png");
        std::fs::write(&path, b"not an image").unwrap();
        lunchbox(&temp)
            .args(["fetch", path.to_str().unwrap()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Image decode failed"));
    }

    #[test]
    fn cache_path_uses_configured_dir() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("DiskCache"));
    }

    #[test]
    fn cache_show_empty() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .args(["cache", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Disk cache is empty"));
    }

    #[test]
    fn cache_clear_nothing() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to clear"));
    }

    #[test]
    fn web_unopenable_address_fails() {
        let temp = TempDir::new().unwrap();
        lunchbox(&temp)
            .args(["web", "not a url"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Cannot open page"))
            .stderr(predicate::str::contains("Cannot open page"));
    }

    #[test]
    fn web_local_page_reports_session_json() {
        let temp = TempDir::new().unwrap();
        let page = temp.path().join("menu.html");
        std::fs::write(&page, "<html>menu</html>").unwrap();
        let url = format!("file://{}", page.display());

        lunchbox(&temp)
            .args(["web", &url, "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"state\": \"loaded\""))
            .stdout(predicate::str::contains("\"progress\": 1.0"));
    }
}

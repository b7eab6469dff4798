//! Integration tests for Pressroom

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::io::Write;

    fn pressroom() -> Command {
        cargo_bin_cmd!("pressroom")
    }

    #[test]
    fn help_displays() {
        pressroom()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("article extraction server"));
    }

    #[test]
    fn version_displays() {
        pressroom()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pressroom"));
    }

    #[test]
    fn rejects_unknown_mode() {
        pressroom()
            .args(["--mode", "staging"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }

    #[test]
    fn invalid_config_file_fails_fast() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport =").unwrap();

        pressroom()
            .args(["--config"])
            .arg(file.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}

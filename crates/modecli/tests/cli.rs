//! Tests for the modecli command surface

use assert_cmd::Command;
use predicates::prelude::*;

fn modecli() -> Command {
    let mut cmd = Command::cargo_bin("modecli").unwrap();
    // Keep host config and log settings out of the run
    cmd.current_dir(std::env::temp_dir())
        .env_remove("RUST_LOG")
        .env_remove("MODESCOPE_LOG_LEVEL")
        .env_remove("MODESCOPE_FOIL_CEILING")
        .env_remove("MODESCOPE_MODAL_MIN_CONFIDENCE");
    cmd
}

#[test]
fn modal_view_names_the_mode() {
    modecli()
        .args(["analyze", "G F | C G", "--key", "C major", "--view", "modal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("G Mixolydian"))
        .stdout(predicate::str::contains("I  bVII  IV  I"));
}

#[test]
fn modal_json_carries_status_tag() {
    modecli()
        .args(["analyze", "G F C G", "--key", "C major", "--view", "modal", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"found\""))
        .stdout(predicate::str::contains("\"mode_name\": \"G Mixolydian\""));
}

#[test]
fn single_chord_reports_no_result() {
    modecli()
        .args(["analyze", "C"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No result"));

    modecli()
        .args(["analyze", "C", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"no_data\""))
        .stdout(predicate::str::contains("single_chord"));
}

#[test]
fn functional_view_finds_cadence() {
    modecli()
        .args(["analyze", "Dm7 G7 Cmaj7", "--key", "C", "--view", "functional"])
        .assert()
        .success()
        .stdout(predicate::str::contains("C major"))
        .stdout(predicate::str::contains("jazz ii-V-I"));
}

#[test]
fn comprehensive_view_is_the_default() {
    modecli()
        .args(["analyze", "C A7 Dm G7 C", "--key", "C"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chromatic"))
        .stdout(predicate::str::contains("V7/ii"));
}

#[test]
fn bad_parent_key_fails() {
    modecli()
        .args(["analyze", "G F C G", "--key", "H major"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing parent key"));
}

#[test]
fn unparseable_chords_are_reported_and_skipped() {
    modecli()
        .args(["analyze", "G F Xyz C G", "--key", "C major", "--view", "modal"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipped chord 3 'Xyz'"))
        .stdout(predicate::str::contains("Skipped").not())
        .stdout(predicate::str::contains("?"));
}

#[test]
fn suggest_ranks_modes() {
    modecli()
        .args(["suggest", "D", "E", "F", "G", "A", "B", "C", "--tonic", "D", "--top", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("D Dorian"));
}

#[test]
fn suggest_accepts_midi_numbers() {
    modecli()
        .args(["suggest", "60", "64", "67", "70", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"suggestions\""))
        .stdout(predicate::str::contains("\"key_estimate\""));
}

#[test]
fn suggest_rejects_out_of_range_midi() {
    modecli()
        .args(["suggest", "60", "200", "67"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'200' is not a note name or MIDI number"));
}

#[test]
fn suggest_rejects_garbage_notes() {
    modecli()
        .args(["suggest", "C", "Q", "E"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Q' is not a note name"));
}

#[test]
fn region_matching_the_global_key_is_stable() {
    modecli()
        .args(["region", "C", "E", "G", "C", "E", "G", "F", "A", "B", "D", "--key", "C major"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stable"));
}

#[test]
fn region_json_lists_borrowed_tones() {
    modecli()
        .args(["region", "Eb", "Eb", "Eb", "G", "G", "Bb", "Bb", "Ab", "F", "D", "C", "--key", "C major", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"region_type\""))
        .stdout(predicate::str::contains("\"borrowed\""))
        .stdout(predicate::str::contains("\"region_type\": \"stable\"").not());
}

#[test]
fn region_rejects_bad_global_key() {
    modecli()
        .args(["region", "C", "E", "G", "--key", "H major"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing key"));
}

#[test]
fn config_prints_defaults() {
    modecli()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[analysis]"))
        .stdout(predicate::str::contains("max_confidence = 0.95"));
}

#[test]
fn explicit_config_file_is_applied() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[analysis]\nfoil_ceiling = 0.25\n").unwrap();

    modecli()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("foil_ceiling = 0.25"))
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn missing_config_file_fails() {
    modecli()
        .args(["--config", "/definitely/not/here.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}

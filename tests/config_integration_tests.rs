//! Settings files layered under the command line
use clap::Parser;
use gcode_postprocess::config::{Args, Config, SettingsFile};
use gcode_postprocess::BlockState;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn args(argv: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("gcode-pp").chain(argv.iter().copied()))
        .expect("parse args")
}

#[test]
fn test_settings_file_loaded_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pp.toml");
    fs::write(
        &path,
        r#"
feed_override = 450.0
wipe_trailing_discard = 3
minimize_temperatures = true

[[triggers]]
pattern = ";TYPE:PRIME-TOWER"
state = "prime"

[[triggers]]
pattern = "; EXTRUDER END HOME"
state = "extruder-end"
"#,
    )
    .unwrap();

    let settings = SettingsFile::load(&path).expect("load settings");
    let config = Config::from_layers(args(&["part.gcode"]), vec![settings]);

    assert_eq!(config.synth.feed_override, 450.0);
    assert_eq!(config.synth.wipe_trailing_discard, 3);
    assert!(config.minimize_temperatures);
    assert_eq!(config.triggers.len(), 2);
    assert_eq!(config.triggers[1].state, BlockState::ExtruderEnd);

    let options = config.process_options().expect("options");
    assert!(options.minimize_temperatures);
    assert_eq!(options.triggers.len(), 2);
}

#[test]
fn test_explicit_config_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pp.toml");
    fs::write(&path, "prime_dip = 0.5\noutput_suffix = \"wiped\"\n").unwrap();

    let config = Config::from_args(args(&[
        "prints/part.gcode",
        "--config",
        path.to_str().unwrap(),
        "--feed-override",
        "120",
    ]))
    .expect("create config");

    assert_eq!(config.synth.prime_dip, 0.5);
    assert_eq!(config.synth.feed_override, 120.0);
    assert_eq!(config.output_path(), PathBuf::from("prints/part.wiped.gcode"));
}

#[test]
fn test_explicit_output_wins_over_suffix() {
    let config = Config::from_layers(
        args(&["part.gcode", "-o", "out.gcode"]),
        vec![SettingsFile::parse("output_suffix = \"x\"").unwrap()],
    );
    assert_eq!(config.output_path(), PathBuf::from("out.gcode"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = Config::from_args(args(&["part.gcode", "--config", missing.to_str().unwrap()]))
        .unwrap_err();
    assert!(format!("{:#}", err).contains("nope.toml"));
}

#[test]
fn test_unknown_trigger_state_rejected() {
    let err = SettingsFile::parse("[[triggers]]\npattern = \";X\"\nstate = \"wipe\"\n").unwrap_err();
    assert!(err.to_string().contains("wipe"));
}

#[test]
fn test_run_writes_crlf_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("part.gcode");
    fs::write(
        &input,
        "M104 T0 S210\n;TYPE:PRIME-TOWER\nG0 X1 Y1\nG1 X2 Y2 E1\n",
    )
    .unwrap();

    let config = Config::from_layers(args(&[input.to_str().unwrap()]), vec![]);
    gcode_postprocess::cli::run_with(config).expect("run");

    let written = fs::read_to_string(dir.path().join("part.postprocessed.gcode")).unwrap();
    assert!(written.starts_with("M104 T0 S210\r\n;PRE-PRIME-TOWER\r\n"));
    assert!(written.ends_with("M104 T0 S0\r\n"));
}

#[test]
fn test_run_reports_missing_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("absent.gcode");
    let config = Config::from_layers(args(&[input.to_str().unwrap()]), vec![]);
    let err = gcode_postprocess::cli::run_with(config).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.gcode"));
}

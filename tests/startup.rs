use std::time::Duration;

use cia402::{
    config::{DriveConfig, Limits},
    error::ConfigError,
    startup::{FromStartup, StartupParameterSource, StartupParameters},
};

const TWO_AXES: &str = "
# software position limits
0x607D, 1, -3600, 0
0x607D, 2,  3600, 0   # axis 1 unbounded

0x6072, 0, 0x1F4, 0
0x6081, 0, 350, 0200
\t0x60C2,\t1, 2, 4
";

#[test]
fn parses_comments_hex_and_negatives() {
    let params = StartupParameters::parse(TWO_AXES).unwrap();
    assert_eq!(params.len(), 5);
    assert_eq!(params.axes(), 2);

    assert_eq!(params.lookup(0x607D, 1, 0), Some((-3600_i32) as u32));
    assert_eq!(params.lookup(0x607D, 2, 0), Some(3600));
    assert_eq!(params.lookup(0x6072, 0, 0), Some(500));
    // leading zero is octal
    assert_eq!(params.lookup(0x6081, 0, 1), Some(128));
    assert_eq!(params.lookup(0x60C2, 1, 1), Some(4));
    assert_eq!(params.lookup(0x6083, 0, 0), None);
    assert_eq!(params.lookup(0x607D, 1, 2), None);
}

#[test]
fn keeps_file_order_per_axis() {
    let params = StartupParameters::parse(TWO_AXES).unwrap();
    let objects: Vec<(u16, u8, u32)> = params.for_axis(1).collect();
    assert_eq!(
        objects,
        vec![
            (0x607D, 1, 0),
            (0x607D, 2, 0),
            (0x6072, 0, 0),
            (0x6081, 0, 128),
            (0x60C2, 1, 4),
        ]
    );
}

#[test]
fn rejects_column_mismatch() {
    let err = StartupParameters::parse("0x6081, 0, 1, 2\n0x6083, 0, 3\n").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ParameterCount {
            line: 2,
            expected: 4,
            found: 3
        }
    ));

    let err = StartupParameters::parse("0x6081, 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::ParameterCount { line: 1, .. }));
}

#[test]
fn rejects_garbage() {
    let err = StartupParameters::parse("0x6081, 0, fast\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { line: 1, ref token } if token == "fast"));

    let err = StartupParameters::parse("0x16081, 0, 1\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn empty_file_is_an_error() {
    assert!(matches!(
        StartupParameters::parse("# nothing here\n\n   \n"),
        Err(ConfigError::Empty)
    ));
}

#[test]
fn maps_drive_config() {
    let params = StartupParameters::parse(TWO_AXES).unwrap();

    let axis0 = DriveConfig::from_startup(&params, 0).unwrap();
    assert_eq!(axis0.limits, Limits::position(-3600.0, 3600.0).with_max_torque(500.0));
    assert_eq!(axis0.profile_velocity, 350.0);
    assert_eq!(axis0.cycle_period, Duration::from_millis(2));
    // not in the file
    assert_eq!(axis0.profile_acceleration, DriveConfig::default().profile_acceleration);

    let axis1 = DriveConfig::from_startup(&params, 1).unwrap();
    assert_eq!(axis1.limits, Limits::default());
    assert_eq!(axis1.profile_velocity, 128.0);
    assert_eq!(axis1.cycle_period, Duration::from_millis(4));

    assert!(matches!(
        DriveConfig::from_startup(&params, 2),
        Err(ConfigError::NoSuchAxis { axis: 2, axes: 2 })
    ));
}

#[test]
fn zero_interpolation_period_is_rejected() {
    let params = StartupParameters::parse("0x60C2, 1, 0\n").unwrap();
    assert!(matches!(
        DriveConfig::from_startup(&params, 0),
        Err(ConfigError::NonPositive { .. })
    ));
}

#[test]
fn reads_from_file() {
    let path = std::env::temp_dir().join(format!("cia402-startup-{}.csv", std::process::id()));
    std::fs::write(&path, TWO_AXES).unwrap();
    let params = StartupParameters::from_file(&path);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(params.unwrap().len(), 5);

    assert!(matches!(
        StartupParameters::from_file("/nonexistent/startup.csv"),
        Err(ConfigError::Io(_))
    ));
}

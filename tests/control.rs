//! Control plane through its two front-ends.

use simtemp::{
    AttributeError, ConfigError, Configuration, ControlError, Mode, SimTemp,
    control::{attributes, batch},
};

fn dev() -> SimTemp {
    SimTemp::new(Configuration::default(), 8).unwrap()
}

#[test]
fn batch_set_is_visible_through_attributes() {
    let d = dev();
    let mut payload = batch::encode_config(&Configuration::new(250, 42_000, Mode::Ramp));
    batch::dispatch(&d, batch::SET_CONFIG, &mut payload).unwrap();

    assert_eq!(attributes::show_by_name(&d, "sampling_ms").unwrap(), "250\n");
    assert_eq!(attributes::show_by_name(&d, "threshold_mC").unwrap(), "42000\n");
    assert_eq!(attributes::show_by_name(&d, "mode").unwrap(), "ramp\n");
}

#[test]
fn attribute_writes_are_visible_through_batch() {
    let d = dev();
    attributes::store_by_name(&d, "sampling_ms", "20\n").unwrap();
    attributes::store_by_name(&d, "mode", " noisy ").unwrap();

    let mut out = [0u8; batch::CONFIG_RECORD_SIZE];
    batch::dispatch(&d, batch::GET_CONFIG, &mut out).unwrap();
    let got = batch::decode_config(&out).unwrap();
    assert_eq!(got, Configuration::new(20, 45_000, Mode::Noisy));
}

#[test]
fn out_of_range_sampling_is_refused_everywhere() {
    let d = dev();

    assert!(matches!(
        attributes::store_by_name(&d, "sampling_ms", "5"),
        Err(AttributeError::Invalid(ConfigError::SamplingOutOfRange { value: 5, .. }))
    ));
    assert!(attributes::store_by_name(&d, "sampling_ms", "10001").is_err());

    let mut payload = batch::encode_config(&Configuration::new(5, 0, Mode::Noisy));
    assert!(matches!(
        batch::dispatch(&d, batch::SET_CONFIG, &mut payload),
        Err(ControlError::Invalid(ConfigError::SamplingOutOfRange { .. }))
    ));

    assert_eq!(d.get_config(), Configuration::default());
}

#[test]
fn range_bounds_are_inclusive() {
    let d = dev();
    attributes::store_by_name(&d, "sampling_ms", "10").unwrap();
    attributes::store_by_name(&d, "sampling_ms", "10000").unwrap();
    assert_eq!(d.get_config().sampling_ms, 10_000);
}

#[test]
fn stats_line_tracks_short_reads() {
    let d = dev();
    let mut small = [0u8; 4];
    assert!(d.read(&mut small, simtemp::ReadMode::NonBlocking).is_err());
    assert_eq!(
        attributes::show_by_name(&d, "stats").unwrap(),
        "updates=0 alerts=0 errors=1\n"
    );
}

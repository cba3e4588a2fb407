//! Determinism of the spread state machine on fixed z-score sequences.

use ronda_signals::PositionState::{Flat, LongSpread, ShortSpread};
use ronda_signals::{ReversionConfig, SignalSeries, SpreadReversion, Thresholds, compute_spread};
use ronda_traits::{Date, RondaError, SignalRule, TimeSeries};

fn dates(n: usize) -> Vec<Date> {
    let start = Date::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}

#[test]
fn fixed_sequence_follows_transition_table() {
    let z = [0.0, 2.5, 2.0, -0.2, -2.6, 0.1];
    let series = SignalSeries::from_zscores(
        dates(z.len()),
        z.iter().copied().map(Some).collect(),
        Thresholds::new(2.0, 0.5).unwrap(),
    )
    .unwrap();

    assert_eq!(
        series.states(),
        &[Flat, ShortSpread, ShortSpread, Flat, LongSpread, Flat]
    );
    // The short is closed with +1 at -0.2 and the long with -1 at 0.1.
    assert_eq!(series.signals(), &[0, -1, 0, 1, 1, -1]);
    assert_eq!(series.positions(), vec![0, -1, -1, 0, 1, 0]);
    assert_eq!(series.entries(), 2);
}

#[test]
fn rerunning_gives_identical_output() {
    let values: Vec<f64> = (0..60)
        .map(|i| 0.01 * (i as f64 * 0.7).sin() + 0.004 * (i as f64 * 2.3).cos())
        .collect();
    let spread = TimeSeries::new("spread", dates(values.len()), values).unwrap();
    let rule = SpreadReversion::new(ReversionConfig {
        window: 10,
        entry_z: 1.2,
        exit_z: 0.3,
    });

    let first = rule.run(&spread).unwrap();
    let second = rule.run(&spread).unwrap();
    assert_eq!(first, second);
    assert_eq!(rule.generate(&spread).unwrap(), first.signals());
}

#[test]
fn undefined_rows_emit_zero() {
    let values = vec![0.01, -0.01, 0.02, 0.03, -0.02, 0.0];
    let spread = TimeSeries::new("spread", dates(values.len()), values).unwrap();
    let rule = SpreadReversion::new(ReversionConfig {
        window: 4,
        entry_z: 0.1,
        exit_z: 0.0,
    });
    let out = rule.run(&spread).unwrap();
    assert_eq!(&out.signals()[..3], &[0, 0, 0]);
    assert_eq!(&out.states()[..3], &[Flat, Flat, Flat]);
}

#[test]
fn spread_refuses_misaligned_series() {
    let basket = TimeSeries::new("basket", dates(5), vec![0.0; 5]).unwrap();
    let benchmark = TimeSeries::new("index", dates(4), vec![0.0; 4]).unwrap();
    let result = compute_spread(&basket, &benchmark);
    assert!(matches!(result, Err(RondaError::DataContract(_))));
}

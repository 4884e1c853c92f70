use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use tickstats::{
    window_capacity, RegistryConfig, StatsError, SymbolRegistry, WindowAggregator,
    MAX_WINDOW_EXPONENT, MIN_WINDOW_EXPONENT,
};

/// Statistics recomputed from scratch over a slice: (min, max, avg, var)
fn naive_stats(values: &[f64]) -> (f64, f64, f64, f64) {
    let n = values.len() as f64;
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / n;
    (min, max, avg, var)
}

fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-6 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_window_tracks_tail_of_stream() {
    let values: Vec<f64> = (0..1000).map(|i| ((i * 31) % 97) as f64 - 48.0).collect();

    for capacity in [1, 7, 10, 100, 1000] {
        let mut window = WindowAggregator::new(capacity);
        for &v in &values {
            window.add(v);
        }

        let tail = &values[values.len() - capacity.min(values.len())..];
        let (min, max, avg, var) = naive_stats(tail);

        let snapshot = window.snapshot().unwrap();
        assert_eq!(snapshot.count, tail.len());
        assert_eq!(snapshot.min, min);
        assert_eq!(snapshot.max, max);
        assert_eq!(snapshot.last, *tail.last().unwrap());
        assert_close(snapshot.avg, avg);
        assert_close(snapshot.var, var);
    }
}

#[test]
fn test_concrete_capacity_five_scenario() {
    let mut window = WindowAggregator::new(5);
    for v in [142.35, 144.50, 143.75, 145.20, 141.90] {
        window.add(v);
    }

    let snapshot = window.snapshot().unwrap();
    assert_close(snapshot.avg, 143.54);
    assert_close(snapshot.var, 1.5654);
    assert_eq!(snapshot.min, 141.90);
    assert_eq!(snapshot.max, 145.20);
    assert_eq!(snapshot.count, 5);

    window.add(146.80);
    let snapshot = window.snapshot().unwrap();
    assert_close(snapshot.avg, 144.43);
    assert_close(snapshot.var, 2.6156);
    assert_eq!(snapshot.count, 5);
}

#[test]
fn test_concrete_capacity_three_scenario() {
    let mut window = WindowAggregator::new(3);
    for v in [1.0, 2.0, 3.0, 4.0] {
        window.add(v);
    }

    let snapshot = window.snapshot().unwrap();
    assert_eq!(snapshot.min, 2.0);
    assert_eq!(snapshot.max, 4.0);
    assert_eq!(snapshot.count, 3);
}

#[test]
fn test_repeated_queries_are_bit_identical() {
    let registry = SymbolRegistry::default();
    registry.ingest("AAPL", &[1.25, 2.5, 3.75, 2.5]).unwrap();

    let first = registry.query("AAPL", 2).unwrap();
    for _ in 0..10 {
        let again = registry.query("AAPL", 2).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn test_symbol_cap_boundary() {
    let registry = SymbolRegistry::new(RegistryConfig::default());

    // Registering exactly max_symbols distinct symbols succeeds.
    for i in 0..10 {
        registry.ingest(&format!("SYM{i}"), &[i as f64]).unwrap();
    }
    assert_eq!(registry.symbol_count(), 10);

    // The 11th fails and registers nothing.
    let err = registry.ingest("SYM10", &[99.0]).unwrap_err();
    assert!(matches!(err, StatsError::MaxSymbolsReached { limit: 10 }));
    assert_eq!(registry.symbol_count(), 10);

    // The existing 10 remain queryable.
    for i in 0..10 {
        let snapshot = registry.query(&format!("SYM{i}"), 1).unwrap();
        assert_eq!(snapshot.last, i as f64);
    }
}

#[test]
fn test_every_window_sees_every_batch() {
    let registry = SymbolRegistry::default();
    let batch: Vec<f64> = (0..25).map(|i| i as f64).collect();
    registry.ingest("AAPL", &batch).unwrap();

    for k in MIN_WINDOW_EXPONENT..=MAX_WINDOW_EXPONENT {
        let snapshot = registry.query("AAPL", k).unwrap();
        let retained = batch.len().min(window_capacity(k));
        assert_eq!(snapshot.count, retained);
        assert_eq!(snapshot.last, 24.0);
        // The k=1 window holds only the last 10 values.
        let expected_min = (batch.len() - retained) as f64;
        assert_eq!(snapshot.min, expected_min);
    }
}

#[test]
fn test_concurrent_ingest_distinct_symbols() {
    let registry = Arc::new(SymbolRegistry::default());
    let mut handles = Vec::new();

    for i in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            let symbol = format!("SYM{i}");
            for batch in 0..50 {
                let values: Vec<f64> = (0..20).map(|j| (batch * 20 + j) as f64).collect();
                registry.ingest(&symbol, &values).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.symbol_count(), 8);
    for i in 0..8 {
        let snapshot = registry.query(&format!("SYM{i}"), 3).unwrap();
        assert_eq!(snapshot.count, 1000);
        assert_eq!(snapshot.last, 999.0);
    }
}

#[test]
fn test_concurrent_first_ingest_same_symbol() {
    // Two racing first-time ingests for one new symbol must produce exactly
    // one entry, with both batches fully applied.
    for _ in 0..20 {
        let registry = Arc::new(SymbolRegistry::default());
        let mut handles = Vec::new();
        for t in 0..4 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                let values: Vec<f64> = (0..100).map(|j| (t * 100 + j) as f64).collect();
                registry.ingest("NEW", &values).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.symbol_count(), 1);
        let snapshot = registry.query("NEW", 3).unwrap();
        assert_eq!(snapshot.count, 400);
    }
}

#[test]
fn test_queries_never_see_partial_batches() {
    // Each batch is 100 copies of one value, so any snapshot taken between
    // batches has zero variance in the 10^2 window; a snapshot observing a
    // half-applied batch would mix two values.
    let registry = Arc::new(SymbolRegistry::default());
    registry.ingest("AAPL", &vec![1.0; 100]).unwrap();

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for batch in 2..200u32 {
                registry.ingest("AAPL", &vec![batch as f64; 100]).unwrap();
            }
        })
    };
    let reader = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for _ in 0..500 {
                let snapshot = registry.query("AAPL", 2).unwrap();
                // A half-applied batch mixes two values a whole unit apart,
                // giving var >= 0.01 in the 100-element window.
                assert!(
                    snapshot.var.abs() < 1e-3,
                    "observed a partially applied batch: var={}",
                    snapshot.var
                );
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}

proptest! {
    #[test]
    fn prop_window_matches_naive_recomputation(
        values in proptest::collection::vec(-1.0e6f64..1.0e6, 1..300),
        capacity in 1usize..60,
    ) {
        let mut window = WindowAggregator::new(capacity);
        for &v in &values {
            window.add(v);
        }

        let tail = &values[values.len().saturating_sub(capacity)..];
        let (min, max, avg, var) = naive_stats(tail);

        let snapshot = window.snapshot().unwrap();
        prop_assert_eq!(snapshot.count, tail.len());
        prop_assert_eq!(snapshot.min, min);
        prop_assert_eq!(snapshot.max, max);
        prop_assert_eq!(snapshot.last, *tail.last().unwrap());

        let avg_tol = 1e-6 * avg.abs().max(1.0);
        prop_assert!((snapshot.avg - avg).abs() <= avg_tol,
            "avg {} vs naive {}", snapshot.avg, avg);

        let var_tol = 1e-2 * var.abs().max(1.0);
        prop_assert!((snapshot.var - var).abs() <= var_tol,
            "var {} vs naive {}", snapshot.var, var);
    }
}

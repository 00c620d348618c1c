use psys_core::Multiset;

/// Builds a multiset from `(symbol, count)` pairs, for terse test fixtures.
pub fn ms(pairs: &[(&str, u64)]) -> Multiset {
    Multiset::from_pairs(pairs.iter().map(|(s, n)| (*s, *n)))
}

/// Installs a `tracing` subscriber that writes through the test harness's
/// captured output, so `#[instrument]`/`debug!` spans show up under
/// `cargo test -- --nocapture` instead of vanishing.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

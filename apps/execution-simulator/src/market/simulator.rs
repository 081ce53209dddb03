//! Synthetic market data.
//!
//! One last price per instrument, seeded on first sight and advanced by a
//! Gaussian random walk on every tick. Quote subscribers are invoked after
//! each tick with a fresh quote for their instrument.

use std::collections::{HashMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::random::{RandomSource, SeededRandom};
use crate::config::SimulationConfig;
use crate::models::{InstrumentId, Quote};

/// Rolling history length per instrument.
pub const HISTORY_CAPACITY: usize = 100;

/// Prices never fall below one tick.
const PRICE_FLOOR: Decimal = dec!(0.01);

/// Bid/ask spread as a fraction of the last price (0.1%).
const SPREAD_FRACTION: Decimal = dec!(0.001);

/// Callback invoked with every new quote for a subscribed instrument.
pub type QuoteCallback = Arc<dyn Fn(&InstrumentId, &Quote) + Send + Sync>;

#[derive(Debug)]
struct TrackedInstrument {
    price: Decimal,
    volatility: f64,
    history: VecDeque<Decimal>,
}

impl TrackedInstrument {
    fn new(price: Decimal, volatility: f64) -> Self {
        let mut history = VecDeque::with_capacity(HISTORY_CAPACITY);
        history.push_back(price);
        Self {
            price,
            volatility,
            history,
        }
    }

    fn record(&mut self, price: Decimal) {
        self.price = price;
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(price);
    }
}

#[derive(Default)]
struct MarketState {
    instruments: HashMap<InstrumentId, TrackedInstrument>,
    subscribers: Vec<(InstrumentId, QuoteCallback)>,
}

/// Synthetic price source shared by a venue's processing loop and its callers.
pub struct MarketDataSimulator {
    state: RwLock<MarketState>,
    rng: Mutex<Box<dyn RandomSource>>,
    default_volatility: f64,
    tick_interval: Duration,
}

impl std::fmt::Debug for MarketDataSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MarketDataSimulator")
            .field("instruments", &state.instruments.len())
            .field("subscribers", &state.subscribers.len())
            .field("default_volatility", &self.default_volatility)
            .field("tick_interval", &self.tick_interval)
            .finish_non_exhaustive()
    }
}

impl MarketDataSimulator {
    /// Simulator seeded from `config.seed`.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self::with_random(config, Box::new(SeededRandom::from_seed(config.seed)))
    }

    /// Simulator drawing from the given source.
    #[must_use]
    pub fn with_random(config: &SimulationConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            state: RwLock::new(MarketState::default()),
            rng: Mutex::new(rng),
            default_volatility: config.default_volatility,
            tick_interval: config.tick_interval(),
        }
    }

    /// Current quote, seeding the instrument if it has not been seen.
    pub fn get_quote(&self, instrument_id: &InstrumentId) -> Quote {
        let price = self.market_price(instrument_id);
        self.quote_at(instrument_id, price)
    }

    /// Current price, seeding the instrument if it has not been seen.
    pub fn market_price(&self, instrument_id: &InstrumentId) -> Decimal {
        if let Some(price) = self.last_price(instrument_id) {
            return price;
        }
        let mut state = self.state.write();
        self.track(&mut state, instrument_id).price
    }

    /// Last price of a tracked instrument.
    pub fn last_price(&self, instrument_id: &InstrumentId) -> Option<Decimal> {
        self.state
            .read()
            .instruments
            .get(instrument_id)
            .map(|tracked| tracked.price)
    }

    /// Override the price of an instrument, tracking it if needed.
    pub fn set_price(&self, instrument_id: &InstrumentId, price: Decimal) {
        let price = price.max(PRICE_FLOOR);
        let mut state = self.state.write();
        match state.instruments.get_mut(instrument_id) {
            Some(tracked) => tracked.record(price),
            None => {
                state.instruments.insert(
                    instrument_id.clone(),
                    TrackedInstrument::new(price, self.default_volatility),
                );
            }
        }
    }

    /// Override the per-tick volatility (percent units) of an instrument.
    pub fn set_volatility(&self, instrument_id: &InstrumentId, volatility: f64) {
        let mut state = self.state.write();
        self.track(&mut state, instrument_id).volatility = volatility.max(0.0);
    }

    /// Recent prices, oldest first.
    pub fn price_history(&self, instrument_id: &InstrumentId) -> Vec<Decimal> {
        self.state
            .read()
            .instruments
            .get(instrument_id)
            .map(|tracked| tracked.history.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every instrument with a price.
    pub fn tracked_instruments(&self) -> Vec<InstrumentId> {
        let mut ids: Vec<_> = self.state.read().instruments.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Register `callback` for each instrument, seeding unseen ones.
    pub fn subscribe(&self, instruments: &[InstrumentId], callback: QuoteCallback) {
        let mut state = self.state.write();
        for instrument_id in instruments {
            self.track(&mut state, instrument_id);
            state
                .subscribers
                .push((instrument_id.clone(), Arc::clone(&callback)));
        }
        tracing::debug!(instruments = instruments.len(), "Quote subscription added");
    }

    /// Remove the registrations of exactly this callback. Returns how many were removed.
    pub fn unsubscribe(&self, instruments: &[InstrumentId], callback: &QuoteCallback) -> usize {
        let mut state = self.state.write();
        let before = state.subscribers.len();
        state.subscribers.retain(|(instrument_id, registered)| {
            !(instruments.contains(instrument_id) && Arc::ptr_eq(registered, callback))
        });
        before - state.subscribers.len()
    }

    /// Number of live quote registrations.
    pub fn subscriber_count(&self) -> usize {
        self.state.read().subscribers.len()
    }

    /// Advance every tracked instrument one step and notify subscribers.
    pub fn tick(&self) {
        let notifications = {
            let mut state = self.state.write();
            let mut rng = self.rng.lock();
            for tracked in state.instruments.values_mut() {
                let change = rng.gaussian(tracked.volatility / 100.0);
                let factor = Decimal::ONE + Decimal::from_f64_retain(change).unwrap_or_default();
                let next = round_price(tracked.price * factor).max(PRICE_FLOOR);
                tracked.record(next);
            }
            drop(rng);

            state
                .subscribers
                .iter()
                .filter_map(|(instrument_id, callback)| {
                    state
                        .instruments
                        .get(instrument_id)
                        .map(|tracked| (instrument_id.clone(), tracked.price, Arc::clone(callback)))
                })
                .collect::<Vec<_>>()
        };

        for (instrument_id, price, callback) in notifications {
            let quote = self.quote_at(&instrument_id, price);
            if catch_unwind(AssertUnwindSafe(|| callback(&instrument_id, &quote))).is_err() {
                tracing::warn!(instrument = %instrument_id, "Quote subscriber panicked");
            }
        }
    }

    /// Spawn the tick loop. It stops when `shutdown` is cancelled.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::debug!(interval_ms = self.tick_interval.as_millis(), "Market data loop started");
            loop {
                tokio::select! {
                    () = tokio::time::sleep(self.tick_interval) => self.tick(),
                    () = shutdown.cancelled() => break,
                }
            }
            tracing::debug!("Market data loop stopped");
        })
    }

    fn track<'a>(
        &self,
        state: &'a mut MarketState,
        instrument_id: &InstrumentId,
    ) -> &'a mut TrackedInstrument {
        state
            .instruments
            .entry(instrument_id.clone())
            .or_insert_with(|| {
                let price = seed_price(&mut **self.rng.lock(), instrument_id);
                tracing::debug!(instrument = %instrument_id, %price, "Seeded instrument price");
                TrackedInstrument::new(price, self.default_volatility)
            })
    }

    fn quote_at(&self, instrument_id: &InstrumentId, price: Decimal) -> Quote {
        let half_spread = price * SPREAD_FRACTION / Decimal::TWO;
        let volume = self.rng.lock().integer(1_000, 10_000);
        Quote {
            instrument_id: instrument_id.clone(),
            bid: price - half_spread,
            ask: price + half_spread,
            last_price: price,
            volume,
            timestamp: Utc::now(),
        }
    }
}

/// Starting price range for an instrument, keyed on its id.
///
/// Index names are checked before the option marker, so an index option
/// such as `NFO:NIFTY.OPT.24000CE` seeds at the index level.
#[must_use]
pub fn seed_range(instrument_id: &InstrumentId) -> (f64, f64) {
    let id = instrument_id.as_str();
    if id.contains("BANKNIFTY") {
        (45_000.0, 50_000.0)
    } else if id.contains("NIFTY") {
        (22_000.0, 24_000.0)
    } else if instrument_id.is_option() {
        (50.0, 500.0)
    } else {
        (100.0, 2_000.0)
    }
}

fn seed_price<R: RandomSource + ?Sized>(rng: &mut R, instrument_id: &InstrumentId) -> Decimal {
    let (low, high) = seed_range(instrument_id);
    let draw = rng.uniform(low, high);
    let price = Decimal::from_f64_retain(draw).unwrap_or_else(|| Decimal::from(low as i64));
    round_price(price).max(PRICE_FLOOR)
}

fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;

    fn simulator() -> MarketDataSimulator {
        MarketDataSimulator::new(&SimulationConfig {
            seed: Some(11),
            ..SimulationConfig::default()
        })
    }

    #[test_case("NFO:BANKNIFTY.FUT.JAN", 45_000.0, 50_000.0 ; "banknifty")]
    #[test_case("NSE:NIFTY50", 22_000.0, 24_000.0 ; "nifty")]
    #[test_case("NFO:NIFTY.OPT.24000CE", 22_000.0, 24_000.0 ; "index option seeds at index level")]
    #[test_case("NFO:RELIANCE.OPT.2500CE", 50.0, 500.0 ; "option")]
    #[test_case("NSE:RELIANCE", 100.0, 2_000.0 ; "equity")]
    fn seeded_prices_fall_in_range(id: &str, low: f64, high: f64) {
        let sim = simulator();
        let instrument = InstrumentId::new(id);
        let price = sim.market_price(&instrument);
        assert!(price >= Decimal::from_f64_retain(low).unwrap());
        assert!(price <= Decimal::from_f64_retain(high).unwrap());
        assert_eq!(sim.last_price(&instrument), Some(price));
    }

    #[test]
    fn quote_brackets_last_price() {
        let sim = simulator();
        let instrument = InstrumentId::new("X");
        sim.set_price(&instrument, dec!(1000));
        let quote = sim.get_quote(&instrument);
        assert_eq!(quote.last_price, dec!(1000));
        assert_eq!(quote.bid, dec!(999.5));
        assert_eq!(quote.ask, dec!(1000.5));
        assert!((1_000..=10_000).contains(&quote.volume));
    }

    #[test]
    fn tick_keeps_prices_positive_and_caps_history() {
        let sim = simulator();
        let instrument = InstrumentId::new("NSE:PENNY");
        sim.set_price(&instrument, dec!(0.02));
        sim.set_volatility(&instrument, 500.0);
        for _ in 0..(HISTORY_CAPACITY + 20) {
            sim.tick();
            assert!(sim.last_price(&instrument).unwrap() >= PRICE_FLOOR);
        }
        assert_eq!(sim.price_history(&instrument).len(), HISTORY_CAPACITY);
    }

    #[test]
    fn zero_volatility_holds_price() {
        let sim = MarketDataSimulator::new(&SimulationConfig::deterministic());
        let instrument = InstrumentId::new("NSE:ITC");
        sim.set_price(&instrument, dec!(450.25));
        sim.tick();
        sim.tick();
        assert_eq!(sim.last_price(&instrument), Some(dec!(450.25)));
    }

    #[test]
    fn subscribers_receive_quotes_and_unsubscribe_by_identity() {
        let sim = simulator();
        let a = InstrumentId::new("NSE:A");
        let b = InstrumentId::new("NSE:B");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let callback: QuoteCallback = Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let other: QuoteCallback = Arc::new(|_, _| {});

        sim.subscribe(&[a.clone(), b.clone()], Arc::clone(&callback));
        sim.subscribe(&[a.clone()], Arc::clone(&other));
        assert_eq!(sim.tracked_instruments(), vec![a.clone(), b.clone()]);

        sim.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        assert_eq!(sim.unsubscribe(&[a.clone()], &callback), 1);
        assert_eq!(sim.subscriber_count(), 2);
        sim.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_tick() {
        let sim = simulator();
        let instrument = InstrumentId::new("NSE:BOOM");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        sim.subscribe(&[instrument.clone()], Arc::new(|_, _| panic!("subscriber failure")));
        sim.subscribe(
            &[instrument],
            Arc::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        sim.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tick_loop_stops_on_cancel() {
        let sim = Arc::new(MarketDataSimulator::new(&SimulationConfig {
            tick_interval_ms: 5,
            ..SimulationConfig::default()
        }));
        let instrument = InstrumentId::new("NSE:LOOP");
        sim.set_price(&instrument, dec!(100));
        let shutdown = CancellationToken::new();
        let handle = Arc::clone(&sim).spawn(shutdown.clone());
        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.cancel();
        handle.await.unwrap();
        assert!(sim.price_history(&instrument).len() > 1);
    }
}

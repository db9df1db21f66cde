use crate::allocation::{build_plan_detailed, PlanPolicies, PlanReport};
use crate::recommendation::{recommend, RecommendPolicies, Recommendation};
use chrono::{DateTime, Utc};
use hybrid_domain::errors::CoreError;
use hybrid_domain::repositories::forecast::ForecastRepository;
use hybrid_domain::repositories::headlines::HeadlineRepository;
use hybrid_domain::repositories::prices::PriceTableRepository;
use hybrid_domain::value_objects::period::Period;
use hybrid_domain::value_objects::ticker::Ticker;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Map whose entries expire `ttl` after insertion.
pub struct TtlCache<K, V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: HashMap<K, (Instant, V)>,
    name: &'static str,
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self::with_clock(name, ttl, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash,
    V: Clone,
    C: Clock,
{
    pub fn with_clock(name: &'static str, ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: HashMap::new(),
            name,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let fresh = match self.entries.get(key) {
            Some((stored_at, _)) => now.duration_since(*stored_at) < self.ttl,
            None => return None,
        };
        if !fresh {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|(_, value)| value.clone())
    }

    /// Stores `value` and purges every entry that has already expired.
    pub fn insert(&mut self, key: K, value: V) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries
            .retain(|_, (stored_at, _)| now.duration_since(*stored_at) < ttl);
        self.entries.insert(key, (now, value));
    }

    /// Returns the cached value or computes, stores and returns a new one.
    /// Errors pass through and leave the cache untouched.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(&key) {
            metrics::counter!("hybrid.app.cache.hits_total", "cache" => self.name).increment(1);
            return Ok(hit);
        }
        metrics::counter!("hybrid.app.cache.misses_total", "cache" => self.name).increment(1);
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// [`recommend`] behind a TTL cache keyed by `(ticker, keyword)`.
pub struct CachedRecommender<'a, C: Clock = SystemClock> {
    forecasts: &'a dyn ForecastRepository,
    headlines: &'a dyn HeadlineRepository,
    policies: RecommendPolicies,
    cache: TtlCache<(Ticker, String), Recommendation, C>,
}

impl<'a> CachedRecommender<'a, SystemClock> {
    pub fn new(
        forecasts: &'a dyn ForecastRepository,
        headlines: &'a dyn HeadlineRepository,
        policies: RecommendPolicies,
        ttl: Duration,
    ) -> Self {
        Self::with_clock(forecasts, headlines, policies, ttl, SystemClock)
    }
}

impl<'a, C: Clock> CachedRecommender<'a, C> {
    pub fn with_clock(
        forecasts: &'a dyn ForecastRepository,
        headlines: &'a dyn HeadlineRepository,
        policies: RecommendPolicies,
        ttl: Duration,
        clock: C,
    ) -> Self {
        Self {
            forecasts,
            headlines,
            policies,
            cache: TtlCache::with_clock("recommendation", ttl, clock),
        }
    }

    pub fn recommend(
        &mut self,
        ticker: &Ticker,
        keyword: &str,
        now: DateTime<Utc>,
    ) -> Result<Recommendation, CoreError> {
        let (forecasts, headlines, policies) = (self.forecasts, self.headlines, &self.policies);
        self.cache
            .get_or_try_insert_with((ticker.clone(), keyword.to_string()), || {
                recommend(ticker, keyword, forecasts, headlines, policies, now)
            })
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// [`build_plan_detailed`] behind a TTL cache keyed by the amount.
pub struct CachedPlanner<'a, C: Clock = SystemClock> {
    prices: &'a dyn PriceTableRepository,
    universe: Vec<String>,
    window: Period,
    policies: PlanPolicies,
    cache: TtlCache<u64, PlanReport, C>,
}

impl<'a> CachedPlanner<'a, SystemClock> {
    pub fn new(
        prices: &'a dyn PriceTableRepository,
        universe: Vec<String>,
        window: Period,
        policies: PlanPolicies,
        ttl: Duration,
    ) -> Self {
        Self::with_clock(prices, universe, window, policies, ttl, SystemClock)
    }
}

impl<'a, C: Clock> CachedPlanner<'a, C> {
    pub fn with_clock(
        prices: &'a dyn PriceTableRepository,
        universe: Vec<String>,
        window: Period,
        policies: PlanPolicies,
        ttl: Duration,
        clock: C,
    ) -> Self {
        Self {
            prices,
            universe,
            window,
            policies,
            cache: TtlCache::with_clock("plan", ttl, clock),
        }
    }

    pub fn plan(&mut self, amount: f64) -> Result<PlanReport, CoreError> {
        let (prices, universe, window, policies) =
            (self.prices, &self.universe, &self.window, &self.policies);
        self.cache.get_or_try_insert_with(amount.to_bits(), || {
            build_plan_detailed(amount, prices, universe, window, policies)
        })
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

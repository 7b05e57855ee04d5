//! Ambient Particle Generator
//!
//! Drives the decorative snowfall behind the display. On a fixed interval
//! the generator creates a particle with randomized visual parameters and
//! schedules its removal once its fall animation is guaranteed to be over.
//!
//! The generator never talks to the scan controller. It owns the active
//! particle set exclusively; surfaces only read it to draw.
//!
//! # Invariants
//!
//! - The active count never exceeds `max_particles`.
//! - Every particle gets exactly one removal deadline, keyed by its id.
//!   Removing a particle cancels that deadline, so no particle is removed
//!   twice and none is leaked.

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::scheduler::Scheduler;

/// Longest particle fall or delay, in seconds
pub const MAX_PARTICLE_SECS: f32 = 3600.0;

/// Inclusive-exclusive range a parameter is drawn from
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound (inclusive)
    pub min: f32,
    /// Upper bound (exclusive, unless equal to `min`)
    pub max: f32,
}

impl ValueRange {
    /// Create a range
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draw a value uniformly. A degenerate or unsampleable range always
    /// yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min && (self.max - self.min).is_finite() {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }

    /// Whether both bounds are finite and ordered, and their span is finite
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min <= self.max
            && (self.max - self.min).is_finite()
    }

    /// Whether `value` lies within the range
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && (value < self.max || value == self.min)
    }
}

/// Particle generator settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Time between spawn ticks
    pub spawn_interval_ms: u64,
    /// Maximum concurrent particles
    pub max_particles: usize,
    /// Particle size (surface units)
    pub size: ValueRange,
    /// Fall animation length in seconds
    pub duration_secs: ValueRange,
    /// Delay before the fall starts, in seconds
    pub delay_secs: ValueRange,
    /// Extra time after the animation before removal (at least 1000)
    pub removal_buffer_ms: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 1500,
            max_particles: 50,
            size: ValueRange::new(10.0, 20.0),
            duration_secs: ValueRange::new(25.0, 35.0),
            delay_secs: ValueRange::new(0.0, 10.0),
            removal_buffer_ms: 1000,
        }
    }
}

impl ParticleConfig {
    /// Spawn interval as a `Duration`
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    /// Removal buffer as a `Duration`
    #[must_use]
    pub fn removal_buffer(&self) -> Duration {
        Duration::from_millis(self.removal_buffer_ms)
    }
}

/// Unique particle identifier, monotonically increasing per generator
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(u64);

impl ParticleId {
    /// Raw numeric value
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "particle-{}", self.0)
    }
}

/// One decorative particle
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Identifier
    pub id: ParticleId,
    /// Horizontal position as a percentage of the visible width
    pub x_percent: f32,
    /// Size in surface units
    pub size: f32,
    /// Fall animation length
    pub duration: Duration,
    /// Delay before the fall starts
    pub delay: Duration,
    /// When it was created
    pub spawned_at: Instant,
    /// When it is removed
    pub remove_at: Instant,
}

impl Particle {
    /// Animation progress at `now`: `None` while still delayed, then 0.0..=1.0
    #[must_use]
    pub fn progress(&self, now: Instant) -> Option<f32> {
        let started = self.spawned_at + self.delay;
        if now < started {
            return None;
        }
        if self.duration.is_zero() {
            return Some(1.0);
        }
        let elapsed = now.duration_since(started).as_secs_f32();
        Some((elapsed / self.duration.as_secs_f32()).min(1.0))
    }

    /// When the fall animation ends
    #[must_use]
    pub fn animation_end(&self) -> Instant {
        self.spawned_at + self.delay + self.duration
    }
}

/// What changed during one [`ParticleGenerator::poll`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParticleUpdate {
    /// Particle created by this poll
    pub spawned: Option<ParticleId>,
    /// Particles removed by this poll
    pub removed: Vec<ParticleId>,
}

impl ParticleUpdate {
    /// Whether anything changed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spawned.is_none() && self.removed.is_empty()
    }
}

/// The bounded snowfall generator
#[derive(Debug)]
pub struct ParticleGenerator<R = StdRng> {
    config: ParticleConfig,
    particles: Vec<Particle>,
    removals: Scheduler<ParticleId>,
    next_id: u64,
    next_spawn: Option<Instant>,
    spawned_total: u64,
    removed_total: u64,
    rng: R,
}

impl ParticleGenerator<StdRng> {
    /// Create a generator seeded from OS entropy
    #[must_use]
    pub fn new(config: ParticleConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a deterministic generator
    #[must_use]
    pub fn seeded(config: ParticleConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ParticleGenerator<R> {
    /// Create a generator with a caller-supplied RNG
    pub fn with_rng(config: ParticleConfig, rng: R) -> Self {
        Self {
            config,
            particles: Vec::new(),
            removals: Scheduler::new(),
            next_id: 0,
            next_spawn: None,
            spawned_total: 0,
            removed_total: 0,
            rng,
        }
    }

    /// Arm the spawn interval. The first tick happens one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_spawn = Some(now + self.config.spawn_interval());
    }

    /// Whether the spawn interval is armed
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.next_spawn.is_some()
    }

    /// Create one particle unless the cap is reached
    pub fn tick(&mut self, now: Instant) -> Option<ParticleId> {
        if self.particles.len() >= self.config.max_particles {
            return None;
        }

        let id = ParticleId(self.next_id);
        self.next_id += 1;

        let x_percent = self.rng.gen_range(0.0..100.0);
        let size = self.config.size.sample(&mut self.rng);
        let duration = secs(self.config.duration_secs.sample(&mut self.rng));
        let delay = secs(self.config.delay_secs.sample(&mut self.rng));
        let remove_at = now + duration + delay + self.config.removal_buffer();

        self.particles.push(Particle {
            id,
            x_percent,
            size,
            duration,
            delay,
            spawned_at: now,
            remove_at,
        });
        self.removals.schedule(id, remove_at);
        self.spawned_total += 1;

        tracing::trace!(%id, x_percent, size, active = self.particles.len(), "particle spawned");
        Some(id)
    }

    /// Remove a particle. Idempotent: returns false if it was already gone.
    pub fn remove(&mut self, id: ParticleId) -> bool {
        self.removals.cancel(&id);
        self.take(id)
    }

    fn take(&mut self, id: ParticleId) -> bool {
        match self.particles.iter().position(|p| p.id == id) {
            Some(index) => {
                self.particles.remove(index);
                self.removed_total += 1;
                tracing::trace!(%id, active = self.particles.len(), "particle removed");
                true
            }
            None => false,
        }
    }

    /// Run every removal that is due and, if the interval has elapsed, one spawn tick.
    ///
    /// Removals run first so a particle expiring on the same instant frees
    /// its slot for the new one. Missed spawn ticks are skipped, not bursted.
    pub fn poll(&mut self, now: Instant) -> ParticleUpdate {
        let mut update = ParticleUpdate::default();

        for id in self.removals.pop_due(now) {
            if self.take(id) {
                update.removed.push(id);
            }
        }

        if let Some(next_spawn) = self.next_spawn {
            if next_spawn <= now {
                update.spawned = self.tick(now);

                let interval = self.config.spawn_interval();
                let mut next = next_spawn + interval;
                if next <= now {
                    next = now + interval;
                }
                self.next_spawn = Some(next);
            }
        }

        update
    }

    /// Earliest of the next spawn tick and the next removal
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.next_spawn, self.removals.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Active particles in creation order
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Look up one active particle
    #[must_use]
    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    /// Number of active particles
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether no particles are active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Pending removal timers
    #[must_use]
    pub fn pending_removals(&self) -> usize {
        self.removals.len()
    }

    /// Particles created so far
    #[must_use]
    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    /// Particles removed so far
    #[must_use]
    pub fn removed_total(&self) -> u64 {
        self.removed_total
    }

    /// Settings in use
    #[must_use]
    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    /// Stop spawning and cancel every removal timer.
    ///
    /// Active particles stay readable for a final frame.
    pub fn shutdown(&mut self) {
        self.next_spawn = None;
        self.removals.cancel_all();
    }
}

/// Clamped into `0..=MAX_PARTICLE_SECS`; NaN reads as zero
fn secs(value: f32) -> Duration {
    Duration::from_secs_f32(value.max(0.0).min(MAX_PARTICLE_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn small_config(max: usize) -> ParticleConfig {
        ParticleConfig {
            spawn_interval_ms: 100,
            max_particles: max,
            size: ValueRange::new(1.0, 3.0),
            duration_secs: ValueRange::new(1.0, 2.0),
            delay_secs: ValueRange::new(0.0, 1.0),
            removal_buffer_ms: 1000,
        }
    }

    #[test]
    fn test_tick_respects_cap() {
        let t0 = Instant::now();
        let mut gen = ParticleGenerator::seeded(small_config(3), 7);

        for _ in 0..10 {
            gen.tick(t0);
        }
        assert_eq!(gen.len(), 3);
        assert_eq!(gen.spawned_total(), 3);
        assert_eq!(gen.pending_removals(), 3);
    }

    #[test]
    fn test_parameters_within_ranges() {
        let t0 = Instant::now();
        let config = ParticleConfig::default();
        let mut gen = ParticleGenerator::seeded(config.clone(), 42);

        for _ in 0..config.max_particles {
            gen.tick(t0);
        }
        for p in gen.particles() {
            assert!((0.0..100.0).contains(&p.x_percent));
            assert!(config.size.contains(p.size));
            assert!(config.duration_secs.contains(p.duration.as_secs_f32()));
            assert!(p.delay.as_secs_f32() < config.delay_secs.max);
            assert_eq!(p.remove_at, p.animation_end() + ms(1000));
        }
    }

    #[test]
    fn test_ids_are_monotonic_and_unique() {
        let t0 = Instant::now();
        let mut gen = ParticleGenerator::seeded(small_config(5), 1);
        let mut seen = HashSet::new();
        let mut last = None;

        for round in 0..20u64 {
            let now = t0 + ms(round * 10_000);
            gen.poll(now);
            if let Some(id) = gen.tick(now) {
                assert!(seen.insert(id));
                if let Some(prev) = last {
                    assert!(id > prev);
                }
                last = Some(id);
            }
        }
    }

    #[test]
    fn test_remove_is_idempotent_and_cancels_timer() {
        let t0 = Instant::now();
        let mut gen = ParticleGenerator::seeded(small_config(5), 3);
        let id = gen.tick(t0).unwrap();

        assert!(gen.remove(id));
        assert!(!gen.remove(id));
        assert_eq!(gen.pending_removals(), 0);

        let update = gen.poll(t0 + ms(60_000));
        assert!(update.removed.is_empty());
        assert_eq!(gen.removed_total(), 1);
    }

    #[test]
    fn test_removal_fires_after_animation_and_buffer() {
        let t0 = Instant::now();
        let mut gen = ParticleGenerator::seeded(small_config(5), 11);
        let id = gen.tick(t0).unwrap();
        let particle = gen.get(id).unwrap().clone();

        let just_before = particle.remove_at - ms(1);
        assert!(gen.poll(just_before).removed.is_empty());
        assert!(particle.animation_end() < particle.remove_at);

        assert_eq!(gen.poll(particle.remove_at).removed, vec![id]);
        assert!(gen.is_empty());
    }

    #[test]
    fn test_poll_spawns_on_interval_and_never_exceeds_cap() {
        let t0 = Instant::now();
        let mut gen = ParticleGenerator::seeded(small_config(4), 5);
        gen.start(t0);

        assert!(gen.poll(t0 + ms(50)).spawned.is_none());
        assert!(gen.poll(t0 + ms(100)).spawned.is_some());

        let mut now = t0 + ms(100);
        for _ in 0..200 {
            now += ms(25);
            gen.poll(now);
            assert!(gen.len() <= 4);
            assert_eq!(gen.spawned_total() - gen.removed_total(), gen.len() as u64);
        }
    }

    #[test]
    fn test_every_particle_removed_exactly_once() {
        let t0 = Instant::now();
        let mut gen = ParticleGenerator::seeded(small_config(10), 9);
        gen.start(t0);

        let mut removed = Vec::new();
        let mut now = t0;
        for _ in 0..300 {
            now += ms(50);
            removed.extend(gen.poll(now).removed);
        }
        gen.shutdown();
        // Drain what is left the way teardown does
        let leftovers: Vec<_> = gen.particles().iter().map(|p| p.id).collect();
        for id in leftovers {
            assert!(gen.remove(id));
            removed.push(id);
        }

        let unique: HashSet<_> = removed.iter().copied().collect();
        assert_eq!(unique.len(), removed.len());
        assert_eq!(removed.len() as u64, gen.spawned_total());
        assert!(gen.is_empty());
    }

    #[test]
    fn test_missed_ticks_are_skipped() {
        let t0 = Instant::now();
        let mut gen = ParticleGenerator::seeded(small_config(50), 2);
        gen.start(t0);

        let update = gen.poll(t0 + ms(1000));
        assert!(update.spawned.is_some());
        assert_eq!(gen.len(), 1);
        assert_eq!(gen.next_deadline(), Some(t0 + ms(1100)));
    }

    #[test]
    fn test_zero_cap_never_spawns() {
        let t0 = Instant::now();
        let mut gen = ParticleGenerator::seeded(small_config(0), 2);
        assert!(gen.tick(t0).is_none());
        assert!(gen.is_empty());
    }

    #[test]
    fn test_shutdown_stops_everything() {
        let t0 = Instant::now();
        let mut gen = ParticleGenerator::seeded(small_config(5), 4);
        gen.start(t0);
        gen.tick(t0);

        gen.shutdown();
        assert!(!gen.is_running());
        assert_eq!(gen.next_deadline(), None);
        assert!(gen.poll(t0 + ms(100_000)).is_empty());
    }

    #[test]
    fn test_progress() {
        let t0 = Instant::now();
        let particle = Particle {
            id: ParticleId(0),
            x_percent: 50.0,
            size: 1.0,
            duration: ms(1000),
            delay: ms(500),
            spawned_at: t0,
            remove_at: t0 + ms(2500),
        };
        assert_eq!(particle.progress(t0 + ms(100)), None);
        assert_eq!(particle.progress(t0 + ms(500)), Some(0.0));
        assert_eq!(particle.progress(t0 + ms(1000)), Some(0.5));
        assert_eq!(particle.progress(t0 + ms(5000)), Some(1.0));
    }

    #[test]
    fn test_degenerate_range_yields_min() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(ValueRange::new(4.0, 4.0).sample(&mut rng), 4.0);
        assert!(!ValueRange::new(5.0, 1.0).is_valid());
        assert!(!ValueRange::new(f32::NAN, 1.0).is_valid());
        assert!(!ValueRange::new(-3e38, 3e38).is_valid());
    }

    #[test]
    fn test_unsampleable_ranges_do_not_panic() {
        let t0 = Instant::now();
        let config = ParticleConfig {
            size: ValueRange::new(-3e38, 3e38),
            duration_secs: ValueRange::new(1e30, 1e30),
            delay_secs: ValueRange::new(f32::MAX, f32::MAX),
            ..ParticleConfig::default()
        };
        let mut generator = ParticleGenerator::seeded(config, 3);

        let id = generator.tick(t0).unwrap();
        let particle = generator.get(id).unwrap();
        assert_eq!(particle.size, -3e38);
        assert_eq!(particle.duration, Duration::from_secs_f32(MAX_PARTICLE_SECS));
        assert_eq!(particle.delay, Duration::from_secs_f32(MAX_PARTICLE_SECS));
    }
}

use std::collections::BTreeMap;

use odla_types::{Tick, TimeSig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SigEvent {
    sig: TimeSig,
    /// Zero-based measure number where the signature starts.
    bar: usize,
}

/// Time signature changes keyed by tick, for tick to (bar, beat) conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSigMap {
    events: BTreeMap<Tick, SigEvent>,
}

impl Default for TimeSigMap {
    fn default() -> Self {
        let mut events = BTreeMap::new();
        events.insert(
            0,
            SigEvent {
                sig: TimeSig::COMMON,
                bar: 0,
            },
        );
        Self { events }
    }
}

impl TimeSigMap {
    /// Build from the effective signature of each measure in order.
    pub fn from_measures(sigs: impl IntoIterator<Item = TimeSig>) -> Self {
        let mut events = BTreeMap::new();
        let mut tick = 0;
        let mut current: Option<TimeSig> = None;
        for (bar, sig) in sigs.into_iter().enumerate() {
            if current != Some(sig) {
                events.insert(tick, SigEvent { sig, bar });
                current = Some(sig);
            }
            tick += sig.measure_ticks();
        }
        if events.is_empty() {
            return Self::default();
        }
        Self { events }
    }

    /// Signature in effect at `tick`.
    pub fn timesig(&self, tick: Tick) -> TimeSig {
        self.event_at(tick).1.sig
    }

    /// Zero-based (bar, beat, ticks into the beat).
    pub fn tick_values(&self, tick: Tick) -> (usize, usize, Tick) {
        let (start, event) = self.event_at(tick);
        let delta = (tick - start).max(0);
        let measure = event.sig.measure_ticks();
        let beat = event.sig.beat_ticks();
        let bars = delta / measure;
        let rest = delta % measure;
        (
            event.bar + bars as usize,
            (rest / beat) as usize,
            rest % beat,
        )
    }

    fn event_at(&self, tick: Tick) -> (Tick, SigEvent) {
        self.events
            .range(..=tick)
            .next_back()
            .or_else(|| self.events.iter().next())
            .map(|(t, e)| (*t, *e))
            .unwrap_or((
                0,
                SigEvent {
                    sig: TimeSig::COMMON,
                    bar: 0,
                },
            ))
    }
}

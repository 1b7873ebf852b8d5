//! Musical semantics for LJPW coordinates.
//!
//! Maps a state onto the nearest documented intervals, chords and modes and derives
//! short narrative insights from the match.

use std::fmt;

use ljpw_core::{Dimension, Phase, StateVector};
use ordered_float::OrderedFloat;
use serde::Serialize;

pub mod registry;

pub use registry::{CHORDS, INTERVALS, MODES, lookup};

/// Per-dimension value above which a profile calls the axis high.
pub const HIGH_THRESHOLD: f64 = 0.85;
/// Per-dimension value below which a profile calls the axis low.
pub const LOW_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Interval,
    Chord,
    Mode,
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interval => "interval",
            Self::Chord => "chord",
            Self::Mode => "mode",
        })
    }
}

/// A documented musical structure and its LJPW coordinates.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Structure {
    pub kind: StructureKind,
    /// Short key, e.g. `M3`, `Dom7`, `Dorian`.
    pub key: &'static str,
    pub name: &'static str,
    /// Chord construction or mode scale; empty for intervals.
    pub notes: &'static str,
    pub semitones: Option<u8>,
    pub coordinates: StateVector,
    /// Harmony as published alongside the coordinates (three decimals).
    pub reference_harmony: f64,
}

impl Structure {
    #[must_use]
    pub fn harmony(&self) -> f64 {
        self.coordinates.harmony()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.coordinates.phase()
    }

    #[must_use]
    pub fn dominant(&self) -> Dimension {
        self.coordinates.dominant_dimension().0
    }
}

/// A registry entry paired with its distance from the query state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Match {
    pub structure: &'static Structure,
    pub distance: f64,
}

/// Narrative observations attached to a profile.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "dimension", rename_all = "snake_case")]
pub enum Insight {
    High(Dimension),
    Low(Dimension),
    LoveInterval,
    DevilsInterval,
    PowerFoundation,
    LoveChord,
    PowerChord,
    DiminishedChord,
    LoveMode,
    EntropicMode,
}

impl Insight {
    #[must_use]
    pub fn message(&self) -> &'static str {
        use Dimension::{Justice, Love, Power, Wisdom};
        match self {
            Self::High(Love) => "High Love: melody is likely strong, attractive and memorable.",
            Self::Low(Love) => "Low Love: melody may be weak or fragmented.",
            Self::High(Justice) => "High Justice: harmony is balanced and resolved.",
            Self::Low(Justice) => "Low Justice: dissonance is likely and tension stays unresolved.",
            Self::High(Power) => "High Power: strong rhythmic drive and high energy.",
            Self::Low(Power) => "Low Power: rhythm is weak and lacks momentum.",
            Self::High(Wisdom) => "High Wisdom: complex timbral structure, rich information.",
            Self::Low(Wisdom) => "Low Wisdom: timbre is simple or predictable.",
            Self::LoveInterval => "Major 3rd presence: the love interval dominates.",
            Self::DevilsInterval => "Tritone presence: high tension that needs resolution.",
            Self::PowerFoundation => "Perfect 5th presence: a stable, driving foundation.",
            Self::LoveChord => "Major triad: the love chord, a classic happy resolution.",
            Self::PowerChord => "Power chord: pure energy with little harmonic nuance.",
            Self::DiminishedChord => "Diminished chord: unstable and entropic.",
            Self::LoveMode => "Ionian mode: bright and major.",
            Self::EntropicMode => "Locrian mode: unstable and dark.",
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Full musical reading of a single state.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MusicalProfile {
    pub state: StateVector,
    pub harmony: f64,
    pub phase: Phase,
    pub dominant: Dimension,
    pub dominant_value: f64,
    pub interval: Match,
    pub chord: Match,
    pub mode: Match,
    pub insights: Vec<Insight>,
}

/// Nearest-neighbour search over the structure registries.
#[derive(Debug, Default, Clone, Copy)]
pub struct MusicalSemanticsAnalyzer;

impl MusicalSemanticsAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Up to `top_n` structures of `kind` ordered by Euclidean distance.
    ///
    /// Equal distances keep registry order.
    #[must_use]
    pub fn nearest(&self, kind: StructureKind, state: &StateVector, top_n: usize) -> Vec<Match> {
        let mut matches: Vec<Match> = registry::registry(kind)
            .iter()
            .map(|structure| Match {
                structure,
                distance: state.distance(&structure.coordinates),
            })
            .collect();
        matches.sort_by_key(|m| OrderedFloat(m.distance));
        matches.truncate(top_n);
        matches
    }

    #[must_use]
    pub fn nearest_intervals(&self, state: &StateVector, top_n: usize) -> Vec<Match> {
        self.nearest(StructureKind::Interval, state, top_n)
    }

    #[must_use]
    pub fn nearest_chords(&self, state: &StateVector, top_n: usize) -> Vec<Match> {
        self.nearest(StructureKind::Chord, state, top_n)
    }

    #[must_use]
    pub fn nearest_modes(&self, state: &StateVector, top_n: usize) -> Vec<Match> {
        self.nearest(StructureKind::Mode, state, top_n)
    }

    fn best(&self, kind: StructureKind, state: &StateVector) -> Match {
        let structures = registry::registry(kind);
        let mut best = Match {
            structure: &structures[0],
            distance: state.distance(&structures[0].coordinates),
        };
        for structure in &structures[1..] {
            let distance = state.distance(&structure.coordinates);
            if OrderedFloat(distance) < OrderedFloat(best.distance) {
                best = Match {
                    structure,
                    distance,
                };
            }
        }
        best
    }

    /// Harmony, phase, dominance, closest structures and insights for `state`.
    #[must_use]
    pub fn profile(&self, state: &StateVector) -> MusicalProfile {
        let interval = self.best(StructureKind::Interval, state);
        let chord = self.best(StructureKind::Chord, state);
        let mode = self.best(StructureKind::Mode, state);
        let (dominant, dominant_value) = state.dominant_dimension();
        MusicalProfile {
            state: *state,
            harmony: state.harmony(),
            phase: state.phase(),
            dominant,
            dominant_value,
            insights: insights(state, &interval, &chord, &mode),
            interval,
            chord,
            mode,
        }
    }
}

fn insights(state: &StateVector, interval: &Match, chord: &Match, mode: &Match) -> Vec<Insight> {
    let mut out = Vec::new();
    for dimension in Dimension::ALL {
        let value = state.get(dimension);
        if value > HIGH_THRESHOLD {
            out.push(Insight::High(dimension));
        } else if value < LOW_THRESHOLD {
            out.push(Insight::Low(dimension));
        }
    }
    match interval.structure.key {
        "M3" => out.push(Insight::LoveInterval),
        "TT" => out.push(Insight::DevilsInterval),
        "P5" => out.push(Insight::PowerFoundation),
        _ => {}
    }
    match chord.structure.key {
        "Maj" => out.push(Insight::LoveChord),
        "Power" => out.push(Insight::PowerChord),
        "Dim" => out.push(Insight::DiminishedChord),
        _ => {}
    }
    match mode.structure.key {
        "Ionian" => out.push(Insight::LoveMode),
        "Locrian" => out.push(Insight::EntropicMode),
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registries_have_expected_sizes() {
        assert_eq!(INTERVALS.len(), 13);
        assert_eq!(CHORDS.len(), 9);
        assert_eq!(MODES.len(), 7);
        assert_eq!(
            INTERVALS.iter().map(|s| s.semitones).collect::<Vec<_>>(),
            (0..=12).map(Some).collect::<Vec<_>>()
        );
    }

    #[test]
    fn reference_harmony_matches_formula() {
        for structure in INTERVALS.iter().chain(&CHORDS).chain(&MODES) {
            assert!(
                (structure.harmony() - structure.reference_harmony).abs() < 1e-3,
                "{} {}",
                structure.kind,
                structure.key
            );
        }
    }

    #[test]
    fn exact_coordinates_match_at_zero_distance() {
        let analyzer = MusicalSemanticsAnalyzer::new();
        for structure in &INTERVALS {
            let best = analyzer.nearest_intervals(&structure.coordinates, 1);
            assert_eq!(best[0].structure.key, structure.key);
            assert_eq!(best[0].distance, 0.0);
        }
    }

    #[test]
    fn nearest_is_sorted_and_truncated() {
        let analyzer = MusicalSemanticsAnalyzer::new();
        let state = StateVector::new(0.5, 0.5, 0.5, 0.5);
        let modes = analyzer.nearest_modes(&state, 3);
        assert_eq!(modes.len(), 3);
        assert!(modes.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(analyzer.nearest_chords(&state, 100).len(), 9);
        assert!(analyzer.nearest_chords(&state, 0).is_empty());
    }

    #[test]
    fn profile_best_agrees_with_nearest() {
        let analyzer = MusicalSemanticsAnalyzer::new();
        let state = StateVector::new(0.40, 0.30, 0.95, 0.70);
        let profile = analyzer.profile(&state);
        assert_eq!(
            profile.chord.structure.key,
            analyzer.nearest_chords(&state, 1)[0].structure.key
        );
        assert_eq!(profile.dominant, Dimension::Power);
        assert!(profile.insights.contains(&Insight::High(Dimension::Power)));
        assert!(profile.insights.contains(&Insight::Low(Dimension::Justice)));
    }

    #[test]
    fn love_structures_produce_love_insights() {
        let analyzer = MusicalSemanticsAnalyzer::new();
        let major_third = lookup(StructureKind::Interval, "M3").expect("M3");
        let profile = analyzer.profile(&major_third.coordinates);
        assert_eq!(profile.interval.structure.key, "M3");
        assert!(profile.insights.contains(&Insight::LoveInterval));
        assert!(profile.insights.contains(&Insight::High(Dimension::Love)));

        let locrian = lookup(StructureKind::Mode, "Locrian").expect("Locrian");
        let profile = analyzer.profile(&locrian.coordinates);
        assert!(profile.insights.contains(&Insight::EntropicMode));
        assert_eq!(profile.phase, Phase::Entropic);
    }

    #[test]
    fn insight_serializes_with_tag() {
        let json = serde_json::to_string(&Insight::High(Dimension::Wisdom)).expect("json");
        assert_eq!(json, r#"{"kind":"high","dimension":"Wisdom"}"#);
        let json = serde_json::to_string(&Insight::LoveChord).expect("json");
        assert_eq!(json, r#"{"kind":"love_chord"}"#);
    }
}

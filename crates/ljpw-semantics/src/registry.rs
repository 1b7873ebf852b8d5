//! Documented LJPW coordinates for intervals, chords and modes.

use ljpw_core::StateVector;

use crate::{Structure, StructureKind};

const fn interval(
    key: &'static str,
    name: &'static str,
    semitones: u8,
    coords: [f64; 4],
    reference_harmony: f64,
) -> Structure {
    Structure {
        kind: StructureKind::Interval,
        key,
        name,
        notes: "",
        semitones: Some(semitones),
        coordinates: StateVector::from_array(coords),
        reference_harmony,
    }
}

const fn chord(
    key: &'static str,
    name: &'static str,
    construction: &'static str,
    coords: [f64; 4],
    reference_harmony: f64,
) -> Structure {
    Structure {
        kind: StructureKind::Chord,
        key,
        name,
        notes: construction,
        semitones: None,
        coordinates: StateVector::from_array(coords),
        reference_harmony,
    }
}

const fn mode(
    key: &'static str,
    name: &'static str,
    scale: &'static str,
    coords: [f64; 4],
    reference_harmony: f64,
) -> Structure {
    Structure {
        kind: StructureKind::Mode,
        key,
        name,
        notes: scale,
        semitones: None,
        coordinates: StateVector::from_array(coords),
        reference_harmony,
    }
}

/// The thirteen intervals from unison to octave.
pub static INTERVALS: [Structure; 13] = [
    interval("P1", "Unison", 0, [0.85, 0.95, 0.60, 0.50], 0.603),
    interval("m2", "Minor 2nd", 1, [0.30, 0.20, 0.75, 0.65], 0.466),
    interval("M2", "Major 2nd", 2, [0.45, 0.55, 0.70, 0.60], 0.535),
    interval("m3", "Minor 3rd", 3, [0.75, 0.70, 0.55, 0.65], 0.591),
    interval("M3", "Major 3rd", 4, [0.95, 0.75, 0.65, 0.70], 0.655),
    interval("P4", "Perfect 4th", 5, [0.70, 0.85, 0.70, 0.75], 0.660),
    interval("TT", "Tritone", 6, [0.15, 0.15, 0.85, 0.90], 0.451),
    interval("P5", "Perfect 5th", 7, [0.80, 0.90, 0.95, 0.80], 0.767),
    interval("m6", "Minor 6th", 8, [0.70, 0.65, 0.60, 0.75], 0.603),
    interval("M6", "Major 6th", 9, [0.85, 0.80, 0.55, 0.70], 0.627),
    interval("m7", "Minor 7th", 10, [0.50, 0.50, 0.80, 0.85], 0.571),
    interval("M7", "Major 7th", 11, [0.40, 0.45, 0.75, 0.90], 0.538),
    interval("P8", "Octave", 12, [0.90, 0.98, 0.75, 0.85], 0.764),
];

pub static CHORDS: [Structure; 9] = [
    chord("Maj", "Major Triad", "Root+M3+P5", [0.90, 0.85, 0.80, 0.75], 0.731),
    chord("Min", "Minor Triad", "Root+m3+P5", [0.75, 0.80, 0.75, 0.80], 0.688),
    chord("Dim", "Diminished", "Root+m3+TT", [0.25, 0.30, 0.85, 0.90], 0.490),
    chord("Aug", "Augmented", "Root+M3+m6", [0.60, 0.40, 0.80, 0.85], 0.567),
    chord("Maj7", "Major 7th", "Maj+M7", [0.85, 0.75, 0.70, 0.90], 0.699),
    chord("Min7", "Minor 7th", "min+m7", [0.70, 0.70, 0.75, 0.85], 0.660),
    chord("Dom7", "Dominant 7th", "Maj+m7", [0.75, 0.60, 0.90, 0.80], 0.657),
    chord("Sus4", "Sus4", "Root+P4+P5", [0.65, 0.90, 0.75, 0.70], 0.652),
    chord("Power", "Power Chord", "Root+P5", [0.55, 0.80, 0.98, 0.50], 0.588),
];

pub static MODES: [Structure; 7] = [
    mode("Ionian", "Ionian (Major)", "C-D-E-F-G-A-B", [0.90, 0.85, 0.75, 0.70], 0.699),
    mode("Dorian", "Dorian", "D-E-F-G-A-B-C", [0.75, 0.80, 0.70, 0.85], 0.683),
    mode("Phrygian", "Phrygian", "E-F-G-A-B-C-D", [0.40, 0.55, 0.85, 0.90], 0.565),
    mode("Lydian", "Lydian", "F-G-A-B-C-D-E", [0.85, 0.70, 0.60, 0.95], 0.656),
    mode("Mixolydian", "Mixolydian", "G-A-B-C-D-E-F", [0.70, 0.65, 0.90, 0.75], 0.652),
    mode("Aeolian", "Aeolian (Minor)", "A-B-C-D-E-F-G", [0.65, 0.75, 0.65, 0.80], 0.629),
    mode("Locrian", "Locrian", "B-C-D-E-F-G-A", [0.20, 0.25, 0.80, 0.85], 0.471),
];

/// Registry for one structure family.
#[must_use]
pub fn registry(kind: StructureKind) -> &'static [Structure] {
    match kind {
        StructureKind::Interval => &INTERVALS,
        StructureKind::Chord => &CHORDS,
        StructureKind::Mode => &MODES,
    }
}

/// Look a structure up by its short key, e.g. `"M3"` or `"Locrian"`.
#[must_use]
pub fn lookup(kind: StructureKind, key: &str) -> Option<&'static Structure> {
    registry(kind).iter().find(|s| s.key == key)
}

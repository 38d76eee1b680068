use odla_types::{ClefType, ElementType, KeySignature, TempoPreset, TimeSig};

use super::HeadlessHost;
use crate::host::{ElementPayload, PaletteElement, PaletteTree};

/// One palette: a type code and its cells, each addressable by key.
#[derive(Debug, Clone)]
pub struct Palette {
    pub palette_type: i32,
    pub name: String,
    pub cells: Vec<(String, PaletteElement)>,
}

/// The palette tree. Owns the canonical prototypes and hands out clones.
#[derive(Debug, Clone)]
pub struct PaletteCatalog {
    palettes: Vec<Palette>,
}

impl PaletteCatalog {
    pub fn new(palettes: Vec<Palette>) -> Self {
        Self { palettes }
    }

    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    pub fn cell(&self, palette_type: i32, cell: i32) -> Option<PaletteElement> {
        let palette = self.palettes.iter().find(|p| p.palette_type == palette_type)?;
        let cell = usize::try_from(cell).ok()?;
        palette.cells.get(cell).map(|(_, e)| e.clone())
    }

    pub fn named(&self, key: &str) -> Option<PaletteElement> {
        self.palettes
            .iter()
            .flat_map(|p| p.cells.iter())
            .find(|(k, _)| k == key)
            .map(|(_, e)| e.clone())
    }
}

fn cells<const N: usize>(prefix: &str, kind: ElementType, names: [&str; N]) -> Vec<(String, PaletteElement)> {
    names
        .iter()
        .map(|n| (format!("{}:{}", prefix, n), PaletteElement::new(kind, *n)))
        .collect()
}

impl Default for PaletteCatalog {
    /// The stock palettes, keyed the way the device names them.
    fn default() -> Self {
        let clefs = ["treble", "bass", "alto", "tenor", "treble8vb", "percussion", "tab"]
            .iter()
            .filter_map(|n| {
                let clef = ClefType::from_name(n)?;
                let element =
                    PaletteElement::new(ElementType::Clef, *n).with_payload(ElementPayload::Clef(clef));
                Some((format!("clef:{}", n), element))
            })
            .collect();

        let keys = (-7i8..=7)
            .filter_map(|k| {
                let key = KeySignature::new(k)?;
                let name = match k {
                    0 => "c".to_string(),
                    k if k > 0 => format!("{}sharps", k),
                    k => format!("{}flats", -k),
                };
                let element =
                    PaletteElement::new(ElementType::KeySig, name.as_str()).with_payload(ElementPayload::KeySig(key));
                Some((format!("keysig:{}", name), element))
            })
            .collect();

        let times = [(2, 4), (3, 4), (4, 4), (5, 4), (6, 8), (9, 8), (12, 8), (2, 2)]
            .iter()
            .filter_map(|(n, d)| {
                let sig = TimeSig::new(*n, *d)?;
                Some((format!("timesig:{}_{}", n, d), PaletteElement::time_sig(sig)))
            })
            .collect();

        let tempos = TempoPreset::ALL
            .iter()
            .enumerate()
            .flat_map(|(i, preset)| {
                let text = PaletteElement::tempo(preset.markup(120), 120);
                [
                    (format!("tempo:text_{}", i), text.clone()),
                    (format!("tempo:mod_{}", i), text),
                ]
            })
            .collect();

        let mut repeats = cells("marker", ElementType::Marker, ["segno", "coda", "fine", "tocoda"]);
        repeats.extend(cells("jump", ElementType::Jump, ["dc", "ds", "dcalfine", "dsalcoda"]));
        repeats.extend(cells("volta", ElementType::Volta, ["1", "2"]));

        let mut lines = cells("line", ElementType::TextLine, ["text"]);
        lines.extend(cells("trill", ElementType::Trill, ["trill"]));
        lines.extend(cells("ottava", ElementType::Ottava, ["8va", "8vb", "15ma"]));
        lines.extend(cells("pedal", ElementType::Pedal, ["ped", "star"]));
        lines.extend(cells("hairpin", ElementType::Hairpin, ["crescendo", "decrescendo"]));

        let mut articulations = cells(
            "articulation",
            ElementType::Articulation,
            ["staccato", "accent", "tenuto", "marcato"],
        );
        articulations.extend(cells("articulation", ElementType::Fermata, ["fermata"]));
        articulations.extend(cells("ornament", ElementType::Trill, ["trill", "mordent", "turn"]));

        Self::new(vec![
            Palette {
                palette_type: 0,
                name: "Clefs".into(),
                cells: clefs,
            },
            Palette {
                palette_type: 1,
                name: "Key Signatures".into(),
                cells: keys,
            },
            Palette {
                palette_type: 2,
                name: "Time Signatures".into(),
                cells: times,
            },
            Palette {
                palette_type: 3,
                name: "Barlines".into(),
                cells: cells("bars", ElementType::BarLine, ["double", "end", "startrepeat", "endrepeat", "dashed"]),
            },
            Palette {
                palette_type: 4,
                name: "Repeats & Jumps".into(),
                cells: repeats,
            },
            Palette {
                palette_type: 5,
                name: "Tempo".into(),
                cells: tempos,
            },
            Palette {
                palette_type: 6,
                name: "Articulations".into(),
                cells: articulations,
            },
            Palette {
                palette_type: 7,
                name: "Lines".into(),
                cells: lines,
            },
            Palette {
                palette_type: 8,
                name: "Dynamics".into(),
                cells: cells("dynamic", ElementType::Dynamic, ["pp", "p", "mp", "mf", "f", "ff"]),
            },
            Palette {
                palette_type: 9,
                name: "Breaths & Arpeggios".into(),
                cells: {
                    let mut c = cells("breath", ElementType::Breath, ["comma", "caesura"]);
                    c.extend(cells("arpeggio", ElementType::Arpeggio, ["arpeggio"]));
                    c.extend(cells("glissando", ElementType::Glissando, ["straight", "wavy"]));
                    c.extend(cells("fingering", ElementType::Fingering, ["1", "2", "3", "4", "5"]));
                    c
                },
            },
        ])
    }
}

impl PaletteTree for HeadlessHost {
    fn palette_cell(&self, palette_type: i32, cell: i32) -> Option<PaletteElement> {
        self.palettes.cell(palette_type, cell)
    }

    fn palette_named(&self, key: &str) -> Option<PaletteElement> {
        self.palettes.named(key)
    }
}

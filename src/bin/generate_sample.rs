//! Writes `sample_events.xlsx` and a matching `dict/` tree for trying the
//! filter without a real event database.
//!
//! Usage: `generate_sample [OUTPUT_DIR]`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;

const HEADER: [&str; 8] = [
    "ELocTime",
    "ETypeId",
    "EX",
    "EY",
    "EZ",
    "EEnergy",
    "EComment",
    "ESourceFileName",
];

const EVENT_COUNT: u32 = 500;

/// Source files per site; the last four characters carry the site suffix.
const SOURCE_FILES: [&str; 4] = ["K0412.KIR", "K0413.KIR", "R1107.RAS", "R1108.RAS"];

/// Comments that the generated blacklists reject.
const NOISY_COMMENTS: [&str; 3] = ["blast", "noise: drilling", "test shot 7"];

const KIR_BLACKLIST: &str = "blast\nnoise*\n";
const RAS_BLACKLIST: &str = "test shot ?\n[Bb]last\n";

/// Column-name dictionaries: file name and accepted header spellings.
const COLUMN_DICTIONARIES: [(&str, &str); 8] = [
    ("time.txt", "ELocTime\nLocTime\n"),
    ("type_id.txt", "ETypeId\nTypeId\n"),
    ("x.txt", "EX\nX\n"),
    ("y.txt", "EY\nY\n"),
    ("z.txt", "EZ\nZ\n"),
    ("value.txt", "EEnergy\nEnergy\n"),
    ("comment.txt", "EComment\nComment\n"),
    ("source_filename.txt", "ESourceFileName\nESourseFileName\n"),
];

/// Minimal deterministic PRNG (splitmix64)
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        SimpleRng { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

fn write_workbook(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Events")?;

    for (col, name) in (0u16..).zip(HEADER) {
        sheet.write_string(0, col, name)?;
    }

    for row in 1..=EVENT_COUNT {
        let second = row * 97;
        let timestamp = format!(
            "2023-03-{:02} {:02}:{:02}:{:02}",
            1 + (second / 86_400) % 28,
            (second / 3600) % 24,
            (second / 60) % 60,
            second % 60
        );
        sheet.write_string(row, 0, &timestamp)?;

        // Codes 0..14 plus an occasional unknown one.
        let code = rng.next_u64() % 16;
        sheet.write_string(row, 1, &code.to_string())?;

        // Leave a coordinate blank now and then.
        let blank_col = if rng.chance(0.05) {
            Some(2 + (rng.next_u64() % 3) as u16)
        } else {
            None
        };
        let coords = [
            rng.range(0.0, 5000.0),
            rng.range(0.0, 5000.0),
            rng.range(-600.0, 400.0),
        ];
        for (col, value) in (2u16..).zip(coords) {
            if Some(col) != blank_col {
                sheet.write_number(row, col, (value * 10.0).round() / 10.0)?;
            }
        }

        let energy = 10f64.powf(rng.range(1.0, 6.0));
        sheet.write_number(row, 5, energy.round())?;

        let comment = if rng.chance(0.1) {
            rng.pick(&NOISY_COMMENTS)
        } else {
            ""
        };
        sheet.write_string(row, 6, comment)?;
        sheet.write_string(row, 7, rng.pick(&SOURCE_FILES))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn write_dictionaries(dict_dir: &Path) -> Result<()> {
    let cols = dict_dir.join("cols");
    let blacklist = dict_dir.join("blacklist");
    fs::create_dir_all(&cols).with_context(|| format!("creating {}", cols.display()))?;
    fs::create_dir_all(&blacklist)
        .with_context(|| format!("creating {}", blacklist.display()))?;

    for (file, names) in COLUMN_DICTIONARIES {
        fs::write(cols.join(file), names)?;
    }
    fs::write(blacklist.join("kir.txt"), KIR_BLACKLIST)?;
    fs::write(blacklist.join("ras.txt"), RAS_BLACKLIST)?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&out_dir)?;

    let mut rng = SimpleRng::new(42);
    let workbook = out_dir.join("sample_events.xlsx");
    write_workbook(&workbook, &mut rng)?;
    write_dictionaries(&out_dir.join("dict"))?;

    println!(
        "Wrote {EVENT_COUNT} events to {} and dictionaries to {}",
        workbook.display(),
        out_dir.join("dict").display()
    );
    Ok(())
}

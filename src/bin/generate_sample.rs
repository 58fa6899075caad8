use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
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
}

fn array(a: impl Array + 'static) -> ArrayRef {
    Arc::new(a)
}

/// City spellings as they show up in the raw export, untrimmed and mixed case.
const CITIES: [Option<&str>; 8] = [
    Some("Cairo"),
    Some(" cairo "),
    Some("Giza"),
    Some("Alexandria"),
    Some("ALEXANDRIA"),
    Some("Mansoura"),
    Some("Aswan"),
    None,
];

const FIRST_NAMES: [&str; 8] = ["Mona", "Sara", "Hala", "Nour", "Aya", "Omar", "Karim", "Yasmin"];
const LAST_NAMES: [&str; 6] = ["Hassan", "Adel", "Samir", "Fathy", "Mahmoud", "Khalil"];
const SPECIALTIES: [&str; 5] = ["Pediatrics", "ICU", "Geriatrics", "Oncology", "Home Care"];
const STREETS: [&str; 5] = ["Tahrir St", "Nile Corniche", "Salah Salem", "Ring Rd", "El Horreya"];
const COMMENTS: [&str; 4] = [
    "Very kind and professional",
    "Always on time",
    "Explains everything clearly",
    "Good, but hard to reach",
];

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);
    let per_city = 6;

    let mut ids = Vec::new();
    let mut first = Vec::new();
    let mut last = Vec::new();
    let mut phones = Vec::new();
    let mut emails = Vec::new();
    let mut experience = Vec::new();
    let mut specialty = Vec::new();
    let mut city = Vec::new();
    let mut street = Vec::new();
    let mut rating = Vec::new();
    let mut reviews = Vec::new();
    let mut comment = Vec::new();
    let mut score = Vec::new();

    let mut nurse_id: i64 = 1;
    for &c in &CITIES {
        for _ in 0..per_city {
            let fname = rng.pick(&FIRST_NAMES);
            let lname = rng.pick(&LAST_NAMES);
            let avg = (rng.range(2.5, 5.0) * 10.0).round() / 10.0;
            let count = (rng.range(0.0, 120.0)).floor();
            let years = rng.range(0.0, 25.0).floor() as i64;

            ids.push(nurse_id);
            first.push(fname);
            last.push(lname);
            phones.push(1_000_000_000 + (rng.next_u64() % 599_999_999) as i64);
            emails.push(format!(
                "{}.{}{nurse_id}@example.com",
                fname.to_lowercase(),
                lname.to_lowercase()
            ));
            experience.push(years);
            specialty.push(rng.pick(&SPECIALTIES));
            city.push(c);
            street.push(rng.pick(&STREETS));
            rating.push(avg);
            reviews.push(count);
            comment.push(rng.pick(&COMMENTS));
            // Demo score: rating weighted by review volume, nudged by experience.
            score.push(((avg * (1.0 + count).ln() + years as f64 * 0.1) * 100.0).round() / 100.0);
            nurse_id += 1;
        }
    }

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("NurseID", array(Int64Array::from(ids))),
        ("FName", array(StringArray::from(first))),
        ("LName", array(StringArray::from(last))),
        ("PhoneNumber", array(Int64Array::from(phones))),
        ("Email", array(StringArray::from(emails))),
        ("Experience", array(Int64Array::from(experience))),
        ("Specialty", array(StringArray::from(specialty))),
        ("City", array(StringArray::from(city))),
        ("Street", array(StringArray::from(street))),
        ("AverageRating", array(Float64Array::from(rating))),
        ("ReviewCount", array(Float64Array::from(reviews))),
        ("Comment", array(StringArray::from(comment))),
        ("Score", array(Float64Array::from(score))),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| {
                Field::new(*name, array.data_type().clone(), array.null_count() > 0)
            })
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let output_path = "nurse_data_frame.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 8)])?);
    println!("Wrote {} nurses to {output_path}", nurse_id - 1);
    Ok(())
}

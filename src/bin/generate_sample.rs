use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const CATEGORIES: [(&str, &[&str]); 3] = [
    ("Retail", &["Elastic Rail Clips", "Fish Plates", "Rail Parts"]),
    ("Wholesale", &["Fish Plates", "Rail Parts", "Sleepers"]),
    ("Services", &["Maintenance", "Inspection"]),
];

const CITIES: [(&str, &str, f64, f64); 8] = [
    ("Mumbai", "Maharashtra", 19.075983, 72.877655),
    ("Surat", "Gujarat", 21.170240, 72.831062),
    ("Chennai", "Tamil Nadu", 13.082680, 80.270718),
    ("Kolkata", "West Bengal", 22.572646, 88.363895),
    ("New Delhi", "Delhi", 28.613939, 77.209021),
    ("Pune", "Maharashtra", 18.520430, 73.856743),
    ("Jaipur", "Rajasthan", 26.912434, 75.787270),
    ("Lucknow", "Uttar Pradesh", 26.846708, 80.946159),
];

const OWNERS: [&str; 5] = ["Rajesh", "Deepak", "Suryan", "Meera", "Anil"];

struct Sale {
    name: String,
    category: &'static str,
    subcategory: &'static str,
    city: &'static str,
    state: &'static str,
    latitude: f64,
    longitude: f64,
    revenue: i64,
    units: i64,
    owner: &'static str,
}

fn generate(rng: &mut SimpleRng, count: usize) -> Vec<Sale> {
    (0..count)
        .map(|i| {
            let (category, subs) = *rng.pick(&CATEGORIES);
            let subcategory = *rng.pick(subs);
            let (city, state, latitude, longitude) = *rng.pick(&CITIES);
            let units = 1 + (rng.next_f64() * 50.0) as i64;
            // Revenue rounded to the nearest thousand.
            let revenue = ((rng.next_f64() * 290.0 + 10.0) as i64) * 1000;
            Sale {
                name: format!("{category} Store {:03}", i + 1),
                category,
                subcategory,
                city,
                state,
                latitude,
                longitude,
                revenue,
                units,
                owner: *rng.pick(&OWNERS),
            }
        })
        .collect()
}

const HEADERS: [&str; 10] = [
    "Name", "Category", "Subcategory", "City", "State", "Latitude", "Longitude", "Revenue", "Units", "Owner",
];

fn write_csv(path: &str, sales: &[Sale]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(HEADERS)?;
    for s in sales {
        writer.write_record([
            s.name.clone(),
            s.category.to_string(),
            s.subcategory.to_string(),
            s.city.to_string(),
            s.state.to_string(),
            s.latitude.to_string(),
            s.longitude.to_string(),
            s.revenue.to_string(),
            s.units.to_string(),
            s.owner.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, sales: &[Sale]) -> Result<()> {
    let text = |f: fn(&Sale) -> &str| StringArray::from(sales.iter().map(f).collect::<Vec<_>>());
    let float = |f: fn(&Sale) -> f64| Float64Array::from(sales.iter().map(f).collect::<Vec<_>>());
    let int = |f: fn(&Sale) -> i64| Int64Array::from(sales.iter().map(f).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("Name", DataType::Utf8, false),
        Field::new("Category", DataType::Utf8, false),
        Field::new("Subcategory", DataType::Utf8, false),
        Field::new("City", DataType::Utf8, false),
        Field::new("State", DataType::Utf8, false),
        Field::new("Latitude", DataType::Float64, false),
        Field::new("Longitude", DataType::Float64, false),
        Field::new("Revenue", DataType::Int64, false),
        Field::new("Units", DataType::Int64, false),
        Field::new("Owner", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text(|s| s.name.as_str())),
            Arc::new(text(|s| s.category)),
            Arc::new(text(|s| s.subcategory)),
            Arc::new(text(|s| s.city)),
            Arc::new(text(|s| s.state)),
            Arc::new(float(|s| s.latitude)),
            Arc::new(float(|s| s.longitude)),
            Arc::new(int(|s| s.revenue)),
            Arc::new(int(|s| s.units)),
            Arc::new(text(|s| s.owner)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let sales = generate(&mut rng, 120);

    write_csv("sample_sales.csv", &sales)?;
    write_parquet("sample_sales.parquet", &sales)?;

    println!(
        "Wrote {} sales rows to sample_sales.csv and sample_sales.parquet",
        sales.len()
    );
    Ok(())
}

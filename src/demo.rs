use crate::data::model::{Dataset, Value, row};

/// Five shops across three categories, with coordinates, used when no file
/// has been loaded.
pub fn demo_dataset() -> Dataset {
    let shops: [(&str, &str, &str, &str, &str, f64, f64, i64, &str); 5] = [
        ("Asha Mart", "Retail", "Elastic Rail Clips", "Mumbai", "Maharashtra", 19.075983, 72.877655, 120000, "Rajesh"),
        ("Kala Wholesalers", "Wholesale", "Fish Plates", "Surat", "Gujarat", 21.170240, 72.831062, 300000, "Deepak"),
        ("Suryan Services", "Services", "Maintenance", "Chennai", "Tamil Nadu", 13.082680, 80.270718, 90000, "Suryan"),
        ("Bengal Retail", "Retail", "Fish Plates", "Kolkata", "West Bengal", 22.572646, 88.363895, 150000, "Bengal Owner"),
        ("Greenfield Trade", "Wholesale", "Rail Parts", "New Delhi", "Delhi", 28.613939, 77.209021, 210000, "Green"),
    ];

    Dataset::from_rows(
        shops
            .into_iter()
            .map(|(name, category, sub, city, state, lat, lon, revenue, owner)| {
                row([
                    ("Name", Value::from(name)),
                    ("Category", Value::from(category)),
                    ("Subcategory", Value::from(sub)),
                    ("City", Value::from(city)),
                    ("State", Value::from(state)),
                    ("Latitude", Value::from(lat)),
                    ("Longitude", Value::from(lon)),
                    ("Revenue", Value::from(revenue)),
                    ("Owner", Value::from(owner)),
                ])
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_shape() {
        let ds = demo_dataset();
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.headers.len(), 9);
        assert_eq!(ds.headers[0], "Name");
    }
}

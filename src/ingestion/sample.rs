//! Seeded synthetic impressions for demos and tests

use crate::storage::Document;
use rand::prelude::*;
use serde_json::{json, Value};

pub const GENDERS: [&str; 3] = ["Female", "Male", "Non-Binary"];
pub const DEVICE_TYPES: [&str; 3] = ["Desktop", "Mobile", "Tablet"];
pub const AD_POSITIONS: [&str; 3] = ["Bottom", "Side", "Top"];
pub const BROWSING_HISTORIES: [&str; 5] =
    ["Education", "Entertainment", "News", "Shopping", "Social Media"];
pub const TIMES_OF_DAY: [&str; 4] = ["Afternoon", "Evening", "Morning", "Night"];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub n_records: usize,
    pub seed: u64,
    /// Share of `time_of_day` values replaced by `"na"`
    pub missing_time_of_day: f64,
    /// Share of `age` values replaced by `"na"`
    pub missing_age: f64,
    /// Probability of flipping the label
    pub label_noise: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            n_records: 1000,
            seed: 42,
            missing_time_of_day: 0.1,
            missing_age: 0.0,
            label_noise: 0.0,
        }
    }
}

/// Clicks come from young mobile users and older tablet users
fn clicks(device_type: &str, age: i64) -> bool {
    (device_type == "Mobile" && age < 35) || (device_type == "Tablet" && age >= 55)
}

/// Generate raw impression documents shaped like the production collection
pub fn generate_impressions(config: &SampleConfig) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(config.seed);

    (0..config.n_records)
        .map(|i| {
            let age: i64 = rng.gen_range(18..=64);
            let gender = *GENDERS.choose(&mut rng).unwrap_or(&GENDERS[0]);
            let device_type = *DEVICE_TYPES.choose(&mut rng).unwrap_or(&DEVICE_TYPES[0]);
            let ad_position = *AD_POSITIONS.choose(&mut rng).unwrap_or(&AD_POSITIONS[0]);
            let browsing = *BROWSING_HISTORIES
                .choose(&mut rng)
                .unwrap_or(&BROWSING_HISTORIES[0]);
            let time_of_day = *TIMES_OF_DAY.choose(&mut rng).unwrap_or(&TIMES_OF_DAY[0]);

            let mut click = clicks(device_type, age);
            if rng.gen::<f64>() < config.label_noise {
                click = !click;
            }

            let age_value: Value = if rng.gen::<f64>() < config.missing_age {
                json!("na")
            } else {
                json!(age)
            };
            let time_value: Value = if rng.gen::<f64>() < config.missing_time_of_day {
                json!("na")
            } else {
                json!(time_of_day)
            };

            let record = json!({
                "_id": format!("{:024x}", i),
                "id": i as i64 + 1,
                "full_name": format!("User{}", i + 1),
                "age": age_value,
                "gender": gender,
                "device_type": device_type,
                "ad_position": ad_position,
                "browsing_history": browsing,
                "time_of_day": time_value,
                "click": click as i64,
            });
            match record {
                Value::Object(map) => map,
                _ => Document::new(),
            }
        })
        .collect()
}

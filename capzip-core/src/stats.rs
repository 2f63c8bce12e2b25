use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    pub files: u64,
    pub logical_bytes: u64,
    pub container_bytes: u64,
    pub parts: u64,
    pub final_bytes: u64,
    pub compression_ratio: f32,
    pub elapsed_ms: u64,
}

impl Stats {
    pub fn ratio(logical: u64, physical: u64) -> f32 {
        if physical == 0 {
            0.0
        } else {
            logical as f32 / physical as f32
        }
    }
}

use serde::{Deserialize, Serialize};

/// Configuration for container forensics with tunable thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Creation this close to the analysis clock is flagged as freshly made
    pub recent_creation_hours: i64,

    /// Creation years before this look like a recycled template
    pub oldest_plausible_year: i32,

    /// Font outliers: share below this percentage of all characters...
    pub font_outlier_max_share_pct: f64,
    /// ...and strictly more characters than this
    pub font_outlier_min_chars: u32,

    /// Perceptual hashes of embedded JPEGs closer than this are the same picture
    pub duplicate_max_hamming: u32,

    /// Producer substrings (lowercase) that name an editing tool
    pub editing_tools: Vec<String>,

    /// Embedded rasters in this size band are counted as pasted patches
    pub patch_width: (u32, u32),
    pub patch_height: (u32, u32),
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            recent_creation_hours: 24,
            oldest_plausible_year: 2000,
            font_outlier_max_share_pct: 5.0,
            font_outlier_min_chars: 3,
            duplicate_max_hamming: 4,
            editing_tools: ["ilovepdf", "photoshop", "gimp", "phantompdf", "editor"]
                .into_iter()
                .map(String::from)
                .collect(),
            patch_width: (20, 400),
            patch_height: (10, 200),
        }
    }
}

impl StructureConfig {
    /// First editing tool named by the producer string.
    pub fn editing_tool(&self, producer: &str) -> Option<String> {
        let producer = producer.to_lowercase();
        self.editing_tools
            .iter()
            .find(|tool| producer.contains(tool.as_str()))
            .cloned()
    }

    /// Strict bounds on both axes.
    pub fn is_patch_sized(&self, width: u32, height: u32) -> bool {
        width > self.patch_width.0
            && width < self.patch_width.1
            && height > self.patch_height.0
            && height < self.patch_height.1
    }
}

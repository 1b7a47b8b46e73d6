//! Per-restaurant JSON output.
//!
//! ```text
//! output/
//! ├── andysadkgrille_com.json
//! ├── diamondclubrestaurantsaratoga_com.json
//! └── ...
//! ```
//!
//! Each file is a pretty-printed array of [`MenuItem`]s, overwritten
//! wholesale on every run.

use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

use crate::models::MenuItem;
use crate::utils::url_safe_name;

/// `{output_dir}/{url_safe_name(restaurant_url)}.json`
pub fn output_path(output_dir: &Path, restaurant_url: &str) -> PathBuf {
    output_dir.join(format!("{}.json", url_safe_name(restaurant_url)))
}

/// Write `items` for one restaurant, replacing any previous file. An empty
/// slice still writes `[]` so a failed source is visible in the output.
#[instrument(level = "info", skip(items), fields(count = items.len()))]
pub async fn write_items(
    items: &[MenuItem],
    output_dir: &Path,
    restaurant_url: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(items)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(path = %output_dir.display(), error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = output_path(output_dir, restaurant_url);
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote menu JSON");
    Ok(path)
}

//! Command-line interface definitions for menu_scrape.
//!
//! Global options pick the config file, the output directory and the
//! vision-model key; the subcommand picks what to do with them.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::normalize::{LabelStyle, NameCase, Separator, SourceProfile};
use crate::scrapers::Source;

/// Command-line arguments for menu_scrape.
///
/// # Examples
///
/// ```sh
/// # Scrape every restaurant into ./output
/// menu_scrape scrape
///
/// # Only the HTML sources, into another directory
/// menu_scrape --output-dir /tmp/menus scrape andysadkgrille diamondclub
///
/// # Merge everything into one CSV
/// menu_scrape combine --csv all_restaurant_menus.csv
///
/// # Try the normalizer on a single fragment
/// menu_scrape normalize --section SOUPS "French Onion Cup 5 Bowl 8"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to config.json (optional; defaults apply when missing)
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Directory for the per-restaurant JSON files
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Gemini API key, overrides the key in config.json
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape restaurants (all of them when none are named)
    Scrape {
        #[arg(value_enum)]
        sources: Vec<Source>,
    },
    /// List the supported restaurants
    List,
    /// Merge every output JSON file into one CSV
    Combine {
        #[arg(long, default_value = "all_restaurant_menus.csv")]
        csv: PathBuf,
    },
    /// Normalize one raw menu fragment and print name, description and price
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Section the fragment belongs to (drives positional labels)
    #[arg(long, default_value = "")]
    pub section: String,

    /// Upper-case the item name
    #[arg(long)]
    pub upper: bool,

    /// Title-case the item name
    #[arg(long, conflicts_with = "upper")]
    pub title: bool,

    /// Render labels after the amount: `$5 (Cup)`
    #[arg(long)]
    pub suffix_labels: bool,

    /// Join prices with ` / ` instead of ` | `
    #[arg(long)]
    pub slash: bool,

    /// Smallest bare number read as a price
    #[arg(long)]
    pub min_price: Option<f64>,

    /// The raw text
    pub text: String,
}

impl NormalizeArgs {
    pub fn profile(&self) -> SourceProfile {
        let mut profile = SourceProfile::default();
        if self.upper {
            profile = profile.with_name_case(NameCase::Upper);
        } else if self.title {
            profile = profile.with_name_case(NameCase::Title);
        }
        if self.suffix_labels {
            profile = profile.with_label_style(LabelStyle::Suffix);
        }
        if self.slash {
            profile = profile.with_separator(Separator::Slash);
        }
        if let Some(min) = self.min_price {
            profile = profile.with_min_plausible_price(min);
        }
        profile
    }
}

//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: one pretty-printed JSON array per restaurant
//! - [`csv`]: every JSON file merged into a single CSV
//!
//! # Output Structure
//!
//! ```text
//! output/
//! ├── andysadkgrille_com.json
//! ├── diamondclubrestaurantsaratoga_com.json
//! ├── harveyspub_com.json
//! └── westavepizza_com.json
//!
//! all_restaurant_menus.csv    # `combine`
//! ```

pub mod csv;
pub mod json;

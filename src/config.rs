/// Trust rank of the reference catalog (UHTT barcode reference)
pub const REFERENCE_RANK: u32 = 300;

/// Trust rank of the secondary retailer catalog
pub const CATALOG_RANK: u32 = 200;

/// Trust rank shared by every open community dataset
pub const OPEN_FACTS_RANK: u32 = 100;

pub const REFERENCE_SOURCE: &str = "uhtt";
pub const CATALOG_SOURCE: &str = "catalog";

pub const CATALOG_ARCHIVE: &str = "catalog-barcodes-csv.zip";
pub const CATALOG_MEMBER: &str = "barcodes.csv";

/// Open datasets in processing order: (file name, source id).
pub const OPEN_FACTS_DATASETS: [(&str, &str); 3] = [
    ("openbeautyfacts-products.csv.gz", "open_beauty_facts"),
    ("openpetfoodfacts-products.csv.gz", "open_pet_food_facts"),
    ("openproductsfacts-products.csv.gz", "open_products_facts"),
];

/// Only processed with `--include-off-food`
pub const OPEN_FOOD_FACTS_DATASET: (&str, &str) =
    ("openfoodfacts-products.csv.gz", "open_food_facts");

/// Minimum column count of a reference catalog row
pub const REFERENCE_MIN_COLUMNS: usize = 7;

/// Category written when the winning candidate has none
pub const FALLBACK_CATEGORY: &str = "Продукты";

/// Names longer than this stop earning length points
pub const SCORE_LENGTH_CAP: usize = 140;

/// Progress update interval (tick every N rows)
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Read buffer for decompressed dataset streams
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

//! Offline food catalog backed by an optional CSV file.
//!
//! Expected columns: `name, calories, fat, sugar, protein, sodium, labels`.
//! Extra columns are ignored, empty cells are treated as missing values, and
//! rows that do not deserialize are skipped. A missing file is an empty
//! catalog, not an error.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::traits::ProductSource;
use crate::error::AppResult;
use crate::models::{split_labels, CustomIngredient, NutritionRecord, RecordSource};

/// One row of the local catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFood {
    pub name: String,
    pub calories: Option<f64>,
    pub fat: Option<f64>,
    pub sugar: Option<f64>,
    pub protein: Option<f64>,
    pub sodium: Option<f64>,
    pub labels: Option<String>,
}

impl LocalFood {
    pub fn to_record(&self) -> NutritionRecord {
        NutritionRecord {
            name: self.name.clone(),
            category_labels: self.labels.as_deref().map(split_labels).unwrap_or_default(),
            energy_kcal_per_100g: self.calories,
            protein_g: self.protein,
            fat_g: self.fat,
            sugar_g: self.sugar,
            sodium_g: self.sodium,
            source: RecordSource::LocalCache,
            ..NutritionRecord::default()
        }
    }
}

/// Item counts and label breakdown across the catalog and a session's custom ingredients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseStats {
    pub total_items: usize,
    pub database_items: usize,
    pub custom_items: usize,
    pub categories: BTreeMap<String, usize>,
}

impl DatabaseStats {
    /// The `n` most common labels, ties broken alphabetically.
    pub fn top_categories(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self.categories.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocalFoodDatabase {
    foods: Vec<LocalFood>,
}

impl LocalFoodDatabase {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the catalog from `path`. A missing file yields an empty catalog.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            info!("No local food catalog at {:?}, continuing with an empty one", path);
            return Ok(Self::empty());
        }

        let file = std::fs::File::open(path)?;
        let db = Self::from_reader(file)?;
        info!("Loaded {} foods from {:?}", db.len(), path);
        Ok(db)
    }

    /// Like [`load`](Self::load), but any error also yields an empty catalog.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Failed to load local food catalog {:?}: {}", path, e);
            Self::empty()
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> AppResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut foods = Vec::new();
        for (line, row) in csv_reader.deserialize::<LocalFood>().enumerate() {
            match row {
                Ok(food) if !food.name.is_empty() => foods.push(food),
                Ok(_) => {}
                Err(e) => warn!("Skipping catalog row {}: {}", line + 2, e),
            }
        }

        Ok(Self { foods })
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// First food whose name contains `query`, case-insensitively.
    pub fn search(&self, query: &str) -> Option<&LocalFood> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.foods.iter().find(|f| f.name.to_lowercase().contains(&needle))
    }

    /// Counts items and labels over the catalog plus `custom`.
    pub fn stats(&self, custom: &[CustomIngredient]) -> DatabaseStats {
        let mut categories = BTreeMap::new();
        for food in &self.foods {
            for label in food.labels.as_deref().map(split_labels).unwrap_or_default() {
                *categories.entry(label).or_insert(0) += 1;
            }
        }

        DatabaseStats {
            total_items: self.foods.len() + custom.len(),
            database_items: self.foods.len(),
            custom_items: custom.len(),
            categories,
        }
    }
}

#[async_trait]
impl ProductSource for LocalFoodDatabase {
    async fn find_by_name(&self, query: &str) -> Option<NutritionRecord> {
        self.search(query).map(LocalFood::to_record)
    }

    /// The catalog has no barcodes.
    async fn find_by_barcode(&self, _code: &str) -> Option<NutritionRecord> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
name,calories,fat,sugar,protein,sodium,labels
Organic Peanut Butter,588,50,9,25,0.01,\"Vegan, Gluten-Free\"
Greek Yogurt,59,0.4,3.2,10,0.04,High Protein
Whole Grain Bread,247,3.4,4,13,0.4,Fiber Rich
Almond Milk,13,1.1,0.1,0.4,,Dairy Free
";

    #[test]
    fn test_parse_sample() {
        let db = LocalFoodDatabase::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(db.len(), 4);

        let milk = db.search("almond").unwrap();
        assert_eq!(milk.sodium, None);
        assert_eq!(milk.calories, Some(13.0));
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let db = LocalFoodDatabase::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(db.search("YOGURT").unwrap().name, "Greek Yogurt");
        assert!(db.search("pizza").is_none());
        assert!(db.search("  ").is_none());
    }

    #[test]
    fn test_record_conversion() {
        let db = LocalFoodDatabase::from_reader(SAMPLE.as_bytes()).unwrap();
        let record = db.search("peanut").unwrap().to_record();
        assert_eq!(record.source, RecordSource::LocalCache);
        assert_eq!(record.protein_g, Some(25.0));
        assert!(record.category_labels.contains("Gluten-Free"));
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let data = "name,calories,fat,sugar,protein,sodium,labels\nApple,52,0.2,10,0.3,0,Fruit\nBroken,lots,,,,,\n";
        let db = LocalFoodDatabase::from_reader(data.as_bytes()).unwrap();
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let db = LocalFoodDatabase::load(Path::new("/definitely/not/here/foods.csv")).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn test_stats() {
        let db = LocalFoodDatabase::from_reader(SAMPLE.as_bytes()).unwrap();
        let custom = vec![CustomIngredient {
            name: "Honey".to_string(),
            calories: 304.0,
            protein: 0.3,
            fat: 0.0,
            sugar: 82.0,
            sodium: 0.0,
            labels: "Organic".to_string(),
        }];

        let stats = db.stats(&custom);
        assert_eq!(stats.total_items, 5);
        assert_eq!(stats.database_items, 4);
        assert_eq!(stats.custom_items, 1);
        assert_eq!(stats.categories.get("Vegan"), Some(&1));
        assert_eq!(stats.top_categories(2).len(), 2);
    }
}

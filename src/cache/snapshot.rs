use metrics::gauge;
use uuid::Uuid;

use crate::domain::entities::{CustomFoodRecord, StandardFoodRecord};

/// Both catalogs as held in memory. Lookups are linear scans.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    standard: Vec<StandardFoodRecord>,
    custom: Vec<CustomFoodRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCounts {
    pub standard: usize,
    pub custom: usize,
}

impl CatalogSnapshot {
    pub fn new(standard: Vec<StandardFoodRecord>, custom: Vec<CustomFoodRecord>) -> Self {
        let snapshot = Self { standard, custom };
        snapshot.publish_sizes();
        snapshot
    }

    pub fn standard(&self) -> &[StandardFoodRecord] {
        &self.standard
    }

    pub fn custom(&self) -> &[CustomFoodRecord] {
        &self.custom
    }

    pub fn find_standard(&self, id: Uuid) -> Option<&StandardFoodRecord> {
        self.standard.iter().find(|record| record.id == id)
    }

    pub fn find_custom(&self, id: Uuid) -> Option<&CustomFoodRecord> {
        self.custom.iter().find(|record| record.id == id)
    }

    pub fn standard_mut(&mut self, id: Uuid) -> Option<&mut StandardFoodRecord> {
        self.standard.iter_mut().find(|record| record.id == id)
    }

    pub fn custom_mut(&mut self, id: Uuid) -> Option<&mut CustomFoodRecord> {
        self.custom.iter_mut().find(|record| record.id == id)
    }

    pub fn push_standard(&mut self, record: StandardFoodRecord) {
        self.standard.push(record);
        self.publish_sizes();
    }

    pub fn push_custom(&mut self, record: CustomFoodRecord) {
        self.custom.push(record);
        self.publish_sizes();
    }

    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            standard: self.standard.len(),
            custom: self.custom.len(),
        }
    }

    fn publish_sizes(&self) {
        gauge!("bapddang_catalog_standard_size").set(self.standard.len() as f64);
        gauge!("bapddang_catalog_custom_size").set(self.custom.len() as f64);
    }
}

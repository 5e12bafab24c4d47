//! Common test utilities for integration tests.
//!
//! Provides a filesystem fixture (temp workspace with a sample CSV) and a
//! config pointed at it.

use std::path::PathBuf;

use datamill::domain::models::Config;
use tempfile::TempDir;

pub const SAMPLE_CSV: &str = "\
name,year,price,km,fuel,seller
Swift,2014,350000,70000,Petrol,Individual
City,2016,585000,40000,Diesel,Dealer
Verna,2017,600000,45000,Diesel,Individual
Alto,2011,180000,95000,Petrol,Individual
i20,2018,450000,30000,Diesel,Dealer
Baleno,2019,640000,22000,Petrol,Dealer
Ertiga,2015,520000,60000,Diesel,Individual
Celerio,2016,330000,51000,Petrol,Individual
";

/// Temp workspace with `data/` holding one sample CSV, and a config whose
/// base dir points at it.
pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).expect("failed to create data dir");
        std::fs::write(data_dir.join("cars.csv"), SAMPLE_CSV).expect("failed to write CSV");

        let mut config = Config::default();
        config.base_dir = dir.path().to_string_lossy().to_string();
        config.data_dir = data_dir.to_string_lossy().to_string();
        config.database.path = dir
            .path()
            .join(".datamill/datamill.db")
            .to_string_lossy()
            .to_string();

        Self { dir, config }
    }

    /// Fixture with an existing but empty data directory.
    #[allow(dead_code)]
    pub fn empty_data_dir() -> Self {
        let fixture = Self::new();
        std::fs::remove_file(PathBuf::from(&fixture.config.data_dir).join("cars.csv"))
            .expect("failed to remove CSV");
        fixture
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

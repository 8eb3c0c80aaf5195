mod data_dir;

pub use data_dir::{CONFIG_FILE, DataDir, LoadError};

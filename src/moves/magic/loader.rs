//! Entry point for obtaining the slider tables: deterministic
//! generation at startup, or a bincode cache file under `load_magic`.

use super::precompute::{MagicTableSeed, generate_magic_tables};
use super::structs::MagicTables;

/// Fixed generation seed so every build resolves the same magics.
pub const MAGIC_SEED: u64 = 0x45;

#[cfg(feature = "load_magic")]
const MAGIC_TABLES_PATH: &str = "magics.bin";

pub fn load_magic_tables() -> MagicTables {
    #[cfg(feature = "load_magic")]
    if let Ok(tables) = read_magic_tables(MAGIC_TABLES_PATH) {
        return tables;
    }

    let tables = generate_magic_tables(MagicTableSeed::Fixed(MAGIC_SEED))
        .expect("magic table generation failed");

    #[cfg(feature = "load_magic")]
    {
        tracing::debug!(path = MAGIC_TABLES_PATH, "magic cache miss, caching tables");
        let _ = save_magic_tables(&tables, MAGIC_TABLES_PATH);
    }

    tables
}

#[cfg(feature = "load_magic")]
pub fn read_magic_tables(path: &str) -> Result<MagicTables, String> {
    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    bincode::deserialize_from(std::io::BufReader::new(file)).map_err(|e| e.to_string())
}

#[cfg(feature = "load_magic")]
pub fn save_magic_tables(tables: &MagicTables, path: &str) -> Result<(), String> {
    let file = std::fs::File::create(path).map_err(|e| e.to_string())?;
    bincode::serialize_into(std::io::BufWriter::new(file), tables).map_err(|e| e.to_string())
}

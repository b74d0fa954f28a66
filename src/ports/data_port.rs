//! Universe data access port trait.

use crate::domain::error::FractileError;
use crate::domain::table::UniverseTable;

pub trait UniversePort {
    /// Loads the raw security table, header included.
    fn load_universe(&self) -> Result<UniverseTable, FractileError>;
}

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use lance::LanceCollection;
pub use memory::MemoryCollection;

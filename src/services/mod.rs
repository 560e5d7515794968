// Core: ledger primitives and the order lifecycle engine
pub mod ledger;
pub mod orders;

// Read paths
pub mod movements;
pub mod products;
pub mod warehouses;

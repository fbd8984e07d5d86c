//! Colombian expense tax engine.
//!
//! Derives IVA, Rete-Fuente, Rete-IVA and Rete-ICA for business expenses and
//! rolls computed breakdowns up into reporting totals. Rates and subcategory
//! classification come from a versioned JSON configuration, see
//! [`core::EngineConfig`].

pub mod core;
pub mod format;

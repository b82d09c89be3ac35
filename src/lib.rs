//! itemdex - multilingual game-item search & crafting tree core
//! / 多语言游戏道具搜索与制作材料树核心库
//!
//! In-process library, consumed by a UI and fed by external data
//! services. Two subsystems:
//! - cascading name resolution: exact substring → order-preserving
//!   fuzzy → cross-language retry → script conversion → alternate
//!   catalog, plus an n-gram-filtered OCR similarity mode;
//! - recursive crafting-tree expansion with cycle/depth guards and
//!   quantity propagation.
//!
//! Catalog and recipe data come in through the [`provider`] traits; the
//! host application implements them over its own HTTP/DB layer.

pub mod cancel;
pub mod crafting;
pub mod error;
pub mod provider;
pub mod search;
pub mod text;

pub use cancel::CancelFlag;
pub use crafting::{CraftingTreeBuilder, MaterialTotal, RecipeNode};
pub use error::{Error, Result};
pub use provider::{
    CandidateProvider, FieldValue, Ingredient, ItemField, ItemId, ItemRecord, Language,
    Recipe, RecipeProvider,
};
pub use search::{SearchOptions, SearchOrchestrator, SearchResponse, SearchResult};

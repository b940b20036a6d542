pub mod classifier;
pub mod data_core;
pub mod edit_session;
pub mod performance;
pub mod sections;
pub mod shadow_tree;
pub mod table;
pub mod value_tree;

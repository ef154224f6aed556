pub mod chat;
pub mod initialize;
pub mod logs;
pub mod meta;
pub mod rag_base;

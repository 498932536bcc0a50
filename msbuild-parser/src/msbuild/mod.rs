//! Main module for msbuild library functionality

pub mod diagnostics;
pub mod document;
pub mod expressions;
pub mod formats;
pub mod lookup;
pub mod semantic;
pub mod testing;
pub mod text;
pub mod xml;

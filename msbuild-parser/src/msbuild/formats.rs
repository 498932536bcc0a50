//! Output formats
//!
//! - [`treeviz`] - icon-prefixed outlines of expression trees and semantic models

pub mod treeviz;

pub use treeviz::{
    expression_to_treeviz, expression_to_treeviz_with_params, model_to_treeviz,
    model_to_treeviz_with_params,
};

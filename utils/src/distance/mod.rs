pub mod cosine;
pub mod dot_product;
pub mod l2;

pub mod actor;
pub mod customer;
pub mod material;
pub mod product;
pub mod quotation;

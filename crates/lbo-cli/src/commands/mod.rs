pub mod lbo;
pub mod sensitivity;

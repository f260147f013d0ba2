pub mod health;
pub mod legacy;
pub mod media;

pub mod coordinates;

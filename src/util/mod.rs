pub mod dialects;

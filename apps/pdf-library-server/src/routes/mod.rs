//! Route modules for the PDF Library server

pub mod health;
pub mod pdfs;

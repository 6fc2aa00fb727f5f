pub mod check;

pub use check::Check;

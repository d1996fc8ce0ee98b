pub mod assembler;
pub mod outlier;

pub use assembler::ReportAssembler;
pub use outlier::{OutlierEvent, OutlierReport};

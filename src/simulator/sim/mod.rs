pub mod mode;
pub mod model;
pub mod records;
pub mod shell;

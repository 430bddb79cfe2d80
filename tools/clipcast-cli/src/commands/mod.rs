pub mod captions;
pub mod check;
pub mod concat;
pub mod plan;
pub mod probe;
pub mod publish;
pub mod run;

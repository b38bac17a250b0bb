pub mod deploy;
pub mod run;
pub mod tools;
pub mod validate;

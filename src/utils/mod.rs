pub mod file_validator;
